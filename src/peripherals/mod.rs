pub(crate) mod backlight;
#[cfg(feature = "ambient-light-sensor")]
pub(crate) mod light_sensor;
