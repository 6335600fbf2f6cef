//! Tuning policy for the ambient-light backlight controller
//!
//! All values are fixed at build time; there is no runtime
//! reconfiguration surface.

/// Sensor-to-duty mapping bounds plus fade and burst-sampling tuning.
///
/// `Default` carries the production tuning. A config must pass
/// [`validate`](AlsConfig::validate) before the controller accepts it.
#[derive(Clone, Copy, Debug)]
pub struct AlsConfig {
    /// Minimum sensor reading; anything below maps to `pwm_min`.
    pub sensor_min: i32,
    /// Maximum sensor reading; anything above is clamped.
    pub sensor_max: i32,
    /// Minimum PWM duty cycle (%). Keeps the display visible in the dark.
    pub pwm_min: u8,
    /// Maximum PWM duty cycle (%).
    pub pwm_max: u8,
    /// Duty-cycle change per fade step (%).
    pub fade_step: u8,
    /// Per-step sleep while brightening (ms).
    pub fade_sleep_brighten_ms: u32,
    /// Per-step sleep while darkening (ms).
    pub fade_sleep_darken_ms: u32,
    /// Deviation (%) treated as noise and ignored.
    pub fade_threshold: u8,
    /// Sleep between normal-cadence samples (ms).
    pub normal_sample_sleep_ms: u32,
    /// Sleep between burst samples (ms).
    pub burst_sample_sleep_ms: u32,
    /// Burst samples taken before giving up on a confirmation.
    pub burst_sample_timeout: u8,
    /// Qualifying burst samples needed to commit a change.
    pub burst_sample_consecutive: u8,
    /// Duty cycle (%) assumed at controller start.
    pub initial_brightness: u8,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            sensor_min: 0,
            sensor_max: 100,
            pwm_min: 1,
            pwm_max: 100,
            fade_step: 1,
            fade_sleep_brighten_ms: 3,
            fade_sleep_darken_ms: 10,
            fade_threshold: 10,
            normal_sample_sleep_ms: 100,
            burst_sample_sleep_ms: 30,
            burst_sample_timeout: 10,
            burst_sample_consecutive: 3,
            initial_brightness: 100,
        }
    }
}

impl AlsConfig {
    /// Reject degenerate configurations before they can reach the
    /// mapping divide or stall the fader.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_max <= self.sensor_min {
            return Err(ConfigError::EmptySensorRange);
        }
        if self.pwm_min > self.pwm_max || self.pwm_max > 100 {
            return Err(ConfigError::InvalidPwmRange);
        }
        if self.fade_step == 0 {
            return Err(ConfigError::ZeroFadeStep);
        }
        if self.burst_sample_consecutive == 0
            || self.burst_sample_consecutive > self.burst_sample_timeout
        {
            return Err(ConfigError::InvalidBurstWindow);
        }
        if self.initial_brightness > 100 {
            return Err(ConfigError::InitialBrightnessOutOfRange);
        }
        Ok(())
    }

    /// Map a raw light intensity to a PWM duty cycle (%).
    ///
    /// Readings below `sensor_min` map to `pwm_min`: assume darkness and
    /// keep the display visible. Readings above `sensor_max` are clamped.
    /// In between the mapping is linear with floor division.
    pub fn map_light_to_pwm(&self, reading: i32) -> u8 {
        if reading < self.sensor_min {
            return self.pwm_min;
        }

        let reading = reading.min(self.sensor_max);
        let pwm_span = (self.pwm_max - self.pwm_min) as i32;
        let sensor_span = self.sensor_max - self.sensor_min;

        (self.pwm_min as i32 + pwm_span * (reading - self.sensor_min) / sensor_span) as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    EmptySensorRange,
    InvalidPwmRange,
    ZeroFadeStep,
    InvalidBurstWindow,
    InitialBrightnessOutOfRange,
}

#[cfg(test)]
mod tests {
    use super::{AlsConfig, ConfigError};

    #[test]
    fn readings_below_minimum_map_to_pwm_floor() {
        let config = AlsConfig::default();
        assert_eq!(config.map_light_to_pwm(-1), config.pwm_min);
        assert_eq!(config.map_light_to_pwm(i32::MIN), config.pwm_min);
    }

    #[test]
    fn readings_above_maximum_are_clamped() {
        let config = AlsConfig::default();
        let at_max = config.map_light_to_pwm(config.sensor_max);
        assert_eq!(config.map_light_to_pwm(config.sensor_max + 1), at_max);
        assert_eq!(config.map_light_to_pwm(i32::MAX), at_max);
    }

    #[test]
    fn mapping_covers_the_full_pwm_range() {
        let config = AlsConfig::default();
        assert_eq!(config.map_light_to_pwm(0), 1);
        assert_eq!(config.map_light_to_pwm(50), 50);
        assert_eq!(config.map_light_to_pwm(100), 100);
    }

    #[test]
    fn mapping_is_monotonic_over_the_sensor_domain() {
        let config = AlsConfig::default();
        for reading in config.sensor_min..config.sensor_max {
            assert!(config.map_light_to_pwm(reading) <= config.map_light_to_pwm(reading + 1));
        }
    }

    #[test]
    fn empty_sensor_range_is_rejected() {
        let config = AlsConfig {
            sensor_min: 100,
            sensor_max: 100,
            ..AlsConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptySensorRange));
    }

    #[test]
    fn inverted_pwm_range_is_rejected() {
        let config = AlsConfig {
            pwm_min: 80,
            pwm_max: 20,
            ..AlsConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPwmRange));
    }

    #[test]
    fn zero_fade_step_is_rejected() {
        let config = AlsConfig {
            fade_step: 0,
            ..AlsConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFadeStep));
    }

    #[test]
    fn confirmation_count_above_window_is_rejected() {
        let config = AlsConfig {
            burst_sample_timeout: 2,
            burst_sample_consecutive: 3,
            ..AlsConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidBurstWindow));
    }

    #[test]
    fn production_tuning_is_valid() {
        assert_eq!(AlsConfig::default().validate(), Ok(()));
    }
}
