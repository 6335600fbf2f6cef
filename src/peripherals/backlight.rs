//! Display backlight control
//!
//! The shield drives the display backlight through a single PWM channel;
//! brightness is the duty cycle in percent.

use embassy_nrf::pwm::{self, Prescaler, SimplePwm};

pub struct PwmBacklight<'a, T>
where
    T: pwm::Instance,
{
    pwm: SimplePwm<'a, T>,
}

impl<'a, T> PwmBacklight<'a, T>
where
    T: pwm::Instance,
{
    /// Take over the PWM peripheral and start at full duty, matching the
    /// brightness the controller assumes at boot.
    pub fn init(mut pwm: SimplePwm<'a, T>) -> Self {
        // 16 MHz / 16 = 1 MHz base clock with 100 ticks per period:
        // 10 kHz PWM, one tick per duty-cycle percent.
        pwm.set_prescaler(Prescaler::Div16);
        pwm.set_max_duty(100);
        pwm.set_duty(0, 100);

        Self { pwm }
    }

    /// Set the backlight duty cycle between 0 (off) and 100 (%).
    pub fn set_percent(&mut self, percent: u8) -> Result<(), Error> {
        if percent > 100 {
            return Err(Error::OutOfBounds);
        }

        defmt::debug!("Setting backlight duty cycle to {}%", percent);
        self.pwm.set_duty(0, percent as u16);

        Ok(())
    }
}

#[cfg(feature = "ambient-light-sensor")]
impl<'a, T> crate::brightness::Backlight for PwmBacklight<'a, T>
where
    T: pwm::Instance,
{
    type Error = Error;

    fn set_level(&mut self, percent: u8) -> Result<(), Error> {
        self.set_percent(percent).map_err(|err| {
            defmt::error!("Failed to set brightness");
            err
        })
    }
}

#[derive(Debug)]
pub enum Error {
    OutOfBounds,
}
