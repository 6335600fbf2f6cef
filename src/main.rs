#![no_std]
#![no_main]

#[cfg(feature = "ambient-light-sensor")]
mod brightness;
mod peripherals;
mod system;

// Panic handler and debugging
#[cfg(feature = "ambient-light-sensor")]
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::pwm::SimplePwm;
#[cfg(feature = "ambient-light-sensor")]
use embassy_nrf::{
    bind_interrupts,
    peripherals::{PWM0, TWISPI0},
    twim::{self, Twim},
};
#[cfg(feature = "ambient-light-sensor")]
use embassy_time::Delay;

#[cfg(feature = "ambient-light-sensor")]
bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<TWISPI0>;
});

// Crate
#[cfg(feature = "ambient-light-sensor")]
use brightness::{config::AlsConfig, BrightnessController};
use peripherals::backlight::PwmBacklight;
#[cfg(feature = "ambient-light-sensor")]
use peripherals::light_sensor::Apds9960;

/// Backlight duty cycle (%) applied once at boot when the ambient light
/// sensor is compiled out.
#[cfg(not(feature = "ambient-light-sensor"))]
const FIXED_BRIGHTNESS_PERCENT: u8 = 60;

/// Sample the ambient light sensor and drive the display backlight for
/// the lifetime of the process.
#[cfg(feature = "ambient-light-sensor")]
#[embassy_executor::task(pool_size = 1)]
async fn sample_ambient_light(
    mut controller: BrightnessController<
        Apds9960<'static, TWISPI0>,
        PwmBacklight<'static, PWM0>,
        Delay,
    >,
) {
    controller.run().await
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(system::config::SystemConfig::new());
    defmt::info!("Initializing");

    // Initialize the display backlight PWM
    let backlight = PwmBacklight::init(SimplePwm::new_1ch(p.PWM0, p.P0_06));

    #[cfg(feature = "ambient-light-sensor")]
    {
        // Initialize I2C for the light sensor
        let mut i2c_config = twim::Config::default();
        // Use I2C at 400KHz, plenty for single-register reads at burst cadence
        i2c_config.frequency = twim::Frequency::K400;

        let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_04, p.P0_05, i2c_config);
        let sensor = Apds9960::init(i2c).await;

        let controller =
            BrightnessController::new(sensor, backlight, Delay, AlsConfig::default()).unwrap();

        defmt::info!("Initialization finished");

        // Schedule tasks
        unwrap!(_spawner.spawn(sample_ambient_light(controller)));
    }

    #[cfg(not(feature = "ambient-light-sensor"))]
    {
        let mut backlight = backlight;
        if backlight.set_percent(FIXED_BRIGHTNESS_PERCENT).is_err() {
            defmt::error!("Failed to set fixed brightness");
        }

        defmt::info!("Initialization finished");
    }
}
