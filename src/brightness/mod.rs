//! Ambient-light driven backlight control
//!
//! One long-lived task samples the light sensor at a slow cadence. A
//! reading that deviates noticeably from the current duty cycle is not
//! acted on immediately: the controller re-samples in a short burst and
//! only commits once enough burst samples agree, so a hand passing over
//! the sensor does not flicker the display. Confirmed changes are applied
//! by walking the duty cycle one step at a time, brightening faster than
//! darkening.
//!
//! The controller owns the current brightness exclusively; its fade step
//! is the only writer of the physical backlight. This module is kept free
//! of hardware and logging dependencies so the host harness in
//! `tools/brightness_host_harness` can compile it directly.

pub(crate) mod config;

use embedded_hal_async::delay::DelayNs;

use self::config::{AlsConfig, ConfigError};

/// Ambient light input of the controller.
///
/// A failed read is an explicit error, never an in-band sentinel value;
/// the controller degrades it to the minimum-brightness mapping.
pub trait LightSensor {
    type Error;

    /// Current raw light intensity. Called at up to burst cadence (~33 Hz)
    /// and expected to return promptly.
    async fn read_intensity(&mut self) -> Result<i32, Self::Error>;
}

/// Physical backlight output of the controller.
pub trait Backlight {
    type Error;

    /// Set the backlight duty cycle in percent. Idempotent and safe to
    /// call every few milliseconds.
    fn set_level(&mut self, percent: u8) -> Result<(), Self::Error>;
}

/// Sampler, burst confirmer and fader around one owned brightness value.
pub struct BrightnessController<S, B, D> {
    sensor: S,
    backlight: B,
    delay: D,
    config: AlsConfig,
    /// Current duty cycle (%). Only the fade step writes this.
    current: u8,
}

impl<S, B, D> BrightnessController<S, B, D>
where
    S: LightSensor,
    B: Backlight,
    D: DelayNs,
{
    /// Build a controller around validated tuning.
    pub fn new(sensor: S, backlight: B, delay: D, config: AlsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sensor,
            backlight,
            delay,
            config,
            current: config.initial_brightness,
        })
    }

    /// Current logical duty cycle (%).
    #[allow(unused)]
    pub fn brightness(&self) -> u8 {
        self.current
    }

    /// Run the sampling loop for the lifetime of the task. Never returns
    /// and never fails; sensor and actuator errors degrade gracefully.
    pub async fn run(&mut self) {
        loop {
            self.sample_once().await;
        }
    }

    /// One normal-cadence iteration: sleep, sample, and either ignore the
    /// reading (dead zone) or enter burst confirmation.
    pub async fn sample_once(&mut self) {
        self.delay.delay_ms(self.config.normal_sample_sleep_ms).await;

        let mapped = self.read_mapped().await;
        if mapped.abs_diff(self.current) <= self.config.fade_threshold {
            return;
        }

        self.confirm_burst().await;
    }

    /// Re-sample at burst cadence until enough samples agree that the
    /// deviation is real, then fade to the most recent mapped value.
    ///
    /// Every sample is compared against the still-unchanged current
    /// brightness, and the counter never decays: any
    /// `burst_sample_consecutive` qualifying samples within the window
    /// commit, consecutive or not. An exhausted window commits nothing.
    async fn confirm_burst(&mut self) {
        let mut qualifying: u8 = 0;

        for _ in 0..self.config.burst_sample_timeout {
            self.delay.delay_ms(self.config.burst_sample_sleep_ms).await;

            let mapped = self.read_mapped().await;
            if mapped.abs_diff(self.current) > self.config.fade_threshold {
                qualifying += 1;
                if qualifying >= self.config.burst_sample_consecutive {
                    self.fade_to(mapped).await;
                    return;
                }
            }
        }
    }

    /// Walk the duty cycle to `target`, actuating every intermediate
    /// level in strictly monotonic order. Brightening steps every
    /// `fade_sleep_brighten_ms`, darkening every `fade_sleep_darken_ms`.
    async fn fade_to(&mut self, target: u8) {
        let increasing = target > self.current;
        let sleep_ms = if increasing {
            self.config.fade_sleep_brighten_ms
        } else {
            self.config.fade_sleep_darken_ms
        };

        while self.current != target {
            let step = self.config.fade_step.min(self.current.abs_diff(target));
            self.current = if increasing {
                self.current + step
            } else {
                self.current - step
            };

            // Driver failures are logged by the backlight impl; the
            // logical level stays authoritative and the fade keeps going.
            let _ = self.backlight.set_level(self.current);

            self.delay.delay_ms(sleep_ms).await;
        }
    }

    /// Read the sensor once and map it to a duty cycle. A failed read
    /// degrades to the minimum-brightness mapping for this sample.
    async fn read_mapped(&mut self) -> u8 {
        match self.sensor.read_intensity().await {
            Ok(reading) => self.config.map_light_to_pwm(reading),
            Err(_) => self.config.pwm_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use embassy_futures::block_on;
    use embedded_hal_async::delay::DelayNs;

    use super::config::AlsConfig;
    use super::{Backlight, BrightnessController, LightSensor};

    #[derive(Clone, Copy, Debug)]
    struct SensorFault;

    /// Replays a fixed script of readings; running dry is a test bug.
    struct ScriptSensor {
        readings: VecDeque<Result<i32, SensorFault>>,
    }

    impl LightSensor for ScriptSensor {
        type Error = SensorFault;

        async fn read_intensity(&mut self) -> Result<i32, SensorFault> {
            self.readings.pop_front().expect("sensor script ran out of readings")
        }
    }

    #[derive(Debug)]
    struct DriverFault;

    struct RecordingBacklight {
        calls: Vec<u8>,
        fail: bool,
    }

    impl Backlight for RecordingBacklight {
        type Error = DriverFault;

        fn set_level(&mut self, percent: u8) -> Result<(), DriverFault> {
            self.calls.push(percent);
            if self.fail {
                Err(DriverFault)
            } else {
                Ok(())
            }
        }
    }

    /// Completes immediately, recording each requested sleep.
    struct RecordingDelay {
        sleeps_ms: Vec<u32>,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.sleeps_ms.push(ns / 1_000_000);
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.sleeps_ms.push(ms);
        }
    }

    fn controller(
        initial: u8,
        readings: &[Result<i32, SensorFault>],
        failing_backlight: bool,
    ) -> BrightnessController<ScriptSensor, RecordingBacklight, RecordingDelay> {
        let config = AlsConfig {
            initial_brightness: initial,
            ..AlsConfig::default()
        };
        BrightnessController::new(
            ScriptSensor {
                readings: readings.iter().copied().collect(),
            },
            RecordingBacklight {
                calls: Vec::new(),
                fail: failing_backlight,
            },
            RecordingDelay {
                sleeps_ms: Vec::new(),
            },
            config,
        )
        .unwrap()
    }

    // The default mapping sends a reading r in 1..=100 to 1 + 99 * r / 100,
    // so readings 62, 53, 65, 52, 70 map to those same duty cycles.

    #[test]
    fn deviation_within_dead_zone_is_ignored() {
        let mut c = controller(50, &[Ok(55)], false);

        block_on(c.sample_once());

        assert_eq!(c.brightness(), 50);
        assert!(c.backlight.calls.is_empty());
        assert_eq!(c.delay.sleeps_ms, [100]);
        assert!(c.sensor.readings.is_empty());
    }

    #[test]
    fn burst_commits_on_third_qualifying_sample() {
        // Burst deviations from 50: 12, 3, 15, 2, 20 -> the third
        // qualifying sample is the fifth burst sample, which must commit
        // immediately instead of draining the whole window.
        let mut c = controller(
            50,
            &[Ok(62), Ok(62), Ok(53), Ok(65), Ok(52), Ok(70)],
            false,
        );

        block_on(c.sample_once());

        assert_eq!(c.brightness(), 70);
        assert_eq!(c.backlight.calls, (51..=70).collect::<Vec<u8>>());
        assert!(c.sensor.readings.is_empty());

        // One normal sleep, five burst sleeps, then one brighten sleep
        // per fade step.
        let expected: Vec<u32> = [100]
            .into_iter()
            .chain([30; 5])
            .chain([3; 20])
            .collect();
        assert_eq!(c.delay.sleeps_ms, expected);
    }

    #[test]
    fn exhausted_burst_window_commits_nothing() {
        // Only two of the ten burst samples deviate past the threshold.
        let mut c = controller(
            50,
            &[
                Ok(62), // normal-cadence trigger
                Ok(62),
                Ok(53),
                Ok(52),
                Ok(55),
                Ok(65),
                Ok(50),
                Ok(51),
                Ok(52),
                Ok(53),
                Ok(54),
            ],
            false,
        );

        block_on(c.sample_once());

        assert_eq!(c.brightness(), 50);
        assert!(c.backlight.calls.is_empty());
        assert!(c.sensor.readings.is_empty());
        assert_eq!(c.delay.sleeps_ms.len(), 11);
    }

    #[test]
    fn fade_brightens_through_every_intermediate_level() {
        let mut c = controller(20, &[], false);

        block_on(c.fade_to(80));

        assert_eq!(c.brightness(), 80);
        assert_eq!(c.backlight.calls, (21..=80).collect::<Vec<u8>>());
        assert_eq!(c.delay.sleeps_ms, [3; 60]);
    }

    #[test]
    fn fade_darkens_through_every_intermediate_level() {
        let mut c = controller(80, &[], false);

        block_on(c.fade_to(20));

        assert_eq!(c.brightness(), 20);
        assert_eq!(c.backlight.calls, (20..=79).rev().collect::<Vec<u8>>());
        assert_eq!(c.delay.sleeps_ms, [10; 60]);
    }

    #[test]
    fn fade_to_current_level_actuates_nothing() {
        let mut c = controller(42, &[], false);

        block_on(c.fade_to(42));

        assert_eq!(c.brightness(), 42);
        assert!(c.backlight.calls.is_empty());
        assert!(c.delay.sleeps_ms.is_empty());
    }

    #[test]
    fn failing_actuator_does_not_stall_the_fade() {
        let mut c = controller(20, &[], true);

        block_on(c.fade_to(80));

        assert_eq!(c.brightness(), 80);
        assert_eq!(c.backlight.calls.len(), 60);
    }

    #[test]
    fn sensor_failure_confirms_down_to_minimum_brightness() {
        // Every read fails, so every sample maps to pwm_min = 1. From 50
        // that deviation qualifies each time and the third burst sample
        // commits a fade down to minimum.
        let mut c = controller(
            50,
            &[Err(SensorFault), Err(SensorFault), Err(SensorFault), Err(SensorFault)],
            false,
        );

        block_on(c.sample_once());

        assert_eq!(c.brightness(), 1);
        assert_eq!(c.backlight.calls, (1..=49).rev().collect::<Vec<u8>>());
        assert!(c.sensor.readings.is_empty());
    }
}
