#![deny(warnings)]
//! Sensor producers
//!
//! Each sensor implements `sensor_report_core::SensorSource`: it knows the
//! JSON key and API path it reports under and yields one typed reading per
//! call. The analog sensors share ADC1 through a `RefCell`; reads never hold
//! the borrow across an `.await`.
//!
//! | Sensor        | Input             | Reading        | Key            |
//! |---------------|-------------------|----------------|----------------|
//! | `sound`       | A0 (PA4), ADC1    | Int, p-p count | `sound_level`  |
//! | `temperature` | internal, ADC1    | Float, °C      | `temperature`  |
//! | `motion`      | PIR on PC7        | Int, 0/1       | `motion`       |
//! | `gas`         | A1 (PA5), ADC1    | Int, raw count | `gas_level`    |

use core::cell::RefCell;

use embassy_stm32::adc::Adc;
use embassy_stm32::peripherals::ADC1;

pub mod gas;
pub mod motion;
pub mod sound;
pub mod temperature;

pub use gas::GasSensor;
pub use motion::MotionSensor;
pub use sound::SoundSensor;
pub use temperature::TemperatureSensor;

/// ADC1, shared by every analog sensor
pub type SharedAdc = RefCell<Adc<'static, ADC1>>;

/// Which sensors are reported, and how they sample
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// Sound peak-to-peak sampling window in milliseconds
    pub sound_window_ms: u64,
    pub report_sound: bool,
    pub report_temperature: bool,
    pub report_motion: bool,
    pub report_gas: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        // Sound only until the other sensors are fitted to the node
        Self {
            sound_window_ms: 50,
            report_sound: true,
            report_temperature: false,
            report_motion: false,
            report_gas: false,
        }
    }
}

/// Take one 12-bit sample from `channel`, or `None` if the ADC is busy
pub(crate) fn sample<C>(adc: &SharedAdc, channel: &mut C) -> Option<u16>
where
    C: embassy_stm32::adc::AdcChannel<ADC1>,
{
    let mut adc = adc.try_borrow_mut().ok()?;
    Some(adc.blocking_read(channel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_reports_sound_only() {
        let config = SensorConfig::default();
        assert!(config.report_sound);
        assert!(!config.report_temperature);
        assert!(!config.report_motion);
        assert!(!config.report_gas);
        assert_eq!(config.sound_window_ms, 50);
    }
}
