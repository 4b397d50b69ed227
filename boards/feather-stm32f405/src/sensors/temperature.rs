#![deny(warnings)]
//! Die temperature from the STM32F405 internal sensor

use embassy_stm32::adc::Temperature;
use sensor_report_core::{SensorReading, SensorSource};

use super::{sample, SharedAdc};

/// ADC reference voltage in millivolts
const VREF_MV: f32 = 3300.0;
/// Full-scale 12-bit reading
const ADC_MAX: f32 = 4095.0;
/// Sensor output at 25 °C (datasheet V25)
const V25_MV: f32 = 760.0;
/// Datasheet average slope, mV/°C
const AVG_SLOPE_MV: f32 = 2.5;

/// Convert a raw 12-bit temperature channel sample to °C
pub fn raw_to_celsius(raw: u16) -> f32 {
    let mv = f32::from(raw) * VREF_MV / ADC_MAX;
    (mv - V25_MV) / AVG_SLOPE_MV + 25.0
}

pub struct TemperatureSensor<'a> {
    adc: &'a SharedAdc,
    channel: Temperature,
}

impl<'a> TemperatureSensor<'a> {
    /// Enables the internal temperature channel on the shared ADC
    pub fn new(adc: &'a SharedAdc) -> Self {
        let channel = adc.borrow().enable_temperature();
        Self { adc, channel }
    }
}

impl SensorSource for TemperatureSensor<'_> {
    fn key(&self) -> &'static str {
        "temperature"
    }

    fn path(&self) -> &'static str {
        "/api/temperature"
    }

    async fn read(&mut self) -> Option<SensorReading> {
        sample(self.adc, &mut self.channel).map(|raw| SensorReading::float(raw_to_celsius(raw)))
    }
}
