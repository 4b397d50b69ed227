#![deny(warnings)]
//! Analog gas sensor (MQ series), raw ADC counts

use embassy_stm32::adc::AnyAdcChannel;
use embassy_stm32::peripherals::ADC1;
use sensor_report_core::{SensorReading, SensorSource};

use super::{sample, SharedAdc};

pub struct GasSensor<'a> {
    adc: &'a SharedAdc,
    channel: AnyAdcChannel<ADC1>,
}

impl<'a> GasSensor<'a> {
    pub fn new(adc: &'a SharedAdc, channel: AnyAdcChannel<ADC1>) -> Self {
        Self { adc, channel }
    }
}

impl SensorSource for GasSensor<'_> {
    fn key(&self) -> &'static str {
        "gas_level"
    }

    fn path(&self) -> &'static str {
        "/api/gas"
    }

    async fn read(&mut self) -> Option<SensorReading> {
        sample(self.adc, &mut self.channel).map(|raw| SensorReading::int(i32::from(raw)))
    }
}
