#![deny(warnings)]
//! PIR motion detector on a digital input

use embassy_stm32::gpio::Input;
use sensor_report_core::{SensorReading, SensorSource};

pub struct MotionSensor<'a> {
    pin: Input<'a>,
}

impl<'a> MotionSensor<'a> {
    pub fn new(pin: Input<'a>) -> Self {
        Self { pin }
    }
}

impl SensorSource for MotionSensor<'_> {
    fn key(&self) -> &'static str {
        "motion"
    }

    fn path(&self) -> &'static str {
        "/api/motion"
    }

    async fn read(&mut self) -> Option<SensorReading> {
        Some(SensorReading::int(i32::from(self.pin.is_high())))
    }
}
