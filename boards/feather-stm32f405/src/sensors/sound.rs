#![deny(warnings)]
//! Microphone sound level
//!
//! Samples the microphone output for a fixed window and reports the
//! peak-to-peak amplitude in raw ADC counts.

use embassy_stm32::adc::AnyAdcChannel;
use embassy_stm32::peripherals::ADC1;
use embassy_time::{Duration, Instant, Timer};
use sensor_report_core::{SensorReading, SensorSource};

use super::{sample, SharedAdc};

/// Pause between samples; keeps the network runners serviced
const SAMPLE_INTERVAL_US: u64 = 250;

/// Running min/max over one sampling window
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    min: u16,
    max: u16,
}

impl PeakDetector {
    pub const fn new() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
        }
    }

    pub fn add(&mut self, sample: u16) {
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
    }

    /// Peak-to-peak amplitude, `None` before the first sample
    pub fn peak_to_peak(&self) -> Option<u16> {
        (self.max >= self.min).then(|| self.max - self.min)
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SoundSensor<'a> {
    adc: &'a SharedAdc,
    channel: AnyAdcChannel<ADC1>,
    window: Duration,
}

impl<'a> SoundSensor<'a> {
    pub fn new(adc: &'a SharedAdc, channel: AnyAdcChannel<ADC1>, window_ms: u64) -> Self {
        Self {
            adc,
            channel,
            window: Duration::from_millis(window_ms),
        }
    }
}

impl SensorSource for SoundSensor<'_> {
    fn key(&self) -> &'static str {
        "sound_level"
    }

    fn path(&self) -> &'static str {
        "/api/sound"
    }

    async fn read(&mut self) -> Option<SensorReading> {
        let mut peaks = PeakDetector::new();
        let start = Instant::now();

        while start.elapsed() < self.window {
            if let Some(raw) = sample(self.adc, &mut self.channel) {
                peaks.add(raw);
            }
            Timer::after_micros(SAMPLE_INTERVAL_US).await;
        }

        peaks
            .peak_to_peak()
            .map(|p2p| SensorReading::int(i32::from(p2p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_to_peak() {
        let mut peaks = PeakDetector::new();
        for s in [2048, 1900, 2300, 2100] {
            peaks.add(s);
        }
        assert_eq!(peaks.peak_to_peak(), Some(400));
    }

    #[test]
    fn test_no_samples() {
        assert_eq!(PeakDetector::new().peak_to_peak(), None);
    }

    #[test]
    fn test_single_sample_is_silent() {
        let mut peaks = PeakDetector::new();
        peaks.add(1234);
        assert_eq!(peaks.peak_to_peak(), Some(0));
    }
}
