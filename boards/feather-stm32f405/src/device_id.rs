#![deny(unsafe_code)]
#![deny(warnings)]
//! Device identifier for STM32F405
//!
//! Formats the factory-programmed 96-bit unique device ID, which is stable
//! across reboots and unique to each chip, as the `device_id` reported with
//! every reading: `stm32f405-{24_hex_chars}`.

use hal_abstractions::{DeviceId, DeviceIdentity};

const PREFIX: &str = "stm32f405-";

/// Format a device ID from the UID hex string
fn format_device_id(uid_hex: &str) -> Option<DeviceId> {
    let mut id = DeviceId::new();
    id.push_str(PREFIX).ok()?;
    id.push_str(uid_hex).ok()?;
    Some(id)
}

/// Identity backed by the chip UID
#[derive(Debug, Clone, Copy, Default)]
pub struct ChipIdentity;

impl DeviceIdentity for ChipIdentity {
    fn device_id(&mut self) -> Option<DeviceId> {
        format_device_id(embassy_stm32::uid::uid_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_format() {
        let id = format_device_id("0123456789abcdef01234567").unwrap();
        assert_eq!(id.as_str(), "stm32f405-0123456789abcdef01234567");
        assert_eq!(id.len(), 34);
    }

    #[test]
    fn test_device_id_too_long() {
        let long = [b'a'; 64];
        let long = core::str::from_utf8(&long).unwrap();
        assert!(format_device_id(long).is_none());
    }
}
