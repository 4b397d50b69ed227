//! Device identity abstraction

use heapless::String;

/// Maximum length of a device identifier
pub const DEVICE_ID_MAX_LEN: usize = 64;

/// Device identifier string
pub type DeviceId = String<DEVICE_ID_MAX_LEN>;

/// Source of the device identifier reported with every payload
///
/// The identifier is looked up fresh for each report; implementations may
/// cache internally if the underlying source is slow.
pub trait DeviceIdentity {
    /// Return the device identifier, or `None` if the source failed
    fn device_id(&mut self) -> Option<DeviceId>;
}

/// Fixed identity, for deployments that provision the id at build time
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub &'static str);

impl DeviceIdentity for StaticIdentity {
    fn device_id(&mut self) -> Option<DeviceId> {
        let mut id = DeviceId::new();
        id.push_str(self.0).ok()?;
        Some(id)
    }
}
