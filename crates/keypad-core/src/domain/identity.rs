//! Lazy, once-only binding of a logical key to a physical device.
//!
//! Device ids are assigned by the platform at enumeration time and are not
//! stable across boots, so the configuration names devices instead.  The
//! first event whose device carries the expected name pins the id for the
//! rest of the process lifetime; from then on only the id is compared.

use tracing::debug;

use super::event::DeviceId;

/// Set-once cell recording which physical device a logical key belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceIdentity {
    /// No event from the expected device has been seen yet.
    #[default]
    Unbound,
    /// Permanently bound to this device.
    Bound(DeviceId),
}

impl DeviceIdentity {
    /// Returns `true` once a device id has been bound.
    pub fn is_bound(&self) -> bool {
        matches!(self, DeviceIdentity::Bound(_))
    }

    /// Returns the bound device id, if any.
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            DeviceIdentity::Unbound => None,
            DeviceIdentity::Bound(id) => Some(*id),
        }
    }

    /// Decides whether an event from `device_id` belongs to this key.
    ///
    /// While unbound, `device_name` is consulted and compared against
    /// `expected_name`; on a match the id is bound for good.  A mismatch
    /// leaves the cell unbound so a later event can still bind it.  Once
    /// bound, `device_name` is never called again.
    pub fn resolve<F>(&mut self, expected_name: &str, device_id: DeviceId, device_name: F) -> bool
    where
        F: FnOnce(DeviceId) -> Option<String>,
    {
        match *self {
            DeviceIdentity::Bound(bound) => bound == device_id,
            DeviceIdentity::Unbound => {
                if device_name(device_id).as_deref() == Some(expected_name) {
                    debug!(device_id, device = expected_name, "bound logical key to device");
                    *self = DeviceIdentity::Bound(device_id);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_unbound_identity_binds_on_matching_name() {
        // Arrange
        let mut identity = DeviceIdentity::Unbound;

        // Act
        let matched = identity.resolve("qpnp_pon", 7, |_| Some("qpnp_pon".to_string()));

        // Assert
        assert!(matched);
        assert_eq!(identity, DeviceIdentity::Bound(7));
    }

    #[test]
    fn test_unbound_identity_stays_unbound_on_mismatch() {
        let mut identity = DeviceIdentity::Unbound;

        let matched = identity.resolve("qpnp_pon", 3, |_| Some("gpio-keys".to_string()));

        assert!(!matched);
        assert!(!identity.is_bound());
    }

    #[test]
    fn test_unknown_device_does_not_bind() {
        let mut identity = DeviceIdentity::Unbound;

        let matched = identity.resolve("qpnp_pon", 3, |_| None);

        assert!(!matched);
        assert_eq!(identity.device_id(), None);
    }

    #[test]
    fn test_binding_may_happen_after_earlier_mismatches() {
        // Arrange
        let mut identity = DeviceIdentity::Unbound;
        identity.resolve("qpnp_pon", 3, |_| Some("gpio-keys".to_string()));

        // Act
        let matched = identity.resolve("qpnp_pon", 9, |_| Some("qpnp_pon".to_string()));

        // Assert
        assert!(matched);
        assert_eq!(identity.device_id(), Some(9));
    }

    #[test]
    fn test_bound_identity_rejects_other_devices_even_with_same_name() {
        // Arrange
        let mut identity = DeviceIdentity::Bound(7);

        // Act
        let matched = identity.resolve("qpnp_pon", 8, |_| Some("qpnp_pon".to_string()));

        // Assert – the binding never moves once set
        assert!(!matched);
        assert_eq!(identity, DeviceIdentity::Bound(7));
    }

    #[test]
    fn test_bound_identity_skips_name_lookup() {
        let mut identity = DeviceIdentity::Bound(7);
        let lookups = Cell::new(0);

        let matched = identity.resolve("qpnp_pon", 7, |_| {
            lookups.set(lookups.get() + 1);
            None
        });

        assert!(matched);
        assert_eq!(lookups.get(), 0);
    }
}
