// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable device identity used as the registry key.

use std::fmt;

/// Normalized hardware address identifying one physical device.
///
/// The identity is the device's MAC address with colons stripped and hex
/// digits lowercased, so `D0:73:D5:01:23:45` and `d073d5012345` name the
/// same device. It is stable across discovery runs and is the only key
/// the registry deduplicates on.
///
/// # Examples
///
/// ```
/// use lifxbridge::types::DeviceIdentity;
///
/// let id = DeviceIdentity::new("D0:73:D5:01:23:45");
/// assert_eq!(id.as_str(), "d073d5012345");
/// assert_eq!(id, DeviceIdentity::new("d073d5012345"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Creates an identity from a hardware address, normalizing it.
    #[must_use]
    pub fn new(address: &str) -> Self {
        Self(address.replace(':', "").to_ascii_lowercase())
    }

    /// Returns the normalized identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceIdentity {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}
