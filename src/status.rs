// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Produced capability: the outward status event channel.
//!
//! A refresh pass emits at most one event per field that actually changed;
//! unchanged fields emit nothing.

use std::fmt;
use std::future::Future;

use crate::error::Error;
use crate::types::{ColorPayload, DeviceIdentity};

/// Which cached field a status event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// Device power state.
    Power,
    /// Light color.
    Color,
    /// One relay channel (0-3).
    Relay(u8),
}

impl StatusKey {
    /// Returns the outward key string.
    ///
    /// Relay channels map to `relay0` through `relay3`. The crate never
    /// constructs a channel above 3; passing one is a caller bug and
    /// panics in debug builds.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        if let Self::Relay(channel) = self {
            debug_assert!(*channel < 4, "relay channel out of range");
        }
        match self {
            Self::Power => "power",
            Self::Color => "color",
            Self::Relay(0) => "relay0",
            Self::Relay(1) => "relay1",
            Self::Relay(2) => "relay2",
            Self::Relay(_) => "relay3",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outward value of a status event.
///
/// Serializes as a bare boolean for power values and as the downscaled
/// color object for colors.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum StatusPayload {
    /// On/off value for `power` and `relayN` keys.
    Power(bool),
    /// Downscaled color value for the `color` key.
    Color(ColorPayload),
}

/// Accepts status events detected by refresh passes.
pub trait StatusSink: Send + Sync + 'static {
    /// Emits one status event for a device field.
    fn emit_status(
        &self,
        identity: &DeviceIdentity,
        key: StatusKey,
        payload: StatusPayload,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}
