// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Failures here are boundary events, not process events: a malformed
//! command is dropped, an unreachable device stays eligible for the next
//! scheduled pass, and nothing in this crate terminates the process.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while parsing a command or color input.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while talking to a device.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// Device identity is not present in the registry.
    #[error("device not found: {0}")]
    NotFound(String),
}

/// Errors related to parsing incoming commands and color inputs.
///
/// A `ParseError` always means the offending input is dropped without
/// side effects on any device.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A hex color string is malformed.
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),

    /// A relay channel index is outside 0-3.
    #[error("relay index {0} is out of range [0, 3]")]
    InvalidRelayIndex(u8),
}

/// Errors related to device network communication.
///
/// These are produced by [`DeviceLink`](crate::link::DeviceLink)
/// implementations and by the per-operation timeout wrapper. They leave
/// cached state as last-known and never poison a registry entry.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Dialing the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The operation did not complete within its deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with something the protocol layer rejected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The discovery channel or socket was closed unexpectedly.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// MQTT broker error.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
