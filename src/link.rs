// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consumed capabilities: the per-device wire protocol and the network
//! discovery scan.
//!
//! The traits here are the seam between the orchestration core and the
//! LIFX LAN protocol. Implementations own framing, addressing and UDP
//! semantics; the core only requires that every call completes within the
//! caller-supplied deadline (enforced through [`with_timeout`]).

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::LinkError;
use crate::types::{DeviceColor, PowerState};

/// Vendor and product identifiers reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareVersion {
    /// Vendor identifier (LIFX is vendor 1).
    pub vendor_id: u32,
    /// Product identifier within the vendor's range.
    pub product_id: u32,
}

/// Wire protocol operations against one physical device.
///
/// A link is cheap to hold per device and dialed per operation; the
/// returned connection carries any per-exchange state. Relay operations
/// address one of four channels (0-3). Light-only calls (`color`,
/// `set_color`, `set_light_power`) are only issued by the core once a
/// device has resolved as a light.
pub trait DeviceLink: Send + Sync + 'static {
    /// Per-exchange connection state.
    type Connection: Send;

    /// Opens a connection to the device.
    fn dial(&self) -> impl Future<Output = Result<Self::Connection, LinkError>> + Send;

    /// Fetches vendor and product identifiers.
    fn hardware_version(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<HardwareVersion, LinkError>> + Send;

    /// Fetches the device's user-visible label.
    fn label(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<String, LinkError>> + Send;

    /// Reads the device power state.
    fn power(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<PowerState, LinkError>> + Send;

    /// Sets the device power state, acknowledged.
    fn set_power(
        &self,
        conn: &mut Self::Connection,
        state: PowerState,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Reads the current color (lights only).
    fn color(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<DeviceColor, LinkError>> + Send;

    /// Sets the color with a transition duration, acknowledged (lights only).
    fn set_color(
        &self,
        conn: &mut Self::Connection,
        color: &DeviceColor,
        transition: Duration,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Sets light power with a transition duration, acknowledged (lights only).
    fn set_light_power(
        &self,
        conn: &mut Self::Connection,
        state: PowerState,
        transition: Duration,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Reads the power state of one relay channel (relays only).
    fn relay_power(
        &self,
        conn: &mut Self::Connection,
        channel: u8,
    ) -> impl Future<Output = Result<PowerState, LinkError>> + Send;

    /// Sets the power state of one relay channel, acknowledged (relays only).
    fn set_relay_power(
        &self,
        conn: &mut Self::Connection,
        channel: u8,
        state: PowerState,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;
}

/// One device reported by a discovery scan.
#[derive(Debug)]
pub struct DiscoveredDevice<L> {
    /// Hardware address as reported on the wire (may contain colons).
    pub address: String,
    /// Link for talking to the device.
    pub link: L,
}

/// Broadcast discovery scan producing devices as they answer.
///
/// Discovery is noisy and incomplete by nature; callers repeat passes
/// rather than expecting one scan to be exhaustive. A scan streams every
/// answer it hears into `found` and returns when the underlying socket
/// completes; the registry bounds the pass with its own timeout and simply
/// stops listening when it elapses.
pub trait Discovery: Send + Sync + 'static {
    /// Link type produced for discovered devices.
    type Link: DeviceLink;

    /// Runs one scan, streaming answers into `found`.
    fn scan(
        &self,
        found: mpsc::Sender<DiscoveredDevice<Self::Link>>,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;
}

/// Bounds a link operation with a deadline.
///
/// # Errors
///
/// Returns [`LinkError::Timeout`] if the deadline elapses, otherwise the
/// operation's own result.
pub async fn with_timeout<T, F>(deadline: Duration, operation: F) -> Result<T, LinkError>
where
    F: Future<Output = Result<T, LinkError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            #[allow(clippy::cast_possible_truncation)]
            let millis = deadline.as_millis() as u64;
            Err(LinkError::Timeout(millis))
        }
    }
}
