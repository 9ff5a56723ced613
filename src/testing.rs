// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared in-process mocks for unit tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{Error, LinkError};
use crate::link::{DeviceLink, DiscoveredDevice, Discovery, HardwareVersion};
use crate::status::{StatusKey, StatusPayload, StatusSink};
use crate::types::{DeviceColor, DeviceIdentity, PowerState};

/// Scriptless mock link recording every call it receives.
#[derive(Clone)]
pub(crate) struct MockLink {
    hw: HardwareVersion,
    calls: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockLink {
    pub fn light() -> Self {
        Self::with_product(27)
    }

    pub fn relay() -> Self {
        Self::with_product(70)
    }

    pub fn unsupported() -> Self {
        Self::with_product(9999)
    }

    pub fn with_product(product_id: u32) -> Self {
        Self {
            hw: HardwareVersion {
                vendor_id: 1,
                product_id,
            },
            calls: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl DeviceLink for MockLink {
    type Connection = ();

    async fn dial(&self) -> Result<(), LinkError> {
        self.record("dial");
        Ok(())
    }

    async fn hardware_version(&self, (): &mut ()) -> Result<HardwareVersion, LinkError> {
        self.record("hardware_version");
        Ok(self.hw)
    }

    async fn label(&self, (): &mut ()) -> Result<String, LinkError> {
        self.record("label");
        Ok("Mock Device".to_string())
    }

    async fn power(&self, (): &mut ()) -> Result<PowerState, LinkError> {
        self.record("get_power");
        Ok(PowerState::Off)
    }

    async fn set_power(&self, (): &mut (), state: PowerState) -> Result<(), LinkError> {
        self.record(format!("set_power {state}"));
        Ok(())
    }

    async fn color(&self, (): &mut ()) -> Result<DeviceColor, LinkError> {
        self.record("get_color");
        Ok(DeviceColor::default())
    }

    async fn set_color(
        &self,
        (): &mut (),
        color: &DeviceColor,
        _transition: Duration,
    ) -> Result<(), LinkError> {
        self.record(format!("set_color {color}"));
        Ok(())
    }

    async fn set_light_power(
        &self,
        (): &mut (),
        state: PowerState,
        _transition: Duration,
    ) -> Result<(), LinkError> {
        self.record(format!("set_light_power {state}"));
        Ok(())
    }

    async fn relay_power(&self, (): &mut (), channel: u8) -> Result<PowerState, LinkError> {
        self.record(format!("get_relay_power {channel}"));
        Ok(PowerState::Off)
    }

    async fn set_relay_power(
        &self,
        (): &mut (),
        channel: u8,
        state: PowerState,
    ) -> Result<(), LinkError> {
        self.record(format!("set_relay_power {channel} {state}"));
        Ok(())
    }
}

/// Discovery that reports a fixed set of addresses, all as lights.
pub(crate) struct MockDiscovery {
    addresses: Vec<String>,
}

impl MockDiscovery {
    pub fn empty() -> Self {
        Self {
            addresses: Vec::new(),
        }
    }

    pub fn with_devices(addresses: Vec<&str>) -> Self {
        Self {
            addresses: addresses.into_iter().map(str::to_string).collect(),
        }
    }
}

impl Discovery for MockDiscovery {
    type Link = MockLink;

    async fn scan(&self, found: mpsc::Sender<DiscoveredDevice<MockLink>>) -> Result<(), LinkError> {
        for address in &self.addresses {
            let _ = found
                .send(DiscoveredDevice {
                    address: address.clone(),
                    link: MockLink::light(),
                })
                .await;
        }
        Ok(())
    }
}

/// Sink recording every emitted status event.
#[derive(Clone)]
pub(crate) struct RecordingSink {
    events: Arc<parking_lot::Mutex<Vec<(DeviceIdentity, StatusKey, StatusPayload)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<(DeviceIdentity, StatusKey, StatusPayload)> {
        self.events.lock().clone()
    }
}

impl StatusSink for RecordingSink {
    async fn emit_status(
        &self,
        identity: &DeviceIdentity,
        key: StatusKey,
        payload: StatusPayload,
    ) -> Result<(), Error> {
        self.events.lock().push((identity.clone(), key, payload));
        Ok(())
    }
}
