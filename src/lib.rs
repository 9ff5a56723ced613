// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lifxbridge` - A Rust library bridging LIFX lamps and switches to a
//! message bus.
//!
//! The crate discovers devices on the local network, keeps a cached view
//! of their state, and translates between high-level JSON commands and
//! per-device protocol operations.
//!
//! # Supported Features
//!
//! - **Discovery**: Broadcast scans with idempotent registration, plus
//!   manual registration of devices at known addresses
//! - **Light control**: On/off, white brightness/temperature, hex colors,
//!   all with transition durations
//! - **Relay control**: Per-channel switching on LIFX Switch hardware
//! - **Status events**: Debounced refreshes that emit only the fields
//!   that actually changed
//! - **MQTT transport** (feature `mqtt`): command subscription and status
//!   publishing under a configurable topic prefix
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lifxbridge::dispatch::CommandDispatcher;
//! use lifxbridge::mqtt::MqttBridge;
//! use lifxbridge::registry::DeviceRegistry;
//! use lifxbridge::runtime::{self, RuntimeOptions};
//! # use lifxbridge::link::Discovery;
//! # async fn run<D: Discovery>(lan: D) -> Result<(), Box<dyn std::error::Error>> {
//!
//! let bridge = MqttBridge::connect("mqtt://192.168.1.50:1883", "lifx")?;
//! let registry = Arc::new(DeviceRegistry::new(lan, bridge.status_sink()));
//!
//! let options = RuntimeOptions::new();
//! tokio::spawn(runtime::discovery_loop(Arc::clone(&registry), options.clone()));
//! tokio::spawn(runtime::load_loop(Arc::clone(&registry), options.clone()));
//! tokio::spawn(runtime::refresh_loop(Arc::clone(&registry), options));
//!
//! bridge.serve(CommandDispatcher::new(registry)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Command Payloads
//!
//! Commands are JSON objects where every field is optional:
//!
//! ```json
//! {"brightness": 80, "temp": 3500, "duration": 1500, "relay0": true}
//! ```
//!
//! Brightness zero turns the light off; a `color` field carries a hex
//! string such as `#ff8800`. Fields that are absent leave the device
//! unchanged.

pub mod command;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod link;
#[cfg(feature = "mqtt")]
pub mod mqtt;
mod products;
pub mod registry;
pub mod runtime;
pub mod status;
#[cfg(test)]
mod testing;
pub mod types;

pub use command::{Command, CommandHandler};
pub use device::{DeviceCapability, DeviceHandle};
pub use dispatch::CommandDispatcher;
pub use error::{Error, LinkError, ParseError, Result};
pub use link::{DeviceLink, DiscoveredDevice, Discovery, HardwareVersion};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttBridge, MqttBridgeBuilder, MqttStatusSink};
pub use registry::DeviceRegistry;
pub use runtime::RuntimeOptions;
pub use status::{StatusKey, StatusPayload, StatusSink};
pub use types::{ColorPayload, DeviceColor, DeviceIdentity, PowerState};
