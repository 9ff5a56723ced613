// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translates incoming commands into device operations.
//!
//! Precedence, evaluated in order with first match winning:
//! explicit zero brightness turns the device off; otherwise a positive
//! color temperature or brightness selects the white path; otherwise a
//! hex color selects the color path. Relay channel fields are evaluated
//! after whichever branch fired, since one command may target both a
//! light and relay channels on a combination device.

use std::sync::Arc;
use std::time::Duration;

use crate::command::{Command, CommandHandler};
use crate::error::Result;
use crate::link::Discovery;
use crate::registry::DeviceRegistry;
use crate::status::StatusSink;
use crate::types::DeviceColor;

/// Transition duration applied when a command carries none.
const DEFAULT_TRANSITION: Duration = Duration::from_millis(1500);

/// Timeout for a command-triggered discovery pass.
const COMMAND_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Control identity that triggers a discovery pass instead of addressing
/// a device.
const DISCOVER_IDENTITY: &str = "discover";

/// Dispatches commands from a command source to registry devices.
///
/// Commands for identities the registry does not know are dropped with a
/// warning, not queued; devices discovered later pick up only subsequent
/// commands.
pub struct CommandDispatcher<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    registry: Arc<DeviceRegistry<D, S>>,
}

impl<D, S> CommandDispatcher<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: Arc<DeviceRegistry<D, S>>) -> Self {
        Self { registry }
    }

    /// Returns the registry this dispatcher resolves identities against.
    #[must_use]
    pub fn registry(&self) -> &Arc<DeviceRegistry<D, S>> {
        &self.registry
    }

    async fn dispatch(&self, identity: &str, command: Command) -> Result<()> {
        if identity == DISCOVER_IDENTITY {
            let registry = Arc::clone(&self.registry);
            tokio::spawn(async move {
                let found = registry.discover(COMMAND_DISCOVERY_TIMEOUT).await;
                tracing::debug!(found, "command-triggered discovery finished");
            });
            return Ok(());
        }

        let Some(device) = self.registry.lookup(identity) else {
            tracing::warn!(identity, "no device found for command");
            return Ok(());
        };

        let transition = command
            .duration
            .map_or(DEFAULT_TRANSITION, |ms| Duration::from_millis(u64::from(ms)));

        let brightness = command.brightness.unwrap_or(0);
        let temperature = command.temperature.unwrap_or(0);

        if command.brightness == Some(0) {
            // Zero brightness means off, overriding any other light field.
            tracing::info!(identity, "turning off");
            device.turn_off(transition).await?;
        } else if temperature > 0 || brightness > 0 {
            tracing::info!(identity, temperature, brightness, "setting white");
            device.set_white(brightness, temperature, transition).await?;
        } else if let Some(hex) = &command.color {
            let color = match DeviceColor::from_hex(hex, temperature) {
                Ok(color) => color,
                Err(error) => {
                    tracing::warn!(identity, color = %hex, %error, "error parsing color");
                    return Ok(());
                }
            };
            tracing::info!(identity, color = %color, "setting color");
            device.set_color(color, transition).await?;
        }

        for (channel, on) in command.relay_targets() {
            tracing::info!(identity, channel, on, "setting relay");
            device.set_relay(channel, on).await?;
        }

        Ok(())
    }
}

impl<D, S> CommandHandler for CommandDispatcher<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    async fn handle_command(&self, identity: &str, command: Command) -> Result<()> {
        self.dispatch(identity, command).await
    }
}

impl<D, S> Clone for CommandDispatcher<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}
