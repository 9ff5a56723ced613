// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incoming command payload.
//!
//! A command is a user-intent request with optional fields; absence means
//! "leave unchanged". Brightness zero is a distinguished "turn off"
//! signal, not "set brightness to zero".

use std::fmt;
use std::future::Future;

use crate::error::{ParseError, Result};

/// A high-level control request for one device.
///
/// # Examples
///
/// ```
/// use lifxbridge::command::Command;
///
/// let cmd: Command = serde_json::from_str(r#"{"brightness": 50, "temp": 3500}"#).unwrap();
/// assert_eq!(cmd.brightness, Some(50));
/// assert_eq!(cmd.temperature, Some(3500));
/// assert_eq!(cmd.duration, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Command {
    /// Brightness percentage (0-100); zero means turn off.
    pub brightness: Option<u16>,
    /// Hex color string such as `#ff0000`.
    pub color: Option<String>,
    /// Color temperature in kelvin.
    #[serde(rename = "temp")]
    pub temperature: Option<u16>,
    /// Transition duration in milliseconds.
    pub duration: Option<u32>,
    /// Target state for relay channel 0.
    pub relay0: Option<bool>,
    /// Target state for relay channel 1.
    pub relay1: Option<bool>,
    /// Target state for relay channel 2.
    pub relay2: Option<bool>,
    /// Target state for relay channel 3.
    pub relay3: Option<bool>,
}

impl Command {
    /// Parses a raw message payload.
    ///
    /// Accepts a JSON object, or a JSON string wrapping a JSON object
    /// (some publishers double-encode their payloads).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if neither form parses.
    pub fn parse_payload(payload: &[u8]) -> std::result::Result<Self, ParseError> {
        if let Ok(command) = serde_json::from_slice::<Self>(payload) {
            return Ok(command);
        }

        let unwrapped: String = serde_json::from_slice(payload)?;
        Ok(serde_json::from_str(&unwrapped)?)
    }

    /// Returns the relay channel targets as (channel, state) pairs.
    #[must_use]
    pub fn relay_targets(&self) -> impl Iterator<Item = (u8, bool)> {
        [self.relay0, self.relay1, self.relay2, self.relay3]
            .into_iter()
            .enumerate()
            .filter_map(|(channel, target)| {
                #[allow(clippy::cast_possible_truncation)]
                target.map(|on| (channel as u8, on))
            })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "brightness={:?} color={:?} temperature={:?} duration={:?}",
            self.brightness, self.color, self.temperature, self.duration
        )
    }
}

/// Handles (identity, command) pairs delivered by a command source.
///
/// Implemented by [`CommandDispatcher`](crate::dispatch::CommandDispatcher);
/// command transports call this for every delivered pair.
pub trait CommandHandler: Send + Sync + 'static {
    /// Handles one command addressed to `identity`.
    fn handle_command(
        &self,
        identity: &str,
        command: Command,
    ) -> impl Future<Output = Result<()>> + Send;
}
