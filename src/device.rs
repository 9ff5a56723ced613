// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device handle: cached state, capability resolution and the
//! mutex-guarded operations against one physical device.
//!
//! Every operation acquires the handle's lock for its full duration, so at
//! most one protocol exchange is in flight per device while operations on
//! distinct handles proceed fully in parallel. A subsequent command for
//! the same device blocks behind the lock; there is no cross-operation
//! cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::{LinkError, ParseError, Result};
use crate::link::{DeviceLink, HardwareVersion, with_timeout};
use crate::products;
use crate::status::{StatusKey, StatusPayload, StatusSink};
use crate::types::{ColorPayload, DeviceColor, DeviceIdentity, PowerState};

/// Timeout for state-mutating commands.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for one full refresh poll.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for capability resolution.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum settle time before a scheduled refresh fires.
const MIN_SETTLE: Duration = Duration::from_secs(1);

/// Settle time after a relay command; relay state settles faster than
/// light transitions.
const RELAY_SETTLE: Duration = Duration::from_millis(100);

/// Number of relay channels on switch products.
pub const RELAY_CHANNELS: u8 = 4;

/// Resolved device class.
///
/// Resolution is one-way: a handle starts `Unloaded` and moves to exactly
/// one of the terminal states on its first successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCapability {
    /// Hardware metadata not yet fetched.
    Unloaded,
    /// A dimmable, colored light.
    Light,
    /// A multi-channel relay (switch).
    Relay,
    /// Recognized neither as light nor relay; commands are no-ops.
    Unsupported,
}

impl DeviceCapability {
    /// Returns true once capability resolution has completed, successfully
    /// or as `Unsupported`.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        !matches!(self, Self::Unloaded)
    }
}

/// Classifies hardware metadata against the known-product table.
fn classify(hw: HardwareVersion) -> DeviceCapability {
    match products::find(hw) {
        Some(product) if product.relays => DeviceCapability::Relay,
        Some(_) => DeviceCapability::Light,
        None => DeviceCapability::Unsupported,
    }
}

/// A pending debounced refresh: the timer task plus whether its sleep
/// has elapsed and the refresh is already underway.
struct RefreshTimer {
    task: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

/// Mutable cached state, guarded by the handle's lock.
#[derive(Debug)]
struct CachedState {
    capability: DeviceCapability,
    power: Option<PowerState>,
    /// Meaningful only when capability is `Light`.
    color: Option<DeviceColor>,
    /// Meaningful only when capability is `Relay`.
    relay_power: [Option<PowerState>; RELAY_CHANNELS as usize],
}

/// One physical device: its link, capability and cached state.
///
/// Handles are created and exclusively owned by the
/// [`DeviceRegistry`](crate::registry::DeviceRegistry) and handed out as
/// `Arc` references.
pub struct DeviceHandle<L, S> {
    identity: DeviceIdentity,
    label: Option<String>,
    link: L,
    sink: Arc<S>,
    /// Mirror of `capability.is_loaded()`, readable without the async lock.
    loaded: AtomicBool,
    /// True when cached state may not reflect reality.
    stale: AtomicBool,
    state: tokio::sync::Mutex<CachedState>,
    /// At most one pending refresh timer; replaced, never accumulated.
    refresh_timer: parking_lot::Mutex<Option<RefreshTimer>>,
}

impl<L, S> DeviceHandle<L, S>
where
    L: DeviceLink,
    S: StatusSink,
{
    pub(crate) fn new(
        identity: DeviceIdentity,
        label: Option<String>,
        link: L,
        sink: Arc<S>,
    ) -> Self {
        Self {
            identity,
            label,
            link,
            sink,
            loaded: AtomicBool::new(false),
            stale: AtomicBool::new(false),
            state: tokio::sync::Mutex::new(CachedState {
                capability: DeviceCapability::Unloaded,
                power: None,
                color: None,
                relay_power: [None; RELAY_CHANNELS as usize],
            }),
            refresh_timer: parking_lot::Mutex::new(None),
        }
    }

    /// Returns the device identity.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Returns the label captured during discovery, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns true once capability resolution has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Returns true when cached state may not reflect reality.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Marks cached state as possibly out of date.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Returns the resolved capability.
    pub async fn capability(&self) -> DeviceCapability {
        self.state.lock().await.capability
    }

    /// Resolves the device's capability from its hardware metadata.
    ///
    /// Idempotent: a no-op once resolved, and safe to call again after a
    /// network failure (the handle stays `Unloaded` and is retried on a
    /// later pass).
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if dialing or the metadata fetch fails.
    pub async fn load(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.capability.is_loaded() {
            return Ok(());
        }

        tracing::debug!(identity = %self.identity, "loading device");

        let hw = with_timeout(LOAD_TIMEOUT, async {
            let mut conn = self.link.dial().await?;
            self.link.hardware_version(&mut conn).await
        })
        .await
        .inspect_err(|error| {
            tracing::warn!(identity = %self.identity, %error, "failed to get hardware version");
        })?;

        let capability = classify(hw);
        state.capability = capability;
        self.loaded.store(true, Ordering::Release);

        match capability {
            DeviceCapability::Light | DeviceCapability::Relay => {
                let name = products::find(hw).map_or("unknown", |product| product.name);
                tracing::info!(
                    identity = %self.identity,
                    vendor = hw.vendor_id,
                    product = hw.product_id,
                    name,
                    capability = ?capability,
                    "loaded device"
                );
            }
            _ => {
                tracing::warn!(
                    identity = %self.identity,
                    vendor = hw.vendor_id,
                    product = hw.product_id,
                    "ignoring unsupported device"
                );
            }
        }

        Ok(())
    }

    /// Polls the device and reconciles cached state.
    ///
    /// For each observed value that differs from the cache, the cache is
    /// updated and exactly one status event is emitted; unchanged fields
    /// emit nothing. A failing sub-field is abandoned for this pass while
    /// already-applied updates are kept. The stale flag clears only on
    /// full success.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the poll failed wholly or partially.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        tracing::debug!(identity = %self.identity, "refreshing device");

        with_timeout(REFRESH_TIMEOUT, self.poll_into(&mut state)).await?;
        self.stale.store(false, Ordering::Release);
        Ok(())
    }

    /// One poll pass against the device, applying diffs as they arrive.
    async fn poll_into(&self, state: &mut CachedState) -> std::result::Result<(), LinkError> {
        let mut conn = self.link.dial().await?;

        let power = self.link.power(&mut conn).await.inspect_err(|error| {
            tracing::warn!(identity = %self.identity, %error, "failed to get power");
        })?;
        if state.power != Some(power) {
            state.power = Some(power);
            tracing::debug!(identity = %self.identity, power = %power, "power changed");
            self.emit(StatusKey::Power, StatusPayload::Power(power.is_on()))
                .await;
        }

        match state.capability {
            DeviceCapability::Light => {
                let color = self.link.color(&mut conn).await.inspect_err(|error| {
                    tracing::warn!(identity = %self.identity, %error, "failed to get color");
                })?;
                if state.color != Some(color) {
                    state.color = Some(color);
                    tracing::debug!(identity = %self.identity, color = %color, "color changed");
                    self.emit(
                        StatusKey::Color,
                        StatusPayload::Color(ColorPayload::from(&color)),
                    )
                    .await;
                }
            }
            DeviceCapability::Relay => {
                let mut first_failure = None;
                for channel in 0..RELAY_CHANNELS {
                    match self.link.relay_power(&mut conn, channel).await {
                        Ok(power) => {
                            let slot = &mut state.relay_power[usize::from(channel)];
                            if *slot != Some(power) {
                                *slot = Some(power);
                                self.emit(
                                    StatusKey::Relay(channel),
                                    StatusPayload::Power(power.is_on()),
                                )
                                .await;
                            }
                        }
                        Err(error) => {
                            tracing::warn!(
                                identity = %self.identity,
                                channel,
                                %error,
                                "failed to get relay power"
                            );
                            first_failure.get_or_insert(error);
                        }
                    }
                }
                if let Some(error) = first_failure {
                    return Err(error);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Turns the device on with a transition duration.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the power-set call fails.
    pub async fn turn_on(self: &Arc<Self>, transition: Duration) -> Result<()> {
        self.set_device_power(PowerState::On, transition).await
    }

    /// Turns the device off with a transition duration.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the power-set call fails.
    pub async fn turn_off(self: &Arc<Self>, transition: Duration) -> Result<()> {
        self.set_device_power(PowerState::Off, transition).await
    }

    async fn set_device_power(
        self: &Arc<Self>,
        target: PowerState,
        transition: Duration,
    ) -> Result<()> {
        let state = self.state.lock().await;
        let is_light = matches!(state.capability, DeviceCapability::Light);

        self.mark_stale();

        with_timeout(COMMAND_TIMEOUT, async {
            let mut conn = self.link.dial().await?;
            if is_light {
                self.link
                    .set_light_power(&mut conn, target, transition)
                    .await
            } else {
                self.link.set_power(&mut conn, target).await
            }
        })
        .await?;

        drop(state);
        self.queue_refresh(transition);
        Ok(())
    }

    /// Sets a white color from brightness percentage and kelvin.
    ///
    /// A no-op unless the device is a light. Zero brightness or kelvin in
    /// the request is filled from the cached color so partial updates
    /// preserve unspecified channels. Setting a color also powers the
    /// light on, matching the expectation that setting a color activates
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if a protocol call fails.
    pub async fn set_white(
        self: &Arc<Self>,
        brightness_percent: u16,
        kelvin: u16,
        transition: Duration,
    ) -> Result<()> {
        let state = self.state.lock().await;
        if !matches!(state.capability, DeviceCapability::Light) {
            return Ok(());
        }

        let mut brightness = DeviceColor::fraction_from_percent(brightness_percent);
        if brightness_percent == 0
            && let Some(cached) = state.color
        {
            brightness = cached.brightness;
        }

        let mut kelvin = kelvin;
        if kelvin == 0
            && let Some(cached) = state.color
        {
            kelvin = cached.kelvin;
        }

        let color = DeviceColor {
            hue: 0,
            saturation: 0,
            brightness,
            kelvin,
        };

        self.apply_color(state, &color, transition).await
    }

    /// Sets a full HSBK color.
    ///
    /// A no-op unless the device is a light. Zero kelvin is filled from
    /// the cached color. Setting a color also powers the light on.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if a protocol call fails.
    pub async fn set_color(self: &Arc<Self>, color: DeviceColor, transition: Duration) -> Result<()> {
        let state = self.state.lock().await;
        if !matches!(state.capability, DeviceCapability::Light) {
            return Ok(());
        }

        let mut color = color;
        if color.kelvin == 0
            && let Some(cached) = state.color
        {
            color.kelvin = cached.kelvin;
        }

        self.apply_color(state, &color, transition).await
    }

    async fn apply_color(
        self: &Arc<Self>,
        state: tokio::sync::MutexGuard<'_, CachedState>,
        color: &DeviceColor,
        transition: Duration,
    ) -> Result<()> {
        self.mark_stale();

        with_timeout(COMMAND_TIMEOUT, async {
            let mut conn = self.link.dial().await?;
            self.link.set_color(&mut conn, color, transition).await?;
            self.link.set_power(&mut conn, PowerState::On).await
        })
        .await?;

        drop(state);
        self.queue_refresh(transition);
        Ok(())
    }

    /// Sets one relay channel's power.
    ///
    /// A no-op unless the device is a relay.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidRelayIndex`](crate::error::ParseError)
    /// for channels above 3, or [`LinkError`] if the power-set call fails.
    pub async fn set_relay(self: &Arc<Self>, channel: u8, on: bool) -> Result<()> {
        if channel >= RELAY_CHANNELS {
            return Err(ParseError::InvalidRelayIndex(channel).into());
        }

        let state = self.state.lock().await;
        if !matches!(state.capability, DeviceCapability::Relay) {
            return Ok(());
        }

        self.mark_stale();

        with_timeout(COMMAND_TIMEOUT, async {
            let mut conn = self.link.dial().await?;
            self.link
                .set_relay_power(&mut conn, channel, PowerState::from(on))
                .await
        })
        .await?;

        drop(state);
        self.queue_refresh(RELAY_SETTLE);
        Ok(())
    }

    /// Schedules a debounced refresh.
    ///
    /// Cancels any scheduled-but-not-yet-fired refresh timer and installs
    /// a new one, so N rapid commands yield exactly one refresh, fired
    /// `delay` after the last command. A timer that has already fired is
    /// left to run to completion; aborting it could drop a status event
    /// between the cache update and the sink emission. A zero delay is
    /// coerced to the minimum settle time.
    pub fn queue_refresh(self: &Arc<Self>, delay: Duration) {
        let delay = if delay.is_zero() { MIN_SETTLE } else { delay };

        let mut slot = self.refresh_timer.lock();
        if let Some(pending) = slot.take()
            && !pending.fired.load(Ordering::Acquire)
        {
            pending.task.abort();
        }

        let fired = Arc::new(AtomicBool::new(false));
        let handle = Arc::clone(self);
        let task_fired = Arc::clone(&fired);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task_fired.store(true, Ordering::Release);
            if let Err(error) = handle.refresh().await {
                tracing::warn!(
                    identity = %handle.identity,
                    %error,
                    "scheduled refresh failed"
                );
            }
        });
        *slot = Some(RefreshTimer { task, fired });
    }

    async fn emit(&self, key: StatusKey, payload: StatusPayload) {
        if let Err(error) = self.sink.emit_status(&self.identity, key, payload).await {
            tracing::warn!(
                identity = %self.identity,
                key = %key,
                %error,
                "failed to emit status"
            );
        }
    }
}

impl<L, S> std::fmt::Debug for DeviceHandle<L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("identity", &self.identity)
            .field("label", &self.label)
            .field("loaded", &self.loaded.load(Ordering::Relaxed))
            .field("stale", &self.stale.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
