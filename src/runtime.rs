// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background driver loops: startup discovery policy, periodic device
//! loading and periodic cached-state refresh.
//!
//! Broadcast discovery takes several passes to hear every device, so the
//! startup policy repeats short passes until a number of consecutive
//! passes find nothing new, then falls back to a long interval to pick up
//! late-joining devices. The loops run until their task is dropped;
//! spawn them alongside the process lifetime.

use std::sync::Arc;
use std::time::Duration;

use crate::link::Discovery;
use crate::registry::DeviceRegistry;
use crate::status::StatusSink;

/// Tuning for the background loops.
///
/// # Examples
///
/// ```
/// use lifxbridge::runtime::RuntimeOptions;
/// use std::time::Duration;
///
/// let options = RuntimeOptions::new()
///     .with_initial_pass_timeout(Duration::from_secs(5))
///     .with_settle_after_empty_passes(3);
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    initial_pass_timeout: Duration,
    settle_after_empty_passes: u32,
    rediscovery_interval: Duration,
    rediscovery_timeout: Duration,
    load_interval: Duration,
    refresh_interval: Duration,
}

impl RuntimeOptions {
    /// Creates options with the default policy: 15 s initial passes until
    /// 10 consecutive empty ones, then a 60 s pass every 10 minutes;
    /// device loading every 15 s; bulk refresh every 10 minutes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout of one initial discovery pass.
    #[must_use]
    pub fn with_initial_pass_timeout(mut self, timeout: Duration) -> Self {
        self.initial_pass_timeout = timeout;
        self
    }

    /// Sets how many consecutive empty passes end the initial phase.
    #[must_use]
    pub fn with_settle_after_empty_passes(mut self, passes: u32) -> Self {
        self.settle_after_empty_passes = passes;
        self
    }

    /// Sets the interval between periodic rediscovery passes.
    #[must_use]
    pub fn with_rediscovery_interval(mut self, interval: Duration) -> Self {
        self.rediscovery_interval = interval;
        self
    }

    /// Sets the timeout of a periodic rediscovery pass.
    #[must_use]
    pub fn with_rediscovery_timeout(mut self, timeout: Duration) -> Self {
        self.rediscovery_timeout = timeout;
        self
    }

    /// Sets the interval between device-load ticks.
    #[must_use]
    pub fn with_load_interval(mut self, interval: Duration) -> Self {
        self.load_interval = interval;
        self
    }

    /// Sets the interval between bulk-refresh ticks.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            initial_pass_timeout: Duration::from_secs(15),
            settle_after_empty_passes: 10,
            rediscovery_interval: Duration::from_secs(600),
            rediscovery_timeout: Duration::from_secs(60),
            load_interval: Duration::from_secs(15),
            refresh_interval: Duration::from_secs(600),
        }
    }
}

/// Runs discovery forever: repeated initial passes until the device set
/// settles, then periodic rediscovery.
pub async fn discovery_loop<D, S>(registry: Arc<DeviceRegistry<D, S>>, options: RuntimeOptions)
where
    D: Discovery,
    S: StatusSink,
{
    tracing::info!("performing initial discovery");

    let mut empty_passes = 0;
    while empty_passes < options.settle_after_empty_passes {
        let found = registry.discover(options.initial_pass_timeout).await;
        if found == 0 {
            empty_passes += 1;
        } else {
            empty_passes = 0;
        }
    }

    tracing::info!(
        total = registry.device_count(),
        interval_secs = options.rediscovery_interval.as_secs(),
        "initial discovery settled, continuing periodically"
    );

    loop {
        tokio::time::sleep(options.rediscovery_interval).await;
        registry.discover(options.rediscovery_timeout).await;
    }
}

/// Periodically triggers capability resolution for unloaded devices.
pub async fn load_loop<D, S>(registry: Arc<DeviceRegistry<D, S>>, options: RuntimeOptions)
where
    D: Discovery,
    S: StatusSink,
{
    loop {
        tokio::time::sleep(options.load_interval).await;
        registry.load_devices();
    }
}

/// Periodically schedules refreshes for stale devices.
pub async fn refresh_loop<D, S>(registry: Arc<DeviceRegistry<D, S>>, options: RuntimeOptions)
where
    D: Discovery,
    S: StatusSink,
{
    loop {
        tokio::time::sleep(options.refresh_interval).await;
        registry.refresh_devices();
    }
}
