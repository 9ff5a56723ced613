// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrent-safe registry of discovered devices and the discovery /
//! bulk-refresh orchestration.
//!
//! The registry exclusively owns every handle it creates. Insertion is
//! idempotent by identity: rediscovering a known device never replaces or
//! duplicates its handle, and entries are never removed in normal
//! operation. The map lock is only ever held for brief synchronous
//! check-and-insert sections, never across a network call.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::device::DeviceHandle;
use crate::link::{DeviceLink, Discovery, DiscoveredDevice, with_timeout};
use crate::status::StatusSink;
use crate::types::DeviceIdentity;

/// Timeout for the best-effort label fetch during discovery.
const LABEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffer between the discovery scan and the registering loop.
const DISCOVERY_CHANNEL_CAPACITY: usize = 16;

/// Registry of devices keyed by their stable identity.
///
/// # Examples
///
/// ```ignore
/// let registry = Arc::new(DeviceRegistry::new(discovery, sink));
///
/// let found = registry.discover(Duration::from_secs(15)).await;
/// tracing::info!(found, "discovery pass finished");
///
/// if let Some(device) = registry.lookup("d073d5012345") {
///     device.turn_on(Duration::from_millis(1500)).await?;
/// }
/// ```
pub struct DeviceRegistry<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    discovery: D,
    sink: Arc<S>,
    devices: parking_lot::RwLock<HashMap<DeviceIdentity, Arc<DeviceHandle<D::Link, S>>>>,
    /// Single-flight guard: at most one discovery pass at a time.
    discovering: AtomicBool,
    /// Single-flight guard for bulk refresh scheduling.
    refreshing: AtomicBool,
}

impl<D, S> DeviceRegistry<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    /// Creates an empty registry.
    pub fn new(discovery: D, sink: S) -> Self {
        Self {
            discovery,
            sink: Arc::new(sink),
            devices: parking_lot::RwLock::new(HashMap::new()),
            discovering: AtomicBool::new(false),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Runs one bounded discovery pass and returns the number of newly
    /// discovered devices.
    ///
    /// At most one pass runs at a time; a concurrent call while one is in
    /// flight is rejected with a warning and returns zero rather than
    /// queueing. The pass listens until `timeout` elapses or the scan
    /// completes; devices registered before the deadline are kept either
    /// way. Discovery is noisy by nature, so callers repeat passes (see
    /// [`runtime`](crate::runtime)) instead of relying on one.
    pub async fn discover(&self, timeout: Duration) -> usize {
        if self
            .discovering
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("aborted - discovery already in progress");
            return 0;
        }

        let (tx, mut rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);

        let scan = async {
            if let Err(error) = self.discovery.scan(tx).await {
                tracing::warn!(%error, "discovery scan failed");
            }
        };

        let mut discovered = 0_usize;
        let register = async {
            while let Some(found) = rx.recv().await {
                if self.register_discovered(found).await {
                    discovered += 1;
                }
            }
        };

        // The scan owns the sender, so `register` completes when the scan
        // does; the timeout stops listening and keeps what was found.
        let _ = tokio::time::timeout(timeout, async {
            tokio::join!(scan, register);
        })
        .await;

        tracing::debug!(
            discovered,
            total = self.device_count(),
            "discovery pass finished"
        );
        self.discovering.store(false, Ordering::Release);

        // Kick off capability resolution for anything still unloaded.
        self.load_devices();

        discovered
    }

    /// Registers one discovered device; returns true if it was new.
    async fn register_discovered(&self, found: DiscoveredDevice<D::Link>) -> bool {
        let identity = DeviceIdentity::new(&found.address);

        if self.devices.read().contains_key(&identity) {
            return false;
        }

        // Bounded best-effort label fetch; failure skips the candidate for
        // this pass, it may be found again on the next one.
        let label = with_timeout(LABEL_TIMEOUT, async {
            let mut conn = found.link.dial().await?;
            found.link.label(&mut conn).await
        })
        .await;

        let label = match label {
            Ok(label) => label,
            Err(error) => {
                tracing::warn!(identity = %identity, %error, "couldn't get label for device");
                return false;
            }
        };

        let handle = Arc::new(DeviceHandle::new(
            identity.clone(),
            Some(label.clone()),
            found.link,
            Arc::clone(&self.sink),
        ));

        {
            let mut devices = self.devices.write();
            if devices.contains_key(&identity) {
                return false;
            }
            devices.insert(identity.clone(), handle);
        }

        tracing::info!(identity = %identity, label = %label, "found device");
        true
    }

    /// Registers a statically known device, bypassing discovery.
    ///
    /// Insertion is idempotent by identity. Capability resolution is
    /// triggered eagerly in the background.
    pub fn add_device(&self, address: &str, link: D::Link) -> DeviceIdentity {
        let identity = DeviceIdentity::new(address);

        let handle = {
            let mut devices = self.devices.write();
            Arc::clone(devices.entry(identity.clone()).or_insert_with(|| {
                Arc::new(DeviceHandle::new(
                    identity.clone(),
                    None,
                    link,
                    Arc::clone(&self.sink),
                ))
            }))
        };

        tracing::debug!(identity = %identity, "added device");
        Self::spawn_load(handle);
        identity
    }

    /// Triggers capability resolution for every not-yet-loaded device.
    ///
    /// Fire-and-forget: one task per handle, failures logged rather than
    /// propagated, devices retried on the next pass.
    pub fn load_devices(&self) {
        let pending: Vec<_> = self
            .devices
            .read()
            .values()
            .filter(|handle| !handle.is_loaded())
            .cloned()
            .collect();

        for handle in pending {
            Self::spawn_load(handle);
        }
    }

    fn spawn_load(handle: Arc<DeviceHandle<D::Link, S>>) {
        tokio::spawn(async move {
            match handle.load().await {
                Ok(()) => {
                    tracing::debug!(identity = %handle.identity(), "device load finished");
                }
                Err(error) => {
                    tracing::warn!(identity = %handle.identity(), %error, "device load failed");
                }
            }
        });
    }

    /// Schedules a refresh for every device marked stale.
    pub fn refresh_devices(&self) {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("aborted - refresh already in progress");
            return;
        }

        let stale: Vec<_> = self
            .devices
            .read()
            .values()
            .filter(|handle| handle.is_stale())
            .cloned()
            .collect();

        for handle in stale {
            tracing::debug!(identity = %handle.identity(), "scheduling refresh");
            tokio::spawn(async move {
                if let Err(error) = handle.refresh().await {
                    tracing::warn!(identity = %handle.identity(), %error, "device refresh failed");
                }
            });
        }

        self.refreshing.store(false, Ordering::Release);
    }

    /// Marks every device stale, then schedules refreshes unconditionally.
    pub fn force_refresh_devices(&self) {
        for handle in self.devices.read().values() {
            handle.mark_stale();
        }
        self.refresh_devices();
    }

    /// Looks up a device by identity.
    ///
    /// Absence is not an error; callers log and ignore.
    #[must_use]
    pub fn lookup(&self, identity: &str) -> Option<Arc<DeviceHandle<D::Link, S>>> {
        self.devices.read().get(&DeviceIdentity::new(identity)).cloned()
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Returns true if no devices are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Returns all registered identities.
    #[must_use]
    pub fn identities(&self) -> Vec<DeviceIdentity> {
        self.devices.read().keys().cloned().collect()
    }
}

impl<D, S> std::fmt::Debug for DeviceRegistry<D, S>
where
    D: Discovery,
    S: StatusSink,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.device_count())
            .field("discovering", &self.discovering.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
