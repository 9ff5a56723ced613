// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static product table for capability classification.
//!
//! Devices are classified once, by (vendor, product) pair: products with
//! relay channels resolve as relays, every other recognized LIFX product
//! resolves as a light, and unrecognized hardware is unsupported.

use crate::link::HardwareVersion;

/// The LIFX vendor identifier.
const LIFX_VENDOR: u32 = 1;

/// One entry of the known-product table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Product {
    /// Product identifier within the LIFX vendor range.
    pub id: u32,
    /// Marketing name, used in log fields only.
    pub name: &'static str,
    /// True if the product exposes relay channels instead of a light.
    pub relays: bool,
}

/// Known LIFX products, ordered by product id.
const PRODUCTS: &[Product] = &[
    Product { id: 1, name: "LIFX Original 1000", relays: false },
    Product { id: 3, name: "LIFX Color 650", relays: false },
    Product { id: 10, name: "LIFX White 800 (Low Voltage)", relays: false },
    Product { id: 11, name: "LIFX White 800 (High Voltage)", relays: false },
    Product { id: 15, name: "LIFX Color 1000", relays: false },
    Product { id: 18, name: "LIFX White 900 BR30 (Low Voltage)", relays: false },
    Product { id: 20, name: "LIFX Color 1000 BR30", relays: false },
    Product { id: 22, name: "LIFX Color 1000", relays: false },
    Product { id: 27, name: "LIFX A19", relays: false },
    Product { id: 28, name: "LIFX BR30", relays: false },
    Product { id: 29, name: "LIFX+ A19", relays: false },
    Product { id: 30, name: "LIFX+ BR30", relays: false },
    Product { id: 31, name: "LIFX Z", relays: false },
    Product { id: 32, name: "LIFX Z", relays: false },
    Product { id: 36, name: "LIFX Downlight", relays: false },
    Product { id: 37, name: "LIFX Downlight", relays: false },
    Product { id: 38, name: "LIFX Beam", relays: false },
    Product { id: 43, name: "LIFX A19", relays: false },
    Product { id: 44, name: "LIFX BR30", relays: false },
    Product { id: 45, name: "LIFX+ A19", relays: false },
    Product { id: 46, name: "LIFX+ BR30", relays: false },
    Product { id: 49, name: "LIFX Mini Color", relays: false },
    Product { id: 50, name: "LIFX Mini White to Warm", relays: false },
    Product { id: 51, name: "LIFX Mini White", relays: false },
    Product { id: 52, name: "LIFX GU10", relays: false },
    Product { id: 55, name: "LIFX Tile", relays: false },
    Product { id: 57, name: "LIFX Candle", relays: false },
    Product { id: 59, name: "LIFX Mini Color", relays: false },
    Product { id: 60, name: "LIFX Mini White to Warm", relays: false },
    Product { id: 61, name: "LIFX Mini White", relays: false },
    Product { id: 62, name: "LIFX A19", relays: false },
    Product { id: 63, name: "LIFX BR30", relays: false },
    Product { id: 64, name: "LIFX+ A19", relays: false },
    Product { id: 65, name: "LIFX+ BR30", relays: false },
    Product { id: 66, name: "LIFX Mini White", relays: false },
    Product { id: 68, name: "LIFX Candle", relays: false },
    Product { id: 70, name: "LIFX Switch", relays: true },
    Product { id: 71, name: "LIFX Switch", relays: true },
    Product { id: 81, name: "LIFX Candle White to Warm", relays: false },
    Product { id: 82, name: "LIFX Filament", relays: false },
    Product { id: 85, name: "LIFX Filament", relays: false },
    Product { id: 87, name: "LIFX Mini White", relays: false },
    Product { id: 88, name: "LIFX Mini White", relays: false },
    Product { id: 89, name: "LIFX Switch", relays: true },
    Product { id: 90, name: "LIFX Clean", relays: false },
    Product { id: 91, name: "LIFX Color", relays: false },
    Product { id: 92, name: "LIFX Color", relays: false },
    Product { id: 94, name: "LIFX BR30", relays: false },
    Product { id: 96, name: "LIFX Candle White to Warm", relays: false },
    Product { id: 97, name: "LIFX A19", relays: false },
    Product { id: 98, name: "LIFX BR30", relays: false },
    Product { id: 99, name: "LIFX Clean", relays: false },
    Product { id: 100, name: "LIFX Filament Clear", relays: false },
    Product { id: 101, name: "LIFX Filament Amber", relays: false },
    Product { id: 109, name: "LIFX A19 Night Vision", relays: false },
    Product { id: 110, name: "LIFX BR30 Night Vision", relays: false },
    Product { id: 111, name: "LIFX A19 Night Vision", relays: false },
    Product { id: 112, name: "LIFX BR30 Night Vision", relays: false },
    Product { id: 113, name: "LIFX Mini White to Warm", relays: false },
    Product { id: 114, name: "LIFX Mini White to Warm", relays: false },
    Product { id: 115, name: "LIFX Switch", relays: true },
    Product { id: 116, name: "LIFX Switch", relays: true },
    Product { id: 117, name: "LIFX Z", relays: false },
    Product { id: 118, name: "LIFX Z", relays: false },
    Product { id: 119, name: "LIFX Beam", relays: false },
    Product { id: 120, name: "LIFX Beam", relays: false },
    Product { id: 123, name: "LIFX Color", relays: false },
    Product { id: 124, name: "LIFX Color", relays: false },
    Product { id: 125, name: "LIFX White to Warm", relays: false },
    Product { id: 126, name: "LIFX White to Warm", relays: false },
    Product { id: 127, name: "LIFX White", relays: false },
    Product { id: 128, name: "LIFX White", relays: false },
];

/// Looks up a hardware version in the known-product table.
///
/// Returns `None` for foreign vendors and unrecognized product ids; such
/// devices resolve as unsupported.
pub(crate) fn find(hw: HardwareVersion) -> Option<&'static Product> {
    if hw.vendor_id != LIFX_VENDOR {
        return None;
    }
    PRODUCTS.iter().find(|p| p.id == hw.product_id)
}
