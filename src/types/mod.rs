// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core value types: device identity, power state, and color encodings.

mod color;
mod identity;
mod power;

pub use color::{ColorPayload, DeviceColor};
pub use identity::DeviceIdentity;
pub use power::PowerState;
