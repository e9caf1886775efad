// SPDX-License-Identifier: MPL-2.0
//! UI components for the player window.

pub mod transport;
