// SPDX-License-Identifier: MPL-2.0
//! `iced_reel` is a minimal looping video playlist player built with the
//! Iced GUI framework.
//!
//! It plays a fixed, ordered playlist of video files supplied on the
//! command line as (display name, file path) pairs. The current video
//! loops until the user navigates to the previous or next entry.

#![doc(html_root_url = "https://docs.rs/iced_reel/0.1.0")]

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod navigation;
pub mod player;
pub mod playlist;
pub mod ui;
