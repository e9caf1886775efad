// SPDX-License-Identifier: MPL-2.0
//! Transport controls UI.
//!
//! A bottom toolbar with the previous/next buttons, the current video's
//! display name, and a position/duration readout. Buttons only carry a
//! press handler while the corresponding playlist move is available;
//! without one, Iced renders them disabled.

use crate::navigation::UiState;
use iced::widget::{button, column, container, row, text, Column, Row};
use iced::{Alignment, Element, Length};

/// Messages emitted by the transport controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Go to the previous playlist entry.
    Previous,
    /// Go to the next playlist entry.
    Next,
}

/// Everything the toolbar needs to render one frame of UI.
#[derive(Debug)]
pub struct ViewContext<'a> {
    /// Navigation snapshot (label and button enablement).
    pub ui: &'a UiState,
    /// Current playback position in seconds.
    pub position_secs: f64,
    /// Duration of the current video in seconds (0 until known).
    pub duration_secs: f64,
    /// Transient error text, shown in place of the time readout.
    pub status: Option<&'a str>,
}

/// Renders the transport toolbar.
pub fn view(ctx: ViewContext<'_>) -> Element<'_, Message> {
    let previous_button = if ctx.ui.previous_enabled {
        button(text("Previous")).on_press(Message::Previous)
    } else {
        button(text("Previous"))
    };

    let next_button = if ctx.ui.next_enabled {
        button(text("Next")).on_press(Message::Next)
    } else {
        button(text("Next"))
    };

    let label = text(ctx.ui.label.clone()).size(18);

    let detail = match ctx.status {
        Some(status) => text(status.to_string()).size(12),
        None => text(format!(
            "{} / {}",
            format_time(ctx.position_secs),
            format_time(ctx.duration_secs)
        ))
        .size(12),
    };

    let center: Column<'_, Message> = column![label, detail]
        .spacing(2)
        .align_x(Alignment::Center)
        .width(Length::Fill);

    let controls: Row<'_, Message> = row![previous_button, center, next_button]
        .spacing(12)
        .padding(8)
        .align_y(Alignment::Center);

    container(controls).width(Length::Fill).into()
}

/// Formats duration in MM:SS or HH:MM:SS format.
fn format_time(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ui(previous_enabled: bool, next_enabled: bool) -> UiState {
        UiState {
            title: "a.mp4 (1/2) - IcedReel".to_string(),
            label: "Intro".to_string(),
            previous_enabled,
            next_enabled,
        }
    }

    #[test]
    fn format_time_handles_zero() {
        assert_eq!(format_time(0.0), "00:00");
    }

    #[test]
    fn format_time_handles_seconds() {
        assert_eq!(format_time(45.0), "00:45");
    }

    #[test]
    fn format_time_handles_minutes() {
        assert_eq!(format_time(125.0), "02:05");
    }

    #[test]
    fn format_time_handles_hours() {
        assert_eq!(format_time(3665.0), "01:01:05");
    }

    #[test]
    fn format_time_handles_negative() {
        // Negative time should be clamped to 0
        assert_eq!(format_time(-10.0), "00:00");
    }

    #[test]
    fn view_renders_with_both_buttons_enabled() {
        let ui = sample_ui(true, true);
        let _element = view(ViewContext {
            ui: &ui,
            position_secs: 10.0,
            duration_secs: 60.0,
            status: None,
        });
    }

    #[test]
    fn view_renders_with_status_message() {
        let ui = sample_ui(false, false);
        let _element = view(ViewContext {
            ui: &ui,
            position_secs: 0.0,
            duration_secs: 0.0,
            status: Some("Video Error: No video stream found"),
        });
    }

    #[test]
    fn message_is_copyable() {
        let msg = Message::Previous;
        let copied = msg;
        assert_eq!(msg, copied);
    }
}
