// SPDX-License-Identifier: MPL-2.0
//! View rendering for the application.
//!
//! One screen: the video surface above the transport toolbar. The surface
//! shows the most recent decoded frame, letterboxed; before the first
//! frame arrives it shows the current entry's name.

use super::{App, Message};
use crate::ui::transport;
use iced::widget::{column, container, image, text, Container};
use iced::{alignment, ContentFit, Element, Length};

pub fn view(app: &App) -> Element<'_, Message> {
    let surface: Element<'_, Message> = match &app.frame {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        None => text(app.ui.label.clone()).size(24).into(),
    };

    let surface = Container::new(surface)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center);

    let toolbar = transport::view(transport::ViewContext {
        ui: &app.ui,
        position_secs: app.player.position_secs(),
        duration_secs: app.player.duration_secs(),
        status: app.status.as_deref(),
    })
    .map(Message::Transport);

    container(column![surface, toolbar].width(Length::Fill).height(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
