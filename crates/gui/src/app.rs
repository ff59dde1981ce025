use std::{path::PathBuf, sync::Arc, sync::PoisonError};

use common::network::NetworkClient;
use iced::{Border, Length, Theme, event, keyboard, widget, window};
use tracing::{debug, info};

use crate::{
    CONFIG,
    records::{self, widget::Records},
    settings::ProgressMode,
    upload::{self, widget::Upload},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTab {
    Records,
    Upload,
}

#[derive(Debug)]
pub struct App {
    pub dark_mode: bool,
    tab: AppTab,
    records: Records,
    upload: Upload,
    confirm_exit: bool,
}

#[derive(Debug, Clone)]
pub enum AppMessage {
    Records(records::Msg),
    Upload(upload::Msg),
    Tab(AppTab),
    Key(keyboard::Event),
    FileDropped(PathBuf),
    Quit,
    ConfirmExit,
    CancelExit,
}

impl App {
    pub fn new(network: Arc<NetworkClient>, progress: ProgressMode, dark_mode: bool) -> Self {
        Self {
            dark_mode,
            tab: AppTab::Records,
            records: Records::new(network.clone()),
            upload: Upload::new(network, progress),
            confirm_exit: false,
        }
    }

    /// Initial state plus the first supplier and table fetches.
    pub fn boot(
        network: Arc<NetworkClient>,
        progress: ProgressMode,
        dark_mode: bool,
    ) -> (Self, iced::Task<AppMessage>) {
        (
            Self::new(network, progress, dark_mode),
            iced::Task::batch([
                iced::Task::done(AppMessage::Records(records::Msg::LoadSuppliers)),
                iced::Task::done(AppMessage::Records(records::Msg::Load)),
            ]),
        )
    }

    pub fn update(&mut self, message: AppMessage) -> iced::Task<AppMessage> {
        match message {
            AppMessage::Records(msg) => self.records.update(msg).map(AppMessage::Records),
            AppMessage::Upload(msg) => self.upload.update(msg).map(AppMessage::Upload),
            AppMessage::Tab(tab) => {
                self.tab = tab;
                iced::Task::none()
            }
            AppMessage::Key(event) => {
                let action = CONFIG
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .keyboard
                    .dispatch(&event)
                    .copied();
                match action {
                    Some(action) => {
                        debug!("Key binding fired: {:?}", action);
                        iced::Task::done(action.into())
                    }
                    None => iced::Task::none(),
                }
            }
            AppMessage::FileDropped(path) => {
                self.tab = AppTab::Upload;
                self.upload
                    .update(upload::Msg::FileDropped(path))
                    .map(AppMessage::Upload)
            }
            AppMessage::Quit => {
                if self.upload.has_unsaved_selection() {
                    self.confirm_exit = true;
                    iced::Task::none()
                } else {
                    info!("Exiting");
                    iced::exit()
                }
            }
            AppMessage::ConfirmExit => {
                info!("Exiting with an unsent file");
                iced::exit()
            }
            AppMessage::CancelExit => {
                self.confirm_exit = false;
                iced::Task::none()
            }
        }
    }

    pub fn subscription(&self) -> iced::Subscription<AppMessage> {
        let events = event::listen_with(|ev, status, _window| match ev {
            iced::Event::Keyboard(e) if status == event::Status::Ignored => {
                Some(AppMessage::Key(e))
            }
            iced::Event::Window(window::Event::FileHovered(_)) => {
                Some(AppMessage::Upload(upload::Msg::FileHovered))
            }
            iced::Event::Window(window::Event::FilesHoveredLeft) => {
                Some(AppMessage::Upload(upload::Msg::HoverLeft))
            }
            iced::Event::Window(window::Event::FileDropped(path)) => {
                Some(AppMessage::FileDropped(path))
            }
            _ => None,
        });

        iced::Subscription::batch([
            events,
            window::close_requests().map(|_| AppMessage::Quit),
            self.upload.subscription().map(AppMessage::Upload),
        ])
    }

    pub fn view(&self) -> iced::Element<'_, AppMessage> {
        let tab_button = |label: &'static str, tab: AppTab| {
            widget::button(label)
                .style(if self.tab == tab {
                    widget::button::primary
                } else {
                    widget::button::secondary
                })
                .on_press(AppMessage::Tab(tab))
        };
        let tabs = widget::row![
            tab_button("Inventory records", AppTab::Records),
            tab_button("Import data", AppTab::Upload),
        ]
        .spacing(8.0);

        let content = match self.tab {
            AppTab::Records => self.records.view().map(AppMessage::Records),
            AppTab::Upload => self.upload.view().map(AppMessage::Upload),
        };

        let mut page = widget::column![tabs].spacing(12.0).padding(16.0);
        if self.confirm_exit {
            page = page.push(self.view_exit_prompt());
        }
        page.push(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_exit_prompt(&self) -> iced::Element<'_, AppMessage> {
        widget::container(
            widget::row![
                widget::text("The selected file has not been uploaded. Quit anyway?")
                    .width(Length::Fill),
                widget::button("Quit")
                    .style(widget::button::danger)
                    .on_press(AppMessage::ConfirmExit),
                widget::button("Stay")
                    .style(widget::button::secondary)
                    .on_press(AppMessage::CancelExit),
            ]
            .spacing(8.0)
            .align_y(iced::Alignment::Center),
        )
        .padding(12.0)
        .style(|theme: &Theme| {
            let palette = theme.extended_palette();
            widget::container::Style {
                text_color: Some(palette.danger.weak.text),
                background: Some(palette.danger.weak.color.into()),
                border: Border::default().rounded(8.0),
                ..Default::default()
            }
        })
        .into()
    }
}
