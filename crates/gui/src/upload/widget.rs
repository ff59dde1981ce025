use std::{path::PathBuf, sync::Arc, time::Duration};

use common::{
    network::{Failure, NetworkClient, UploadEvent},
    upload::{SelectedFile, format_file_size},
};
use iced::{Alignment, Border, Length, Theme, widget};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::{
    alert::{AlertKind, Alerts},
    icons,
    settings::ProgressMode,
    timer::DeferredTimer,
};

use super::Msg;

const AUTO_RESET_DELAY: Duration = Duration::from_secs(2);
const PROGRESS_HIDE_DELAY: Duration = Duration::from_secs(3);
const SIMULATED_TICK: Duration = Duration::from_millis(200);
const SIMULATED_CAP: f32 = 90.0;
const SIMULATED_STEP: f32 = 30.0;
const UPLOAD_COMPLETE: &str = "Upload complete";

#[derive(Debug)]
pub struct Upload {
    network: Arc<NetworkClient>,
    progress_mode: ProgressMode,
    path_input: String,
    selected: Option<SelectedFile>,
    dragging: bool,
    /// Armed by a hover; the first drop of the gesture disarms it.
    drop_armed: bool,
    uploading: bool,
    uploaded: bool,
    /// `Some` while the progress bar is visible.
    progress: Option<f32>,
    alerts: Alerts,
    auto_reset: DeferredTimer,
    progress_hide: DeferredTimer,
}

impl Upload {
    pub fn new(network: Arc<NetworkClient>, progress_mode: ProgressMode) -> Self {
        Self {
            network,
            progress_mode,
            path_input: String::new(),
            selected: None,
            dragging: false,
            drop_armed: false,
            uploading: false,
            uploaded: false,
            progress: None,
            alerts: Alerts::default(),
            auto_reset: DeferredTimer::default(),
            progress_hide: DeferredTimer::default(),
        }
    }

    /// Upload is offered iff a valid file is staged and nothing is in flight.
    pub fn can_upload(&self) -> bool {
        self.selected.is_some() && !self.uploading
    }

    /// A staged file that has not made it to the server yet.
    pub fn has_unsaved_selection(&self) -> bool {
        self.selected.is_some() && !self.uploaded
    }

    pub fn update(&mut self, msg: Msg) -> iced::Task<Msg> {
        match msg {
            Msg::PathInput(s) => {
                self.path_input = s;
                iced::Task::none()
            }
            Msg::SubmitPath => {
                let path = self.path_input.trim();
                if path.is_empty() {
                    return iced::Task::none();
                }
                let path = PathBuf::from(path);
                self.select_file(path);
                iced::Task::none()
            }
            Msg::FileHovered => {
                self.dragging = true;
                self.drop_armed = true;
                iced::Task::none()
            }
            Msg::HoverLeft => {
                self.dragging = false;
                self.drop_armed = false;
                iced::Task::none()
            }
            Msg::FileDropped(path) => {
                self.dragging = false;
                if std::mem::take(&mut self.drop_armed) {
                    self.select_file(path);
                } else {
                    debug!("Ignoring extra dropped file {}", path.display());
                }
                iced::Task::none()
            }
            Msg::Upload => self.start_upload(),
            Msg::Progress(p) => {
                if self.uploading {
                    self.progress = Some(p.clamp(0.0, 100.0));
                }
                iced::Task::none()
            }
            Msg::SimulatedTick => {
                if self.uploading && self.progress_mode == ProgressMode::Simulated {
                    let step = rand::thread_rng().gen_range(0.0..SIMULATED_STEP);
                    let current = self.progress.unwrap_or(0.0);
                    self.progress = Some((current + step).min(SIMULATED_CAP).max(current));
                }
                iced::Task::none()
            }
            Msg::Finished(result) => self.finish_upload(result),
            Msg::AutoReset(token) => {
                if self.auto_reset.fire(token) {
                    self.clear();
                }
                iced::Task::none()
            }
            Msg::HideProgress(token) => {
                if self.progress_hide.fire(token) {
                    self.progress = None;
                }
                iced::Task::none()
            }
            Msg::Reset => {
                if !self.uploading {
                    self.clear();
                }
                iced::Task::none()
            }
            Msg::DismissAlert(id) => {
                self.alerts.dismiss(id);
                iced::Task::none()
            }
        }
    }

    pub fn subscription(&self) -> iced::Subscription<Msg> {
        if self.uploading && self.progress_mode == ProgressMode::Simulated {
            iced::time::every(SIMULATED_TICK).map(|_| Msg::SimulatedTick)
        } else {
            iced::Subscription::none()
        }
    }

    fn select_file(&mut self, path: PathBuf) {
        if self.uploading {
            warn!("Ignoring {} while an upload is in flight", path.display());
            return;
        }
        // A pending reset from an earlier upload must not wipe this selection.
        self.auto_reset.cancel();
        self.uploaded = false;
        self.alerts.clear();

        match SelectedFile::inspect(&path) {
            Ok(file) => {
                info!("Selected {} ({} bytes)", file.name, file.size);
                self.path_input = path.display().to_string();
                self.selected = Some(file);
            }
            Err(rejection) => {
                warn!("Rejected {}: {}", path.display(), rejection);
                self.selected = None;
                self.alerts.push(AlertKind::Danger, rejection.to_string());
            }
        }
    }

    fn start_upload(&mut self) -> iced::Task<Msg> {
        if self.uploading {
            return iced::Task::none();
        }
        let Some(file) = self.selected.clone() else {
            return iced::Task::none();
        };
        self.uploading = true;
        self.progress = Some(0.0);
        self.auto_reset.cancel();
        self.progress_hide.cancel();
        self.alerts.clear();
        info!("Uploading {} ({:?} progress)", file.name, self.progress_mode);

        match self.progress_mode {
            ProgressMode::Streamed => iced::Task::run(
                self.network.upload_with_progress(file),
                |event| match event {
                    UploadEvent::Progress(p) => Msg::Progress(p),
                    UploadEvent::Finished(result) => Msg::Finished(result.map_err(Failure::from)),
                },
            ),
            ProgressMode::Simulated => {
                let network = self.network.clone();
                iced::Task::perform(
                    async move { network.upload(&file).await.map_err(Failure::from) },
                    Msg::Finished,
                )
            }
        }
    }

    fn finish_upload(&mut self, result: Result<String, Failure>) -> iced::Task<Msg> {
        if !self.uploading {
            return iced::Task::none();
        }
        self.uploading = false;
        self.progress = Some(100.0);
        let hide = self
            .progress_hide
            .schedule(PROGRESS_HIDE_DELAY, Msg::HideProgress);

        match result {
            Ok(message) => {
                info!("Upload accepted: {}", message);
                self.uploaded = true;
                let message = if message.trim().is_empty() {
                    UPLOAD_COMPLETE.to_string()
                } else {
                    message
                };
                self.alerts.push(AlertKind::Success, message);
                let reset = self.auto_reset.schedule(AUTO_RESET_DELAY, Msg::AutoReset);
                iced::Task::batch([hide, reset])
            }
            Err(Failure::Rejected { message, errors }) => {
                warn!("Upload rejected: {} ({} details)", message, errors.len());
                self.alerts.push(AlertKind::Danger, message);
                if !errors.is_empty() {
                    self.alerts.push(
                        AlertKind::Warning,
                        format!("Error details:\n{}", errors.join("\n")),
                    );
                }
                hide
            }
            Err(Failure::Unreachable(detail)) => {
                error!("Upload failed: {}", detail);
                self.alerts.push(
                    AlertKind::Danger,
                    "Upload failed, check the network connection",
                );
                hide
            }
        }
    }

    fn clear(&mut self) {
        self.selected = None;
        self.uploaded = false;
        self.path_input.clear();
        self.progress = None;
        self.dragging = false;
        self.alerts.clear();
        self.auto_reset.cancel();
        self.progress_hide.cancel();
    }

    pub fn view(&self) -> iced::Element<'_, Msg> {
        let mut content = widget::column![
            widget::text("Import Excel data").size(28.0),
            self.alerts.view(Msg::DismissAlert),
            self.view_drop_zone(),
            widget::row![
                widget::text_input("Path to an .xlsx file", &self.path_input)
                    .on_input(Msg::PathInput)
                    .on_submit(Msg::SubmitPath),
                widget::button("Select")
                    .style(widget::button::secondary)
                    .on_press_maybe((!self.uploading).then_some(Msg::SubmitPath)),
            ]
            .spacing(8.0),
        ]
        .spacing(12.0);

        if let Some(file) = &self.selected {
            content = content.push(view_file_details(file));
        }

        if let Some(progress) = self.progress {
            content = content.push(
                widget::row![
                    widget::progress_bar(0.0..=100.0, progress),
                    widget::text(format!("{:.0}%", progress)).width(48.0),
                ]
                .spacing(8.0)
                .align_y(Alignment::Center),
            );
        }

        let mut actions = widget::row![
            widget::button("Upload").on_press_maybe(self.can_upload().then_some(Msg::Upload)),
        ]
        .spacing(8.0);
        if self.selected.is_some() {
            actions = actions.push(
                widget::button("Reset")
                    .style(widget::button::secondary)
                    .on_press_maybe((!self.uploading).then_some(Msg::Reset)),
            );
        }
        content = content.push(actions);

        widget::container(widget::scrollable(content))
            .height(Length::Fill)
            .width(Length::Fill)
            .style(|theme: &Theme| {
                let palette = theme.extended_palette();
                widget::container::Style {
                    text_color: Some(palette.background.weak.text),
                    background: Some(palette.background.weak.color.into()),
                    border: Border::default().rounded(8.0),
                    ..Default::default()
                }
            })
            .padding(16.0)
            .into()
    }

    fn view_drop_zone(&self) -> iced::Element<'_, Msg> {
        let inner = match &self.selected {
            Some(file) => widget::column![
                widget::svg(icons::spreadsheet()).width(48.0).height(48.0),
                widget::text(&file.name).size(20.0),
                widget::text(format!("File size: {}", format_file_size(file.size))),
            ],
            None => widget::column![
                widget::svg(icons::upload()).width(48.0).height(48.0),
                widget::text("Drag a file here or enter its path below").size(20.0),
                widget::text("Only .xlsx files, up to 2MB"),
            ],
        }
        .spacing(8.0)
        .align_x(Alignment::Center);

        let dragging = self.dragging;
        let has_file = self.selected.is_some();
        widget::container(inner)
            .center_x(Length::Fill)
            .padding(32.0)
            .style(move |theme: &Theme| {
                let palette = theme.extended_palette();
                let (color, width) = if dragging {
                    (palette.primary.base.color, 3.0)
                } else if has_file {
                    (palette.success.base.color, 2.0)
                } else {
                    (palette.background.strong.color, 2.0)
                };
                widget::container::Style {
                    background: Some(palette.background.base.color.into()),
                    border: Border {
                        color,
                        width,
                        radius: iced::border::Radius::from(8.0),
                    },
                    ..Default::default()
                }
            })
            .into()
    }
}

fn view_file_details(file: &SelectedFile) -> iced::Element<'_, Msg> {
    let detail = |label: &'static str, value: String| {
        widget::row![
            widget::text(label).width(120.0),
            widget::text(value).width(Length::Fill),
        ]
        .spacing(8.0)
    };
    widget::container(
        widget::column![
            detail("File name:", file.name.clone()),
            detail("File size:", format_file_size(file.size)),
            detail("File type:", file.mime.clone()),
            detail("Last modified:", file.modified_label()),
        ]
        .spacing(4.0),
    )
    .padding(12.0)
    .width(Length::Fill)
    .style(|theme: &Theme| {
        let palette = theme.extended_palette();
        widget::container::Style {
            background: Some(palette.background.base.color.into()),
            border: Border::default().rounded(8.0),
            ..Default::default()
        }
    })
    .into()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use common::upload::MAX_UPLOAD_BYTES;

    use super::*;
    use crate::alert::Alert;

    fn upload(mode: ProgressMode) -> Upload {
        Upload::new(Arc::new(NetworkClient::local_client().unwrap()), mode)
    }

    fn file_on_disk(dir: &tempfile::TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&vec![1u8; len])
            .unwrap();
        path
    }

    fn drop_file(u: &mut Upload, path: PathBuf) {
        let _ = u.update(Msg::FileHovered);
        let _ = u.update(Msg::FileDropped(path));
    }

    fn kinds(alerts: &Alerts) -> Vec<(AlertKind, String)> {
        alerts
            .iter()
            .map(|Alert { kind, message, .. }| (*kind, message.clone()))
            .collect()
    }

    #[test]
    fn rejects_wrong_extension_and_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);

        drop_file(&mut u, file_on_disk(&dir, "stock.csv", 10));
        assert!(u.selected.is_none());
        assert!(!u.can_upload());
        assert_eq!(u.alerts.iter().next().map(|a| a.kind), Some(AlertKind::Danger));

        let big = file_on_disk(&dir, "big.xlsx", MAX_UPLOAD_BYTES as usize + 1);
        let _ = u.update(Msg::PathInput(big.display().to_string()));
        let _ = u.update(Msg::SubmitPath);
        assert!(u.selected.is_none());
        assert!(!u.can_upload());
    }

    #[test]
    fn rejection_unsets_a_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "ok.xlsx", 10));
        assert!(u.can_upload());
        drop_file(&mut u, file_on_disk(&dir, "notes.txt", 10));
        assert!(u.selected.is_none());
        assert!(!u.can_upload());
    }

    #[test]
    fn drag_affordance_follows_hover() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        let _ = u.update(Msg::FileHovered);
        assert!(u.dragging);
        let _ = u.update(Msg::HoverLeft);
        assert!(!u.dragging);
        let _ = u.update(Msg::FileHovered);
        let _ = u.update(Msg::FileDropped(file_on_disk(&dir, "Stock.XLSX", 10)));
        assert!(!u.dragging);
        assert_eq!(u.selected.as_ref().map(|f| f.name.as_str()), Some("Stock.XLSX"));
        assert!(u.has_unsaved_selection());
    }

    #[test]
    fn only_the_first_file_of_a_drop_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let first = file_on_disk(&dir, "a.xlsx", 10);
        let second = file_on_disk(&dir, "notes.txt", 10);
        let mut u = upload(ProgressMode::Streamed);

        let _ = u.update(Msg::FileHovered);
        let _ = u.update(Msg::FileHovered);
        let _ = u.update(Msg::FileDropped(first));
        let _ = u.update(Msg::FileDropped(second.clone()));

        assert!(u.can_upload());
        assert_eq!(u.selected.as_ref().map(|f| f.name.as_str()), Some("a.xlsx"));
        assert!(u.alerts.is_empty());

        // A new gesture is honoured again.
        drop_file(&mut u, second);
        assert!(u.selected.is_none());
    }

    #[test]
    fn success_without_message_uses_fallback_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Finished(Ok(String::new())));
        assert_eq!(
            kinds(&u.alerts),
            vec![(AlertKind::Success, UPLOAD_COMPLETE.to_string())]
        );
    }

    #[test]
    fn success_shows_message_then_resets() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));

        let _ = u.update(Msg::Upload);
        assert!(u.uploading);
        assert!(!u.can_upload());
        assert_eq!(u.progress, Some(0.0));

        let _ = u.update(Msg::Finished(Ok("OK".into())));
        assert!(!u.uploading);
        assert_eq!(u.progress, Some(100.0));
        assert_eq!(kinds(&u.alerts), vec![(AlertKind::Success, "OK".to_string())]);
        assert!(!u.has_unsaved_selection());

        let token = u.auto_reset.pending().unwrap();
        let _ = u.update(Msg::AutoReset(token));
        assert!(u.selected.is_none());
        assert!(u.progress.is_none());
        assert!(!u.can_upload());
        assert!(u.alerts.is_empty());
    }

    #[test]
    fn failure_lists_errors_and_keeps_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);

        let _ = u.update(Msg::Finished(Err(Failure::Rejected {
            message: "invalid".into(),
            errors: vec!["row 3 bad SKU".into()],
        })));

        let alerts = kinds(&u.alerts);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0], (AlertKind::Danger, "invalid".to_string()));
        assert_eq!(alerts[1].0, AlertKind::Warning);
        assert!(alerts[1].1.contains("row 3 bad SKU"));
        assert!(u.auto_reset.pending().is_none());
        assert!(u.selected.is_some());
        assert!(u.can_upload());
        assert!(u.has_unsaved_selection());
    }

    #[test]
    fn transport_failure_shows_generic_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Finished(Err(Failure::Unreachable("refused".into()))));
        assert_eq!(
            kinds(&u.alerts),
            vec![(
                AlertKind::Danger,
                "Upload failed, check the network connection".to_string()
            )]
        );
        assert!(u.can_upload());
        assert!(u.progress_hide.pending().is_some());
    }

    #[test]
    fn new_selection_cancels_pending_auto_reset() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "first.xlsx", 10));
        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Finished(Ok("OK".into())));
        let stale = u.auto_reset.pending().unwrap();

        drop_file(&mut u, file_on_disk(&dir, "second.xlsx", 10));
        let _ = u.update(Msg::AutoReset(stale));

        assert_eq!(u.selected.as_ref().map(|f| f.name.as_str()), Some("second.xlsx"));
    }

    #[test]
    fn new_upload_cancels_pending_progress_hide() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Finished(Err(Failure::Unreachable("refused".into()))));
        let stale = u.progress_hide.pending().unwrap();

        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Progress(40.0));
        let _ = u.update(Msg::HideProgress(stale));
        assert_eq!(u.progress, Some(40.0));
    }

    #[test]
    fn simulated_progress_never_passes_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Simulated);
        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);

        let mut last = 0.0;
        for _ in 0..40 {
            let _ = u.update(Msg::SimulatedTick);
            let now = u.progress.unwrap();
            assert!(now >= last);
            assert!(now <= SIMULATED_CAP);
            last = now;
        }

        let _ = u.update(Msg::Finished(Ok("OK".into())));
        let _ = u.update(Msg::SimulatedTick);
        assert_eq!(u.progress, Some(100.0));
    }

    #[test]
    fn upload_and_reset_are_ignored_when_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut u = upload(ProgressMode::Streamed);
        let _ = u.update(Msg::Upload);
        assert!(!u.uploading);

        drop_file(&mut u, file_on_disk(&dir, "stock.xlsx", 10));
        let _ = u.update(Msg::Upload);
        let _ = u.update(Msg::Reset);
        assert!(u.selected.is_some());
        let _ = u.update(Msg::Progress(10.0));
        assert_eq!(u.progress, Some(10.0));

        let _ = u.update(Msg::Finished(Ok("OK".into())));
        let _ = u.update(Msg::Progress(20.0));
        assert_eq!(u.progress, Some(100.0));

        let _ = u.update(Msg::Reset);
        assert!(u.selected.is_none());
        assert!(u.path_input.is_empty());
    }
}
