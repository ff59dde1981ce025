use iced::{Alignment, Border, Length, Theme, widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub message: String,
}

/// Dismissible banners shown above a tab's content.
#[derive(Debug, Default)]
pub struct Alerts {
    next_id: u64,
    items: Vec<Alert>,
}

impl Alerts {
    pub fn push(&mut self, kind: AlertKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.items.push(Alert {
            id: self.next_id,
            kind,
            message: message.into(),
        });
        self.next_id
    }

    /// Unknown or already dismissed ids are ignored.
    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|a| a.id != id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn view<'a, M: Clone + 'a>(&'a self, on_dismiss: fn(u64) -> M) -> iced::Element<'a, M> {
        let banners = self.items.iter().map(|alert| {
            let kind = alert.kind;
            widget::container(
                widget::row![
                    widget::text(&alert.message).width(Length::Fill),
                    widget::button("×")
                        .style(widget::button::text)
                        .on_press(on_dismiss(alert.id)),
                ]
                .spacing(8.0)
                .align_y(Alignment::Center),
            )
            .padding(8.0)
            .width(Length::Fill)
            .style(move |theme: &Theme| {
                let palette = theme.extended_palette();
                let pair = match kind {
                    AlertKind::Info => palette.primary.weak,
                    AlertKind::Success => palette.success.weak,
                    AlertKind::Warning => palette.warning.weak,
                    AlertKind::Danger => palette.danger.weak,
                };
                widget::container::Style {
                    text_color: Some(pair.text),
                    background: Some(pair.color.into()),
                    border: Border::default().rounded(4.0),
                    ..Default::default()
                }
            })
            .into()
        });
        widget::column(banners).spacing(4.0).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismiss_removes_only_the_named_alert() {
        let mut alerts = Alerts::default();
        let first = alerts.push(AlertKind::Danger, "invalid");
        let second = alerts.push(AlertKind::Warning, "row 3 bad SKU");
        alerts.dismiss(first);
        alerts.dismiss(first);
        let left: Vec<_> = alerts.iter().map(|a| a.id).collect();
        assert_eq!(left, vec![second]);
        alerts.clear();
        assert!(alerts.is_empty());
    }
}
