use std::{sync::Arc, time::Duration};

use common::{
    filters::{FilterForm, FilterSet, PageCursor},
    models::{RECORD_COLUMNS, RecordPage},
    network::{Failure, NetworkClient},
    pagination::{PageLink, page_strip, pagination_info},
};
use iced::{Alignment, Border, Font, Length, Theme, font::Weight, widget};
use tracing::{debug, error};

use crate::{
    alert::{AlertKind, Alerts},
    chart::widget::TrendChart,
};

use super::{Msg, SupplierChoice, TableRow, supplier_choices, table_rows};

const ALERT_LIFETIME: Duration = Duration::from_secs(3);
const BALANCE_COLUMN: usize = 6;
const COLUMN_WIDTHS: [Length; 10] = [
    Length::Fixed(50.0),
    Length::Fixed(100.0),
    Length::FillPortion(2),
    Length::FillPortion(3),
    Length::Fixed(70.0),
    Length::Fixed(70.0),
    Length::Fixed(80.0),
    Length::FillPortion(2),
    Length::Fixed(90.0),
    Length::FillPortion(3),
];

#[derive(Debug, Default)]
struct ChartPanel {
    visible: bool,
    loading: bool,
    request: u64,
    chart: Option<TrendChart>,
}

#[derive(Debug)]
pub struct Records {
    network: Arc<NetworkClient>,
    form: FilterForm,
    supplier: SupplierChoice,
    suppliers: Vec<SupplierChoice>,
    filters: FilterSet,
    cursor: PageCursor,
    page: Option<RecordPage>,
    loading: bool,
    data_request: u64,
    chart: ChartPanel,
    alerts: Alerts,
}

impl Records {
    pub fn new(network: Arc<NetworkClient>) -> Self {
        Self {
            network,
            form: FilterForm::default(),
            supplier: SupplierChoice::All,
            suppliers: supplier_choices(&[]),
            filters: FilterSet::default(),
            cursor: PageCursor::default(),
            page: None,
            loading: false,
            data_request: 0,
            chart: ChartPanel::default(),
            alerts: Alerts::default(),
        }
    }

    pub fn update(&mut self, msg: Msg) -> iced::Task<Msg> {
        match msg {
            Msg::LoadSuppliers => {
                let network = self.network.clone();
                iced::Task::perform(
                    async move { network.suppliers().await },
                    |result| match result {
                        Ok(names) => Msg::SuppliersLoaded(names),
                        Err(e) => Msg::SuppliersFailed(e.to_string()),
                    },
                )
            }
            Msg::SuppliersLoaded(names) => {
                self.suppliers = supplier_choices(&names);
                if !self.suppliers.contains(&self.supplier) {
                    self.supplier = SupplierChoice::All;
                }
                iced::Task::none()
            }
            Msg::SuppliersFailed(e) => {
                error!("Loading suppliers failed: {}", e);
                iced::Task::none()
            }
            Msg::StartDate(s) => {
                self.form.start_date = s;
                iced::Task::none()
            }
            Msg::EndDate(s) => {
                self.form.end_date = s;
                iced::Task::none()
            }
            Msg::Sku(s) => {
                self.form.sku = s;
                iced::Task::none()
            }
            Msg::ProductName(s) => {
                self.form.product_name_like = s;
                iced::Task::none()
            }
            Msg::Supplier(choice) => {
                self.form.supplier = choice.value().to_string();
                self.supplier = choice;
                iced::Task::none()
            }
            Msg::Submit => self.apply_filters(),
            Msg::Reset => {
                self.form.clear();
                self.supplier = SupplierChoice::All;
                self.apply_filters()
            }
            Msg::Load => self.load_data(),
            Msg::GoToPage(page) => {
                self.cursor.go_to(page);
                self.load_data()
            }
            Msg::NextPage => match self.adjacent_page(1) {
                Some(target) => iced::Task::done(Msg::GoToPage(target)),
                None => iced::Task::none(),
            },
            Msg::PreviousPage => match self.adjacent_page(-1) {
                Some(target) => iced::Task::done(Msg::GoToPage(target)),
                None => iced::Task::none(),
            },
            Msg::DataLoaded(request, page) => {
                if request != self.data_request {
                    debug!("Dropping stale page response {}", request);
                    return iced::Task::none();
                }
                self.loading = false;
                self.page = Some(page);
                iced::Task::none()
            }
            Msg::DataFailed(request, failure) => {
                if request != self.data_request {
                    return iced::Task::none();
                }
                self.loading = false;
                self.show_failure("Failed to load data", failure)
            }
            Msg::ToggleChart => {
                if self.chart.visible {
                    // Bumping the request id orphans any fetch still in flight.
                    self.chart.visible = false;
                    self.chart.loading = false;
                    self.chart.request += 1;
                    self.chart.chart = None;
                    iced::Task::none()
                } else {
                    self.chart.visible = true;
                    self.load_chart()
                }
            }
            Msg::ChartLoaded(request, series) => {
                if request != self.chart.request || !self.chart.visible {
                    debug!("Dropping stale chart response {}", request);
                    return iced::Task::none();
                }
                self.chart.loading = false;
                self.chart.chart = Some(TrendChart::new(series));
                iced::Task::none()
            }
            Msg::ChartFailed(request, failure) => {
                if request != self.chart.request {
                    return iced::Task::none();
                }
                self.chart.loading = false;
                self.show_failure("Failed to load chart data", failure)
            }
            Msg::DismissAlert(id) => {
                self.alerts.dismiss(id);
                iced::Task::none()
            }
        }
    }

    /// Page `delta` away from the cursor, if it exists. Steps from the
    /// cursor rather than the rendered page so repeated presses keep
    /// advancing while a fetch is in flight.
    fn adjacent_page(&self, delta: i64) -> Option<u32> {
        let pages = i64::from(self.page.as_ref()?.pages);
        let target = i64::from(self.cursor.page) + delta;
        (1..=pages).contains(&target).then(|| target as u32)
    }

    fn apply_filters(&mut self) -> iced::Task<Msg> {
        self.filters = self.form.filters();
        self.cursor.reset();
        let table = self.load_data();
        if self.chart.visible {
            iced::Task::batch([table, self.load_chart()])
        } else {
            table
        }
    }

    fn load_data(&mut self) -> iced::Task<Msg> {
        self.loading = true;
        self.data_request += 1;
        let request = self.data_request;
        let network = self.network.clone();
        let cursor = self.cursor;
        let filters = self.filters.clone();
        iced::Task::perform(
            async move { network.records(cursor, &filters).await },
            move |result| match result {
                Ok(page) => Msg::DataLoaded(request, page),
                Err(e) => Msg::DataFailed(request, e.into()),
            },
        )
    }

    fn load_chart(&mut self) -> iced::Task<Msg> {
        self.chart.loading = true;
        self.chart.request += 1;
        let request = self.chart.request;
        let network = self.network.clone();
        let filters = self.filters.clone();
        iced::Task::perform(
            async move { network.chart_data(&filters).await },
            move |result| match result {
                Ok(series) => Msg::ChartLoaded(request, series),
                Err(e) => Msg::ChartFailed(request, e.into()),
            },
        )
    }

    fn show_failure(&mut self, context: &str, failure: Failure) -> iced::Task<Msg> {
        let message = match failure {
            Failure::Rejected { message, .. } => format!("{}: {}", context, message),
            Failure::Unreachable(detail) => {
                error!("{}: {}", context, detail);
                format!("{}, check the network connection", context)
            }
        };
        let id = self.alerts.push(AlertKind::Danger, message);
        iced::Task::perform(
            async move { tokio::time::sleep(ALERT_LIFETIME).await },
            move |_| Msg::DismissAlert(id),
        )
    }

    pub fn view(&self) -> iced::Element<'_, Msg> {
        let content = widget::column![
            self.alerts.view(Msg::DismissAlert),
            self.view_filters(),
            widget::rule::horizontal(2.0),
        ]
        .spacing(8.0);

        let content = if self.chart.visible {
            content.push(self.view_chart())
        } else {
            content
        };

        let table: iced::Element<'_, Msg> = if self.loading {
            widget::container(widget::text("Loading..."))
                .center_x(Length::Fill)
                .padding(32.0)
                .into()
        } else {
            self.view_table()
        };

        widget::container(content.push(table).push(self.view_pagination()))
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

    fn view_filters(&self) -> iced::Element<'_, Msg> {
        widget::column![
            widget::row![
                field(
                    "Start date",
                    widget::text_input("YYYY-MM-DD", &self.form.start_date)
                        .on_input(Msg::StartDate)
                        .on_submit(Msg::Submit),
                ),
                field(
                    "End date",
                    widget::text_input("YYYY-MM-DD", &self.form.end_date)
                        .on_input(Msg::EndDate)
                        .on_submit(Msg::Submit),
                ),
                field(
                    "SKU",
                    widget::text_input("Exact SKU", &self.form.sku)
                        .on_input(Msg::Sku)
                        .on_submit(Msg::Submit),
                ),
                field(
                    "Product name",
                    widget::text_input("Contains", &self.form.product_name_like)
                        .on_input(Msg::ProductName)
                        .on_submit(Msg::Submit),
                ),
                widget::column![
                    widget::text("Supplier").size(12.0),
                    widget::pick_list(
                        self.suppliers.as_slice(),
                        Some(&self.supplier),
                        Msg::Supplier,
                    )
                    .width(Length::Fill),
                ]
                .spacing(2.0)
                .width(Length::Fill),
            ]
            .spacing(8.0),
            widget::row![
                widget::button("Search").on_press(Msg::Submit),
                widget::button("Reset")
                    .style(widget::button::secondary)
                    .on_press(Msg::Reset),
                widget::space::horizontal(),
                widget::button(if self.chart.visible {
                    "Hide chart"
                } else {
                    "Show chart"
                })
                .style(widget::button::secondary)
                .on_press(Msg::ToggleChart),
            ]
            .spacing(8.0),
        ]
        .spacing(8.0)
        .into()
    }

    fn view_chart(&self) -> iced::Element<'_, Msg> {
        let body: iced::Element<'_, Msg> = match &self.chart.chart {
            Some(chart) => widget::canvas(chart)
                .width(Length::Fill)
                .height(Length::Fixed(320.0))
                .into(),
            None => widget::container(widget::text(if self.chart.loading {
                "Loading chart..."
            } else {
                "Chart data unavailable"
            }))
            .center_x(Length::Fill)
            .height(Length::Fixed(320.0))
            .into(),
        };
        widget::container(body)
            .padding(8.0)
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

    fn view_table(&self) -> iced::Element<'_, Msg> {
        let header = widget::row(
            RECORD_COLUMNS
                .into_iter()
                .zip(COLUMN_WIDTHS)
                .map(|(label, width)| table_header(label).width(width).into()),
        )
        .spacing(8.0);

        let items = self.page.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[]);
        let rows = table_rows(items).into_iter().map(|row| match row {
            TableRow::Placeholder => widget::container(widget::text("No data"))
                .center_x(Length::Fill)
                .padding(16.0)
                .into(),
            TableRow::Record(cells) => widget::row(
                cells
                    .into_iter()
                    .zip(COLUMN_WIDTHS)
                    .enumerate()
                    .map(|(i, (cell, width))| {
                        if i == BALANCE_COLUMN {
                            balance_badge(cell, width)
                        } else {
                            widget::text(cell).width(width).into()
                        }
                    }),
            )
            .spacing(8.0)
            .align_y(Alignment::Center)
            .into(),
        });

        widget::column![
            header,
            widget::scrollable(widget::column(rows).spacing(6.0)).height(Length::Fill),
        ]
        .spacing(8.0)
        .height(Length::Fill)
        .into()
    }

    fn view_pagination(&self) -> iced::Element<'_, Msg> {
        let Some(page) = &self.page else {
            return widget::row![].into();
        };
        let links: Vec<iced::Element<'_, Msg>> = page_strip(page.page, page.pages)
            .into_iter()
            .map(|link| {
                match link {
                    PageLink::Previous { target, enabled } => widget::button("Previous")
                        .style(widget::button::secondary)
                        .on_press_maybe(enabled.then_some(Msg::GoToPage(target)))
                        .into(),
                    PageLink::Page { number, current } => {
                        widget::button(widget::text(number.to_string()))
                            .style(if current {
                                widget::button::primary
                            } else {
                                widget::button::secondary
                            })
                            .on_press(Msg::GoToPage(number))
                            .into()
                    }
                    PageLink::Gap => widget::text("...").into(),
                    PageLink::Next { target, enabled } => widget::button("Next")
                        .style(widget::button::secondary)
                        .on_press_maybe(enabled.then_some(Msg::GoToPage(target)))
                        .into(),
                }
            })
            .collect();

        widget::row![
            widget::text(pagination_info(page)),
            widget::space::horizontal(),
            widget::row(links).spacing(4.0).align_y(Alignment::Center),
        ]
        .align_y(Alignment::Center)
        .into()
    }
}

fn field<'a>(label: &'static str, input: widget::TextInput<'a, Msg>) -> widget::Column<'a, Msg> {
    widget::column![widget::text(label).size(12.0), input]
        .spacing(2.0)
        .width(Length::Fill)
}

fn balance_badge<'a>(value: String, width: Length) -> iced::Element<'a, Msg> {
    widget::container(
        widget::container(widget::text(value).size(13.0))
            .padding([2.0, 8.0])
            .style(|theme: &Theme| {
                let palette = theme.extended_palette();
                widget::container::Style {
                    text_color: Some(palette.primary.base.text),
                    background: Some(palette.primary.base.color.into()),
                    border: Border::default().rounded(4.0),
                    ..Default::default()
                }
            }),
    )
    .width(width)
    .into()
}

pub fn table_header(label: &str) -> widget::Text<'_> {
    let mut bold = Font::DEFAULT;
    bold.weight = Weight::Bold;
    widget::text(label).font(bold).style(|theme: &Theme| {
        let palette = theme.extended_palette();
        widget::text::Style {
            color: palette.primary.strong.color.into(),
        }
    })
}
