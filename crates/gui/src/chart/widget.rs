use common::models::ChartSeries;
use iced::{
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse,
    widget::canvas::{self, Cache, Frame, Geometry, Path, Stroke, Text},
};

use super::{TITLE, format_thousands, label_stride, nearest_index, plot_points, value_range};

const MARGIN_LEFT: f32 = 72.0;
const MARGIN_RIGHT: f32 = 24.0;
const MARGIN_TOP: f32 = 36.0;
const MARGIN_BOTTOM: f32 = 32.0;
const LABEL_SIZE: f32 = 12.0;

/// Line + area chart of one balance series keyed by date.
///
/// Owns its render cache; replacing or dropping the chart releases it. The
/// cache is keyed on the canvas size, so window resizes redraw without any
/// extra bookkeeping.
pub struct TrendChart {
    series: ChartSeries,
    values: Vec<f64>,
    cache: Cache,
}

impl std::fmt::Debug for TrendChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendChart")
            .field("points", &self.values.len())
            .finish()
    }
}

impl TrendChart {
    pub fn new(series: ChartSeries) -> Self {
        let values = series.points().map(|(_, v)| v).collect();
        Self {
            series,
            values,
            cache: Cache::new(),
        }
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    fn plot_area(size: Size) -> Rectangle {
        Rectangle {
            x: MARGIN_LEFT,
            y: MARGIN_TOP,
            width: (size.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (size.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
        }
    }

    fn draw_series(&self, frame: &mut Frame, theme: &Theme) {
        let palette = theme.extended_palette();
        let text_color = palette.background.base.text;
        let line_color = palette.primary.base.color;
        let area = Self::plot_area(frame.size());

        frame.fill_text(Text {
            content: TITLE.to_string(),
            position: Point::new(area.x, 8.0),
            color: text_color,
            size: Pixels(16.0),
            ..Text::default()
        });

        let axis = Stroke::default()
            .with_color(palette.background.strong.color)
            .with_width(1.0);
        let bottom_left = Point::new(area.x, area.y + area.height);
        frame.stroke(&Path::line(Point::new(area.x, area.y), bottom_left), axis);
        frame.stroke(
            &Path::line(bottom_left, Point::new(area.x + area.width, area.y + area.height)),
            axis,
        );

        if self.values.is_empty() {
            frame.fill_text(Text {
                content: String::from("No data for the current filters"),
                position: Point::new(area.x + 8.0, area.center_y()),
                color: text_color,
                size: Pixels(LABEL_SIZE),
                ..Text::default()
            });
            return;
        }

        let (min, max) = value_range(&self.values);
        for (value, y) in [(max, area.y), (min, area.y + area.height)] {
            frame.fill_text(Text {
                content: format_thousands(value),
                position: Point::new(4.0, y - LABEL_SIZE / 2.0),
                color: text_color,
                size: Pixels(LABEL_SIZE),
                ..Text::default()
            });
        }

        let points = plot_points(&self.values, area);
        let stride = label_stride(points.len(), (area.width / 90.0) as usize);
        for (i, ((date, _), point)) in self.series.points().zip(&points).enumerate() {
            if i % stride == 0 {
                frame.fill_text(Text {
                    content: date.to_string(),
                    position: Point::new(point.x - 30.0, area.y + area.height + 8.0),
                    color: text_color,
                    size: Pixels(LABEL_SIZE),
                    ..Text::default()
                });
            }
        }

        let fill = Path::new(|b| {
            b.move_to(Point::new(points[0].x, area.y + area.height));
            for p in &points {
                b.line_to(*p);
            }
            b.line_to(Point::new(points[points.len() - 1].x, area.y + area.height));
            b.close();
        });
        frame.fill(&fill, Color { a: 0.2, ..line_color });

        let line = Path::new(|b| {
            b.move_to(points[0]);
            for p in &points[1..] {
                b.line_to(*p);
            }
        });
        frame.stroke(&line, Stroke::default().with_color(line_color).with_width(2.0));
        for p in &points {
            frame.fill(&Path::circle(*p, 2.5), line_color);
        }
    }

    fn draw_tooltip(&self, frame: &mut Frame, theme: &Theme, cursor: Point) {
        let area = Self::plot_area(frame.size());
        let points = plot_points(&self.values, area);
        let Some(index) = nearest_index(&points, cursor.x) else {
            return;
        };
        let Some((date, balance)) = self.series.points().nth(index) else {
            return;
        };
        let palette = theme.extended_palette();
        let point = points[index];

        frame.stroke(
            &Path::line(
                Point::new(point.x, area.y),
                Point::new(point.x, area.y + area.height),
            ),
            Stroke::default()
                .with_color(palette.background.strong.color)
                .with_width(1.0),
        );
        frame.fill(&Path::circle(point, 4.5), palette.primary.strong.color);

        let boxed = Size::new(180.0, 40.0);
        let x = (point.x + 8.0).min(frame.width() - boxed.width).max(0.0);
        let y = (point.y - boxed.height - 8.0).max(0.0);
        frame.fill_rectangle(Point::new(x, y), boxed, palette.background.weak.color);
        frame.fill_text(Text {
            content: format!("{}\nInventory balance: {}", date, format_thousands(balance)),
            position: Point::new(x + 6.0, y + 4.0),
            color: palette.background.weak.text,
            size: Pixels(LABEL_SIZE),
            ..Text::default()
        });
    }
}

impl<Message> canvas::Program<Message> for TrendChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let plot = self
            .cache
            .draw(renderer, bounds.size(), |frame| self.draw_series(frame, theme));

        match cursor.position_in(bounds) {
            Some(position) if !self.values.is_empty() => {
                let mut overlay = Frame::new(renderer, bounds.size());
                self.draw_tooltip(&mut overlay, theme, position);
                vec![plot, overlay.into_geometry()]
            }
            _ => vec![plot],
        }
    }
}
