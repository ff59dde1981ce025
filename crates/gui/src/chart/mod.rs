use iced::{Point, Rectangle};

pub mod widget;

pub const TITLE: &str = "Inventory balance trend";

/// Maps balances onto `area`, left to right in series order. A flat series
/// sits on the vertical centre line; a single point sits in the middle.
pub fn plot_points(values: &[f64], area: Rectangle) -> Vec<Point> {
    let (min, max) = value_range(values);
    let span = max - min;
    let step = if values.len() > 1 {
        area.width / (values.len() - 1) as f32
    } else {
        0.0
    };
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if values.len() > 1 {
                area.x + step * i as f32
            } else {
                area.center_x()
            };
            let ratio = if span > 0.0 { (v - min) / span } else { 0.5 };
            let y = area.y + area.height * (1.0 - ratio as f32);
            Point::new(x, y)
        })
        .collect()
}

pub fn value_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((*v, *v)),
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
        })
        .unwrap_or((0.0, 0.0))
}

/// Index of the point whose x is closest to `x`.
pub fn nearest_index(points: &[Point], x: f32) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x - x).abs().total_cmp(&(b.x - x).abs()))
        .map(|(i, _)| i)
}

/// Every how many points an x-axis label fits.
pub fn label_stride(points: usize, max_labels: usize) -> usize {
    if max_labels == 0 {
        return points.max(1);
    }
    points.div_ceil(max_labels).max(1)
}

/// `1234567.5` → `1,234,567.5`.
pub fn format_thousands(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let fraction = format!("{:.2}", abs - abs.trunc());
    let fraction = fraction
        .trim_start_matches('0')
        .trim_end_matches('0')
        .trim_end_matches('.');

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}{fraction}")
}
