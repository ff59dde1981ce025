use iced::widget::svg;

const SVG_UPLOAD: &[u8] = include_bytes!("../assets/icons/upload.svg");
const SVG_SPREADSHEET: &[u8] = include_bytes!("../assets/icons/spreadsheet.svg");

pub fn upload() -> svg::Handle {
    svg::Handle::from_memory(SVG_UPLOAD)
}

pub fn spreadsheet() -> svg::Handle {
    svg::Handle::from_memory(SVG_SPREADSHEET)
}
