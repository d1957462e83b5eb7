//! Terminal colors. Map colors come from the shared palette; these are
//! the chrome around it.

use ratatui::style::{Color, Modifier, Style};

use linkwatch_core::render::palette::{self, Rgb};
use linkwatch_core::Status;

pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164);
pub const ACCENT: Color = Color::Rgb(128, 255, 234);
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207);
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99);

pub fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub fn status_color(status: Option<Status>) -> Color {
    color(palette::status_color(status))
}

pub fn utilization_color(utilization: Option<f64>) -> Color {
    color(palette::utilization_color(utilization))
}

pub fn title_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border_style() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn dim_style() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn key_hint_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}
