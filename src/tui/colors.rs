//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Used for high priority
pub const DARK_RED: Color = Color::Rgb(180, 40, 40);
/// Used for medium priority
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for low priority
pub const DARK_GREEN: Color = Color::Rgb(0, 140, 60);
/// Header and status bar accent
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => DARK_RED,
        Priority::Medium => GOLD,
        Priority::Low => DARK_GREEN,
    }
}
