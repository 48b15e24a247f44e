//! Theme data model: built-in palettes resolved from config.

use ratatui::style::Color;

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree pane
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,

    // Content pane
    pub content_fg: Color,
    pub scrollbar_thumb_fg: Color,
    pub scrollbar_track_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Semantic
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4

        content_fg: Color::Rgb(205, 214, 244),
        scrollbar_thumb_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)
        scrollbar_track_fg: Color::Rgb(69, 71, 90),    // #45475a

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        dim_fg: Color::Rgb(108, 112, 134), // #6c7086 (overlay0)
    }
}

/// Light theme — complementary light palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),             // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218),  // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),

        content_fg: Color::Rgb(76, 79, 105),
        scrollbar_thumb_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        scrollbar_track_fg: Color::Rgb(204, 208, 218),

        status_bg: Color::Rgb(230, 233, 239), // #e6e9ef (mantle)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190),           // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        dim_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)
    }
}

/// Resolve a theme from the configured scheme name.
pub fn resolve_theme(scheme: &str) -> ThemeColors {
    match scheme {
        "light" => light_theme(),
        _ => dark_theme(),
    }
}
