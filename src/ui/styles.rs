use ratatui::style::{Color, Modifier, Style};

use crate::tree::CheckState;

// ── Background colors ──
pub const BG: Color = Color::Rgb(12, 12, 12);
pub const SURFACE: Color = Color::Rgb(20, 20, 20);
pub const PANEL: Color = Color::Rgb(26, 26, 26);
pub const BORDER: Color = Color::Rgb(42, 42, 42);

// ── Text colors ──
pub const TEXT: Color = Color::Rgb(200, 200, 200);
pub const DIM: Color = Color::Rgb(102, 102, 102);
pub const MUTED: Color = Color::Rgb(136, 136, 136);
pub const BRIGHT: Color = Color::Rgb(232, 232, 232);

// ── Accent colors ──
pub const BLUE: Color = Color::Rgb(96, 165, 250);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const GREEN: Color = Color::Rgb(74, 222, 128);
pub const YELLOW: Color = Color::Rgb(250, 204, 21);

// ── Composed styles ──

pub fn default_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn surface_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn panel_style() -> Style {
    Style::default().bg(PANEL)
}

pub fn selected_style() -> Style {
    Style::default().fg(BLUE).bg(Color::Rgb(26, 42, 58))
}

/// Rows in the focus set that are not under the cursor
pub fn focused_style() -> Style {
    Style::default().fg(BRIGHT).bg(Color::Rgb(30, 34, 40))
}

pub fn key_hint_style() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
}

pub fn title_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn check_style(state: CheckState) -> Style {
    match state {
        CheckState::Checked => Style::default().fg(GREEN),
        CheckState::Indeterminate => Style::default().fg(YELLOW),
        CheckState::Unchecked => Style::default().fg(DIM),
    }
}

pub fn check_glyph(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x] ",
        CheckState::Indeterminate => "[-] ",
        CheckState::Unchecked => "[ ] ",
    }
}
