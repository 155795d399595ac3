mod detail;
pub mod pool;
mod status_bar;
mod styles;
mod tree_view;
mod utils;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // top bar
            Constraint::Min(1),    // main content
            Constraint::Length(1), // bottom bar
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);

    if outer[1].width < 80 {
        // Narrow terminal: tree only
        tree_view::render(f, outer[1], app);
    } else {
        let main_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(3), // tree
                Constraint::Fill(2), // detail panel
            ])
            .split(outer[1]);

        tree_view::render(f, main_area[0], app);
        detail::render(f, main_area[1], app);
    }

    status_bar::render_bottom_bar(f, outer[2], app);

    if let Some(ref msg) = app.message {
        status_bar::render_notification(f, f.area(), msg);
    }
}
