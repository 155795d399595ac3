use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use super::pool::{Expander, RowWidget, CHECKBOX_WIDTH, EXPANDER_WIDTH};
use super::styles;
use super::utils::truncate;
use crate::app::App;

/// Render the epoch tree panel (left side).
///
/// Only pool rows inside the viewport are painted. The inner area is
/// recorded on the app so mouse clicks can be mapped back to rows.
pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let store = app.model.store();
    let title = format!(" EPOCHS ({}/{}) ", store.selected_len(), store.len());

    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(styles::BORDER))
        .style(Style::default().bg(styles::SURFACE));

    let inner = block.inner(area);
    app.tree_area = inner;

    let viewport_height = inner.height as usize;
    let scroll = app.renderer.scroll_for(viewport_height);
    let cursor_row = app.renderer.cursor_row();
    let show_counts = app.config.display.show_counts;
    let width = inner.width as usize;

    let items: Vec<ListItem> = app
        .renderer
        .rows()
        .iter()
        .enumerate()
        .skip(scroll)
        .take(viewport_height)
        .map(|(i, row)| row_item(row, cursor_row == Some(i), show_counts, width))
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

/// One line laid out as: indent, expander, check box, label, counts.
/// Column widths must agree with `RowWidget::part_at`.
fn row_item(row: &RowWidget, is_cursor: bool, show_counts: bool, width: usize) -> ListItem<'static> {
    let expander = match row.expander {
        Expander::None => "  ",
        Expander::Collapsed => "▸ ",
        Expander::Expanded => "▾ ",
    };
    let counts = if show_counts {
        format!(" {}/{} ", row.selected, row.total)
    } else {
        String::new()
    };

    let fixed = row.indent as usize
        + EXPANDER_WIDTH as usize
        + CHECKBOX_WIDTH as usize
        + counts.chars().count();
    let label_width = width.saturating_sub(fixed).max(1);
    let label = truncate(&row.label, label_width);

    let line_style = if is_cursor {
        styles::selected_style()
    } else if row.focused {
        styles::focused_style()
    } else {
        styles::surface_style()
    };

    let spans = vec![
        Span::raw(" ".repeat(row.indent as usize)),
        Span::styled(expander, Style::default().fg(styles::MUTED)),
        Span::styled(styles::check_glyph(row.check), styles::check_style(row.check)),
        Span::styled(
            format!("{:<width$}", label, width = label_width),
            if row.unknown {
                Style::default().fg(styles::DIM).add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            },
        ),
        Span::styled(counts, Style::default().fg(styles::DIM)),
    ];

    ListItem::new(Line::from(spans)).style(line_style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtConfig;
    use crate::tree::model::tests::make_model;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn screen(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render(f, area, app);
            })
            .unwrap();
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    fn make_app() -> App {
        App::new(
            make_model("type,protocol"),
            EtConfig::default(),
            PathBuf::from("run.json"),
            PathBuf::from("run.json.selection.json"),
        )
    }

    #[test]
    fn paints_rows_with_affordances_and_counts() {
        let mut app = make_app();
        app.move_cursor(2);
        app.toggle_expanded();
        app.move_cursor(1);
        app.toggle_checked();

        let lines = screen(&mut app, 30, 8);
        assert!(lines[0].starts_with(" EPOCHS (4/6)"));
        assert!(lines[1].starts_with("▾ [-] All epochs"));
        assert!(lines[3].starts_with("  ▾ [-] B"));
        assert!(lines[4].starts_with("      [ ] X"));
        assert!(lines[4].contains("0/2"));
        assert_eq!(app.tree_area, Rect::new(0, 1, 29, 7));
    }

    #[test]
    fn viewport_follows_cursor() {
        let mut app = make_app();
        app.move_cursor(1);
        app.toggle_expanded(); // A: root, A, X, Y, B, C
        app.cursor_last();
        let lines = screen(&mut app, 30, 4);
        // 3 rows fit; the last one is the cursor
        assert!(lines[3].starts_with("  ▸ [x] C"));
        assert_eq!(app.renderer.scroll(), app.renderer.rows().len() - 3);
    }
}
