use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
    Frame,
};

use super::styles;
use super::utils::word_wrap;
use crate::app::App;
use crate::tree::CheckState;

/// Render the detail panel for the focused node (right side)
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(Span::styled(" DETAIL ", Style::default().fg(styles::MUTED)))
        .style(styles::default_style())
        .padding(Padding::new(1, 1, 0, 0));
    let width = block.inner(area).width as usize;

    let Some(detail) = &app.detail else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Nothing focused",
            Style::default().fg(styles::DIM),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    for part in word_wrap(&detail.title, width) {
        lines.push(Line::from(Span::styled(
            part,
            Style::default().fg(styles::BRIGHT).add_modifier(Modifier::BOLD),
        )));
    }

    let state = match detail.state {
        CheckState::Checked => "all selected",
        CheckState::Indeterminate => "partly selected",
        CheckState::Unchecked => "none selected",
    };
    lines.push(Line::from(vec![
        Span::styled(styles::check_glyph(detail.state), styles::check_style(detail.state)),
        Span::styled(
            format!("{}/{} epochs · {}", detail.selected, detail.total, state),
            Style::default().fg(styles::TEXT),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        format!(
            "{} · {} {}",
            detail.kind,
            detail.leaves,
            if detail.leaves == 1 { "leaf" } else { "leaves" }
        ),
        Style::default().fg(styles::DIM),
    )));
    if detail.focused > 1 {
        lines.push(Line::from(Span::styled(
            format!("+{} more focused", detail.focused - 1),
            Style::default().fg(styles::DIM),
        )));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        format!("{} (selected epochs)", detail.analysis),
        styles::key_hint_style(),
    )));

    let key_width = detail
        .rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    let value_width = width.saturating_sub(key_width + 2).max(8);
    for (key, value) in &detail.rows {
        for (i, part) in word_wrap(value, value_width).into_iter().enumerate() {
            let label = if i == 0 { key.as_str() } else { "" };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}  ", label, width = key_width),
                    Style::default().fg(styles::MUTED),
                ),
                Span::styled(part, Style::default().fg(styles::TEXT)),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}
