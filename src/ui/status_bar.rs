use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, InputMode};

/// Compute the display width of a list of spans
fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// Render the top status bar:
///   dataset · key › key                 selected/total · rows bound/capacity (+growth)
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let keys = app
        .model
        .keys()
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(" › ");
    let keys = if keys.is_empty() { "(no grouping)".to_string() } else { keys };

    let mut left: Vec<Span> = vec![
        Span::styled(
            format!(" {}", app.dataset_name()),
            Style::default().fg(styles::CYAN).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" · ", Style::default().fg(styles::BORDER)),
        Span::styled(keys, Style::default().fg(styles::GREEN)),
    ];
    if app.dirty {
        left.push(Span::styled(" ●", Style::default().fg(styles::YELLOW)));
    }

    let store = app.model.store();
    let pool = app.renderer.pool();
    let right: Vec<Span> = vec![
        Span::styled(
            format!("{}/{} selected", store.selected_len(), store.len()),
            Style::default().fg(styles::TEXT),
        ),
        Span::styled(" · ", Style::default().fg(styles::BORDER)),
        Span::styled(
            pool_label(pool.bound(), pool.capacity(), pool.growth_events()),
            Style::default().fg(styles::DIM),
        ),
    ];

    let gap = (area.width as usize).saturating_sub(spans_width(&left) + spans_width(&right));
    let mut spans = left;
    if gap > 0 {
        spans.push(Span::raw(" ".repeat(gap)));
        spans.extend(right);
    }
    f.render_widget(Paragraph::new(Line::from(spans)).style(styles::panel_style()), area);
}

/// `bound/capacity`, plus growth count once the pool has had to grow
fn pool_label(bound: usize, capacity: usize, growth_events: u64) -> String {
    if growth_events == 0 {
        format!("rows {}/{} ", bound, capacity)
    } else {
        format!("rows {}/{} (+{}) ", bound, capacity, growth_events)
    }
}

struct Hint {
    key: &'static str,
    label: &'static str,
}

impl Hint {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }

    fn width(&self) -> usize {
        self.key.chars().count() + self.label.chars().count()
    }
}

const NORMAL_HINTS: &[Hint] = &[
    Hint::new("j/k", " move "),
    Hint::new("h/l", " fold "),
    Hint::new("␣", " check "),
    Hint::new("Enter", " expand "),
    Hint::new("a/n", " all/none "),
    Hint::new("g", " group "),
    Hint::new("s", " save "),
    Hint::new("q", " quit "),
];

/// Leading hints that fit in `width` columns (one leading space)
fn fit_hints(hints: &[Hint], width: usize) -> usize {
    let mut used = 1;
    hints
        .iter()
        .take_while(|h| {
            used += h.width();
            used <= width
        })
        .count()
}

/// Render the bottom bar: key hints, or the grouping input line
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let spans = match app.input_mode {
        InputMode::Grouping => vec![
            Span::styled(
                " group by ",
                Style::default().fg(styles::BG).bg(styles::BLUE).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}", app.grouping_input), Style::default().fg(styles::TEXT)),
            Span::styled("█", Style::default().fg(styles::BLUE)),
            Span::raw("  "),
            Span::styled("Enter", styles::key_hint_style()),
            Span::styled(" apply  ", Style::default().fg(styles::DIM)),
            Span::styled("↑", styles::key_hint_style()),
            Span::styled(" history  ", Style::default().fg(styles::DIM)),
            Span::styled("Esc", styles::key_hint_style()),
            Span::styled(" cancel", Style::default().fg(styles::DIM)),
        ],
        InputMode::Normal => {
            let count = fit_hints(NORMAL_HINTS, area.width as usize);
            let mut spans = vec![Span::raw(" ")];
            for hint in &NORMAL_HINTS[..count] {
                spans.push(Span::styled(hint.key, styles::key_hint_style()));
                spans.push(Span::styled(hint.label, Style::default().fg(styles::DIM)));
            }
            spans
        }
    };
    f.render_widget(Paragraph::new(Line::from(spans)).style(styles::panel_style()), area);
}

/// Transient notification in the top-right corner
pub fn render_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = message.chars().count() as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 2;
    if notif_y >= area.bottom() {
        return;
    }

    let notif_area = Rect {
        x: notif_x,
        y: notif_y,
        width: notif_width.min(area.width),
        height: 1,
    };

    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(styles::GREEN)),
        Span::styled(message, Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(Style::default().bg(styles::PANEL).fg(styles::TEXT));

    f.render_widget(notif, notif_area);
}
