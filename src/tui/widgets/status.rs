//! Status Widget
//!
//! Shows the active query and where its search stands.

use crate::models::SearchQuery;
use crate::search::LoadState;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the query summary and load indicator
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    state: &LoadState,
    query: &SearchQuery,
    tick: u64,
) {
    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines = Vec::new();

    // Query line
    let term = query.query.as_deref().unwrap_or("(filters only)");
    let mut query_spans = vec![
        Span::styled("Query: ", Theme::text_secondary()),
        Span::styled(truncate_string(term, width.saturating_sub(20)), Theme::text()),
    ];
    if query.deep {
        query_spans.push(Span::raw(" "));
        query_spans.push(Span::styled(" Deep ", Theme::badge_primary()));
    }
    lines.push(Line::from(query_spans));

    let filters = filter_summary(query);
    if !filters.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("  Filters: ", Theme::text_dim()),
            Span::styled(
                truncate_string(&filters, width.saturating_sub(11)),
                Theme::text_secondary(),
            ),
        ]));
    }

    lines.push(Line::from(state_spans(state, tick)));

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Icon and label for a load state
pub fn state_spans(state: &LoadState, tick: u64) -> Vec<Span<'static>> {
    match state {
        LoadState::Idle => vec![
            Span::styled(format!("{} ", Icons::PENDING), Theme::pending()),
            Span::styled("Waiting for a search", Theme::text_dim()),
        ],
        LoadState::Loading => vec![
            Span::styled(format!("{} ", Icons::spinner(tick)), Theme::active()),
            Span::styled("Searching...", Theme::active()),
        ],
        LoadState::Ready(set) => vec![
            Span::styled(format!("{} ", Icons::COMPLETE), Theme::complete()),
            Span::styled(
                format!(
                    "{} results {} {}",
                    set.results.papers.len(),
                    Icons::DOT,
                    set.received_at.format("%H:%M:%S")
                ),
                Theme::complete(),
            ),
        ],
        LoadState::Failed(error) => vec![
            Span::styled(format!("{} ", Icons::ERROR), Theme::error()),
            Span::styled(format!("Search failed: {}", error), Theme::error()),
        ],
    }
}

fn filter_summary(query: &SearchQuery) -> String {
    let mut parts = Vec::new();
    if !query.categories.is_empty() {
        parts.push(format!("topics: {}", query.categories.join(", ")));
    }
    if !query.journals.is_empty() {
        parts.push(format!("journals: {}", query.journals.join(", ")));
    }
    if let Some(years) = query.pubyears {
        parts.push(format!("years: {}", years));
    }
    parts.join(" | ")
}

/// Truncate a string to fit within a given width
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_width).collect()
    }
}
