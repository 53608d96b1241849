//! Filter Widget
//!
//! Checklist modal for narrowing results by journal, topic or year.

use crate::tui::filter::FilterModal;
use crate::tui::theme::{Icons, Theme};
use crate::tui::ui::centered_rect;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Render a filter modal
pub fn render_filter(frame: &mut Frame, modal: &FilterModal) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(modal.kind.title())
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Instructions
            Constraint::Min(3),    // Options
            Constraint::Length(1), // Footer
        ])
        .split(inner);

    render_instructions(frame, chunks[0]);
    render_options(frame, chunks[1], modal);
    render_footer(frame, chunks[2], modal);
}

fn render_instructions(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("[↑/↓]", Theme::shortcut_key()),
        Span::styled(" Move ", Theme::shortcut_desc()),
        Span::styled("[Space]", Theme::shortcut_key()),
        Span::styled(" Toggle ", Theme::shortcut_desc()),
        Span::styled("[Enter]", Theme::shortcut_key()),
        Span::styled(" Apply ", Theme::shortcut_desc()),
        Span::styled("[Esc]", Theme::shortcut_key()),
        Span::styled(" Cancel", Theme::shortcut_desc()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_options(frame: &mut Frame, area: Rect, modal: &FilterModal) {
    if modal.options.is_empty() {
        let line = Line::from(Span::styled(
            "Nothing to filter on in these results",
            Theme::text_dim(),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    // Keep the cursor row on screen
    let height = area.height.max(1) as usize;
    let first = modal.cursor.saturating_sub(height - 1);

    let lines: Vec<Line> = modal
        .options
        .iter()
        .enumerate()
        .skip(first)
        .take(height)
        .map(|(i, option)| {
            let is_cursor = i == modal.cursor;
            let prefix = if is_cursor { Icons::SELECTED } else { " " };
            let check = if option.selected {
                Span::styled(Icons::CHECKED, Theme::success())
            } else {
                Span::styled(Icons::UNCHECKED, Theme::text_dim())
            };
            let name_style = if is_cursor {
                Theme::selected()
            } else {
                Theme::text()
            };

            Line::from(vec![
                Span::styled(format!("{} ", prefix), name_style),
                check,
                Span::raw(" "),
                Span::styled(option.value.clone(), name_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame, area: Rect, modal: &FilterModal) {
    let count = modal.options.iter().filter(|o| o.selected).count();
    let text = match count {
        0 => "No filter selected".to_string(),
        1 => "1 selected".to_string(),
        n => format!("{} selected", n),
    };

    let line = Line::from(Span::styled(text, Theme::text_secondary()));
    frame.render_widget(Paragraph::new(line), area);
}
