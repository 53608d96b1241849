//! Results Widget
//!
//! Paper cards for the current page of results.

use crate::models::Paper;
use crate::search::Pager;
use crate::tui::theme::{Icons, Theme};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render one page of papers as cards
pub fn render_results(
    frame: &mut Frame,
    area: Rect,
    papers: &[Paper],
    pager: &Pager,
    selected: usize,
) {
    let block = Block::default()
        .title(" Results ")
        .title_bottom(Line::from(format!(" {} ", pager.label())).right_aligned())
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let page = pager.current(papers);
    if page.is_empty() {
        let line = Line::from(Span::styled(
            "No papers match this search. Try removing a filter.",
            Theme::text_dim(),
        ));
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    let width = inner.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_top = 0usize;

    for (i, paper) in page.iter().enumerate() {
        if i == selected {
            selected_top = lines.len();
        }
        lines.extend(paper_card(paper, pager.offset() + i + 1, i == selected, width));
        lines.push(Line::from(""));
    }

    // Scroll so the selected card starts on screen
    let height = inner.height as usize;
    let scroll = if selected_top >= height { selected_top } else { 0 };

    let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
    frame.render_widget(paragraph, inner);
}

fn paper_card(paper: &Paper, number: usize, is_selected: bool, width: usize) -> Vec<Line<'static>> {
    let indent = "    ";
    let mut lines = Vec::new();

    let marker = if is_selected { Icons::SELECTED } else { " " };
    let title_style = if is_selected {
        Theme::selected()
    } else {
        Theme::heading()
    };

    let mut title = vec![
        Span::styled(format!("{} ", marker), title_style),
        Span::styled(format!("{:>2}. ", number), Theme::text_dim()),
        Span::styled(paper.title.clone(), title_style),
    ];
    if !paper.topic.is_empty() {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            format!(" {} ", paper.topic),
            Theme::topic_tag(&paper.topic),
        ));
    }
    lines.push(Line::from(title));

    if let Some(authors) = paper.author_line() {
        for row in wrap_text(&authors, width) {
            lines.push(Line::from(vec![
                Span::raw(indent),
                Span::styled(row, Theme::text_secondary()),
            ]));
        }
    }

    let mut meta = vec![Span::raw(indent)];
    if !paper.journal.is_empty() {
        meta.push(Span::styled(paper.journal.clone(), Theme::text()));
    }
    if let Some(year) = paper.year {
        if meta.len() > 1 {
            meta.push(Span::styled(format!(" {} ", Icons::DOT), Theme::text_dim()));
        }
        meta.push(Span::styled(year.to_string(), Theme::text()));
    }
    if meta.len() > 1 {
        lines.push(Line::from(meta));
    }

    if !paper.url.is_empty() {
        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(paper.url.clone(), Theme::link()),
        ]));
    }

    for row in wrap_text(&paper.abstract_text, width) {
        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(row, Theme::text_dim()),
        ]));
    }

    lines
}

/// Break text into rows of at most `width` characters, preferring spaces.
/// Words longer than a row are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if current_len > 0 {
                rows.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            rows.push(word.into_iter().collect());
            word = rest;
        }

        if current_len > 0 && current_len + 1 + word.len() > width {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if current_len > 0 {
        rows.push(current);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_on_spaces() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text("", 10), Vec::<String>::new());
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        assert_eq!(wrap_text("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_card_shows_fallbacks() {
        let paper = Paper::from(crate::models::PaperJson::default());
        let lines = paper_card(&paper, 1, false, 60);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(text[0].contains("Untitled"));
        assert!(text.iter().any(|l| l.contains(crate::models::NO_PREVIEW)));
    }
}
