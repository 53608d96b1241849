//! UI Rendering
//!
//! Main UI layout and rendering logic for the TUI.

use crate::form::FormField;
use crate::search::LoadState;
use crate::tui::app::{App, Overlay, Route};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // View
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    match app.route {
        Route::Search => render_search(frame, chunks[1], app),
        Route::Results => render_results_view(frame, chunks[1], app),
    }
    render_status_bar(frame, chunks[2], app);

    // Render modal overlays
    match &app.overlay {
        Overlay::Help => render_help(frame),
        Overlay::Filter(modal) => widgets::render_filter(frame, modal),
        Overlay::None => {}
    }
}

/// Render the header with the backend address
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title_text = vec![Line::from(vec![
        Span::raw("🩺 "),
        Span::styled("MediSia", Theme::title()),
        Span::styled(" Literature Search", Theme::text_secondary()),
        Span::raw("  "),
        Span::styled(app.config.api.base_url.clone(), Theme::text_dim()),
    ])];

    let title = Paragraph::new(title_text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .style(Style::default()),
        );

    frame.render_widget(title, area);
}

/// Render the search form
fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let fields = app.visible_fields();

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(2)); // Options
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        render_field(frame, chunks[i], app, *field);
    }
    render_options(frame, chunks[fields.len()], app);

    if let Some(error) = &app.form_error {
        let line = Line::from(vec![
            Span::styled(format!("{} ", Icons::ERROR), Theme::error()),
            Span::styled(error.to_string(), Theme::error()),
        ]);
        frame.render_widget(
            Paragraph::new(line).wrap(Wrap { trim: true }),
            chunks[fields.len() + 1],
        );
    }
}

/// Render one form input
fn render_field(frame: &mut Frame, area: Rect, app: &App, field: FormField) {
    let is_focused = app.focus == field;
    let has_error = app.form_error.as_ref().is_some_and(|e| e.field() == field);

    let border_style = if has_error {
        Theme::error()
    } else if is_focused {
        Theme::border_focused()
    } else {
        Theme::border()
    };

    let block = Block::default()
        .title(format!(" {} ", field.label()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let index = FormField::ALL.iter().position(|f| *f == field).unwrap_or(0);
    frame.render_widget(&app.inputs[index], inner);
}

/// Render the deep/advanced toggles
fn render_options(frame: &mut Frame, area: Rect, app: &App) {
    let toggle = |on: bool| if on { Icons::CHECKED } else { Icons::UNCHECKED };
    let style = |on: bool| if on { Theme::success() } else { Theme::text_dim() };

    let line = Line::from(vec![
        Span::styled(toggle(app.deep), style(app.deep)),
        Span::styled(" Deep search ", Theme::text()),
        Span::styled("[Ctrl+D]", Theme::shortcut_key()),
        Span::raw("   "),
        Span::styled(toggle(app.advanced), style(app.advanced)),
        Span::styled(" Advanced ", Theme::text()),
        Span::styled("[Ctrl+A]", Theme::shortcut_key()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the results page
fn render_results_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Query and status
            Constraint::Min(5),    // Cards
        ])
        .split(area);

    let query = app.session.query();
    widgets::render_status(frame, chunks[0], &app.load_state, &query, app.tick);

    match &app.load_state {
        LoadState::Ready(set) => widgets::render_results(
            frame,
            chunks[1],
            &set.results.papers,
            &app.pager,
            app.selected,
        ),
        LoadState::Failed(error) => {
            let lines = vec![
                Line::from(Span::styled("The search could not be completed.", Theme::error())),
                Line::from(Span::styled(error.clone(), Theme::text_secondary())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("[Enter]", Theme::shortcut_key()),
                    Span::styled(" Retry ", Theme::shortcut_desc()),
                    Span::styled("[Esc]", Theme::shortcut_key()),
                    Span::styled(" New search", Theme::shortcut_desc()),
                ]),
            ];
            let block = Block::default()
                .title(" Results ")
                .borders(Borders::ALL)
                .border_style(Theme::border());
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
                chunks[1],
            );
        }
        LoadState::Idle | LoadState::Loading => {
            let line = Line::from(vec![
                Span::styled(format!("{} ", Icons::spinner(app.tick)), Theme::active()),
                Span::styled("Loading results...", Theme::text_secondary()),
            ]);
            let block = Block::default()
                .title(" Results ")
                .borders(Borders::ALL)
                .border_style(Theme::border());
            frame.render_widget(Paragraph::new(line).block(block), chunks[1]);
        }
    }
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = match (&app.route, &app.load_state) {
        (Route::Search, _) => Span::styled("Ready", Theme::text_secondary()),
        (Route::Results, LoadState::Idle) => Span::styled("Ready", Theme::text_secondary()),
        (Route::Results, LoadState::Loading) => Span::styled("Searching...", Theme::active()),
        (Route::Results, LoadState::Ready(_)) => Span::styled(app.pager.label(), Theme::complete()),
        (Route::Results, LoadState::Failed(e)) => Span::styled(format!("Error: {}", e), Theme::error()),
    };

    let keys: &[(&str, &str)] = match app.route {
        Route::Search => &[
            (" [Enter]", " Search "),
            ("[Tab]", " Next field "),
            ("[Ctrl+Q]", " Quit "),
            ("[F1]", " Help"),
        ],
        Route::Results => &[
            (" [n/p]", " Page "),
            ("[j/t/y]", " Filter "),
            ("[Esc]", " New search "),
            ("[F1]", " Help"),
        ],
    };
    let shortcuts = keys.iter().flat_map(|(key, desc)| {
        [
            Span::styled(*key, Theme::shortcut_key()),
            Span::styled(*desc, Theme::shortcut_desc()),
        ]
    });

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    let paragraph = Paragraph::new(line);
    frame.render_widget(paragraph, area);
}

/// Render the help modal
fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let entries = [
        ("Enter        ", "Search / Apply filter / Retry"),
        ("Tab          ", "Next form field"),
        ("Ctrl+D       ", "Toggle deep search"),
        ("Ctrl+A       ", "Show advanced fields"),
        ("n/p  ←/→     ", "Next / previous page"),
        ("↑/↓          ", "Select paper / option"),
        ("j  t  y      ", "Filter by journal, topic, year"),
        ("Space        ", "Toggle filter option"),
        ("Esc          ", "Close modal / New search"),
        ("Ctrl+Q       ", "Quit application"),
        ("F1           ", "Show this help"),
    ];

    let mut help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
    ];
    help_lines.extend(entries.iter().map(|(key, desc)| {
        Line::from(vec![
            Span::styled(*key, Theme::shortcut_key()),
            Span::styled(*desc, Theme::text()),
        ])
    }));
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Theme::text_dim(),
    )));

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{SearchQuery, SearchResults};
    use crate::search::{SearchBackend, SearchError, SearchSession};
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;
    use std::time::Duration;

    struct EmptyBackend;

    #[async_trait]
    impl SearchBackend for EmptyBackend {
        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
            Ok(SearchResults::default())
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_render_search_and_help() {
        let session = SearchSession::new(Arc::new(EmptyBackend), Duration::ZERO);
        let mut app = App::new(Config::default(), session);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("MediSia"));
        assert!(text.contains("Deep search"));

        app.overlay = Overlay::Help;
        terminal.draw(|frame| render(frame, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_centered_rect_fits() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert!(inner.x >= 20 && inner.y >= 15);
    }
}
