//! Application State
//!
//! Contains the main application state and logic for the TUI.

use crate::config::Config;
use crate::form::{FormField, SearchForm, ValidationError};
use crate::search::{LoadState, Pager, SearchSession};
use crate::tui::event::AppAction;
use crate::tui::filter::{FacetKind, FilterModal};
use crate::tui::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

/// Logical location of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Search,
    Results,
}

impl Route {
    /// Resolve a path; unknown paths fall back to the search form
    pub fn parse(path: &str) -> Self {
        match path.trim().trim_matches('/') {
            "results" => Route::Results,
            _ => Route::Search,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Search => "/search",
            Route::Results => "/results",
        }
    }
}

/// Modal shown on top of the current view
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Overlay {
    #[default]
    None,
    Help,
    Filter(FilterModal),
}

/// Main application state
pub struct App {
    // Configuration
    pub config: Config,
    pub session: SearchSession,

    // UI State
    pub route: Route,
    pub overlay: Overlay,
    pub should_quit: bool,
    pub tick: u64,

    // Search form
    pub inputs: Vec<TextArea<'static>>,
    pub focus: FormField,
    pub deep: bool,
    pub advanced: bool,
    pub form_error: Option<ValidationError>,

    // Results
    pub load_state: LoadState,
    pub pager: Pager,
    pub selected: usize,

    state_rx: watch::Receiver<LoadState>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, session: SearchSession) -> Self {
        let inputs = FormField::ALL.iter().map(|f| new_input(*f)).collect();
        let state_rx = session.watch_state();
        let load_state = session.state();
        let pager = Pager::new(0, config.ui.page_size);

        Self {
            config,
            session,
            route: Route::Search,
            overlay: Overlay::None,
            should_quit: false,
            tick: 0,
            inputs,
            focus: FormField::Query,
            deep: false,
            advanced: false,
            form_error: None,
            load_state,
            pager,
            selected: 0,
            state_rx,
        }
    }

    /// Switch views. The results view needs a submitted search; without one
    /// the user is sent back to the search form.
    pub fn navigate(&mut self, route: Route) {
        let target = match route {
            Route::Results if !self.session.has_submitted() => {
                warn!("No search submitted, redirecting to {}", Route::Search.path());
                Route::Search
            }
            other => other,
        };

        if target == Route::Search && self.route != Route::Search {
            self.session.reset();
        }

        debug!(route = target.path(), "Navigating");
        self.route = target;
        self.overlay = Overlay::None;
    }

    /// Wait for the next pipeline update and apply it. Returns false once
    /// the pipeline is gone.
    pub async fn state_changed(&mut self) -> bool {
        if self.state_rx.changed().await.is_err() {
            return false;
        }
        let state = self.state_rx.borrow_and_update().clone();
        self.handle_state(state);
        true
    }

    /// Pick up the latest pipeline state, if it changed
    pub fn poll_events(&mut self) {
        if !self.state_rx.has_changed().unwrap_or(false) {
            return;
        }
        let state = self.state_rx.borrow_and_update().clone();
        self.handle_state(state);
    }

    fn handle_state(&mut self, state: LoadState) {
        match &state {
            LoadState::Ready(set) => {
                info!(count = set.results.papers.len(), "Results received");
                self.pager = Pager::new(set.results.papers.len(), self.config.ui.page_size);
                self.selected = 0;
            }
            LoadState::Failed(error) => {
                warn!(error = %error, "Search failed");
            }
            LoadState::Idle | LoadState::Loading => {}
        }
        self.load_state = state;
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Quit | AppAction::ForceQuit => {
                self.should_quit = true;
            }
            AppAction::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            AppAction::ToggleHelp => {
                self.overlay = match self.overlay {
                    Overlay::Help => Overlay::None,
                    _ => Overlay::Help,
                };
            }
            action => match self.overlay {
                Overlay::Help => self.overlay = Overlay::None,
                Overlay::Filter(_) => self.handle_filter_action(action),
                Overlay::None => match self.route {
                    Route::Search => self.handle_search_action(action),
                    Route::Results => self.handle_results_action(action),
                },
            },
        }
    }

    fn handle_search_action(&mut self, action: AppAction) {
        match action {
            AppAction::Submit => self.submit_form(),
            AppAction::NextField | AppAction::Down => self.cycle_focus(true),
            AppAction::PrevField | AppAction::Up => self.cycle_focus(false),
            AppAction::ToggleDeep => self.deep = !self.deep,
            AppAction::ToggleAdvanced => {
                self.advanced = !self.advanced;
                if !self.advanced {
                    self.focus = FormField::Query;
                }
            }
            AppAction::Escape => self.form_error = None,
            AppAction::Input(key) => {
                let index = self.focus_index();
                let edited = self.inputs[index].input(key);
                if edited && self.form_error.as_ref().is_some_and(|e| e.field() == self.focus) {
                    self.form_error = None;
                }
            }
            _ => {}
        }
    }

    fn handle_results_action(&mut self, action: AppAction) {
        match action {
            AppAction::Escape => self.navigate(Route::Search),
            AppAction::Up => self.selected = self.selected.saturating_sub(1),
            AppAction::Down => {
                let on_page = self.current_page_len();
                if self.selected + 1 < on_page {
                    self.selected += 1;
                }
            }
            AppAction::NextPage => self.change_page(true),
            AppAction::PrevPage => self.change_page(false),
            AppAction::Submit => {
                // Retry after a failure
                if matches!(self.load_state, LoadState::Failed(_)) {
                    self.session.submit(Default::default());
                }
            }
            AppAction::Input(key) => self.handle_results_key(key),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return;
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('p') => self.change_page(false),
            KeyCode::Right | KeyCode::Char('n') => self.change_page(true),
            KeyCode::Char('j') => self.open_filter(FacetKind::Journal),
            KeyCode::Char('t') => self.open_filter(FacetKind::Topic),
            KeyCode::Char('y') => self.open_filter(FacetKind::Pubyear),
            KeyCode::Char('s') => self.navigate(Route::Search),
            _ => {}
        }
    }

    fn handle_filter_action(&mut self, action: AppAction) {
        let Overlay::Filter(modal) = &mut self.overlay else {
            return;
        };

        match action {
            AppAction::Up => modal.move_up(),
            AppAction::Down => modal.move_down(),
            AppAction::Input(key) if key.code == KeyCode::Char(' ') => modal.toggle(),
            AppAction::Submit => {
                let patch = modal.to_patch();
                info!(kind = ?modal.kind, "Applying filter");
                self.overlay = Overlay::None;
                self.session.submit(patch);
            }
            AppAction::Escape => {
                // Selections only live in the modal, so closing is cancelling
                self.overlay = Overlay::None;
            }
            _ => {}
        }
    }

    /// Open a filter checklist over the results view
    pub fn open_filter(&mut self, kind: FacetKind) {
        let modal = FilterModal::open(kind, &self.session.facets(), &self.session.query());
        self.overlay = Overlay::Filter(modal);
    }

    /// Validate the form and, if it is valid, start a new search
    pub fn submit_form(&mut self) {
        let form = self.form();
        let extra = self.session.facets().categories;

        match form.validate(&extra) {
            Ok(query) => {
                self.form_error = None;
                self.session.submit_query(query);
                self.pager = Pager::new(0, self.config.ui.page_size);
                self.navigate(Route::Results);
            }
            Err(e) => {
                debug!(error = %e, "Search form rejected");
                self.focus = e.field();
                if e.field().is_advanced() {
                    self.advanced = true;
                }
                self.form_error = Some(e);
            }
        }
    }

    /// Current contents of the search form
    pub fn form(&self) -> SearchForm {
        let text = |field: FormField| {
            FormField::ALL
                .iter()
                .position(|f| *f == field)
                .map(|i| self.inputs[i].lines().join(" "))
                .unwrap_or_default()
        };

        SearchForm {
            query: text(FormField::Query),
            categories: text(FormField::Categories),
            journals: text(FormField::Journals),
            pubyear: text(FormField::Pubyear),
            deep: self.deep,
            advanced: self.advanced,
        }
    }

    pub fn focus_index(&self) -> usize {
        FormField::ALL
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0)
    }

    /// Fields currently on screen
    pub fn visible_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .iter()
            .copied()
            .filter(|f| self.advanced || !f.is_advanced())
            .collect()
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.visible_fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn change_page(&mut self, forward: bool) {
        let moved = if forward { self.pager.next() } else { self.pager.prev() };
        if moved {
            self.selected = 0;
        }
    }

    fn current_page_len(&self) -> usize {
        self.load_state
            .result_set()
            .map(|set| self.pager.current(&set.results.papers).len())
            .unwrap_or(0)
    }
}

fn new_input(field: FormField) -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(ratatui::style::Style::default());
    input.set_placeholder_style(Theme::placeholder());
    input.set_placeholder_text(match field {
        FormField::Query => "Search medical literature...",
        FormField::Categories => "e.g. immunology, botany",
        FormField::Journals => "e.g. Nature, The Lancet",
        FormField::Pubyear => "YYYY or YYYY-YYYY",
    });
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Facets, Paper, PaperJson, SearchQuery, SearchResults};
    use crate::search::{SearchBackend, SearchError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticBackend {
        papers: usize,
    }

    #[async_trait]
    impl SearchBackend for StaticBackend {
        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
            Ok(SearchResults {
                facets: Facets {
                    categories: vec!["medicine".to_string()],
                    journals: vec!["Nature".to_string(), "Cell".to_string()],
                    pubyears: vec![2019, 2020],
                },
                papers: (0..self.papers)
                    .map(|i| {
                        Paper::from(PaperJson {
                            title: Some(format!("Paper {}", i)),
                            ..Default::default()
                        })
                    })
                    .collect(),
            })
        }
    }

    fn app(papers: usize) -> App {
        let session = SearchSession::new(Arc::new(StaticBackend { papers }), Duration::ZERO);
        App::new(Config::default(), session)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(AppAction::Input(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )));
        }
    }

    async fn settle(app: &mut App) {
        app.session.wait_settled().await;
        app.poll_events();
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("results"), Route::Results);
        assert_eq!(Route::parse("/results/"), Route::Results);
        assert_eq!(Route::parse("/search"), Route::Search);
        assert_eq!(Route::parse("/nowhere"), Route::Search);
        assert_eq!(Route::parse(""), Route::Search);
    }

    #[tokio::test]
    async fn test_results_route_guarded_without_search() {
        let mut app = app(3);
        app.navigate(Route::Results);
        assert_eq!(app.route, Route::Search);
    }

    #[tokio::test]
    async fn test_submit_form_shows_paged_results() {
        let mut app = app(23);
        type_text(&mut app, "sepsis");
        app.handle_action(AppAction::Submit);
        assert_eq!(app.route, Route::Results);
        assert_eq!(app.session.query().query.as_deref(), Some("sepsis"));

        settle(&mut app).await;
        assert_eq!(app.pager.page_count(), 3);
        assert_eq!(app.current_page_len(), 10);

        app.handle_action(AppAction::NextPage);
        app.handle_action(AppAction::NextPage);
        assert_eq!(app.current_page_len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_year_stays_in_form() {
        let mut app = app(1);
        type_text(&mut app, "sepsis");
        app.handle_action(AppAction::ToggleAdvanced);
        app.focus = FormField::Pubyear;
        type_text(&mut app, "20x9");
        app.handle_action(AppAction::Submit);

        assert_eq!(app.route, Route::Search);
        assert!(matches!(app.form_error, Some(ValidationError::InvalidYear(_))));
        assert_eq!(app.focus, FormField::Pubyear);
        assert!(!app.session.has_submitted());
    }

    #[tokio::test]
    async fn test_filter_modal_applies_follow_up() {
        let mut app = app(5);
        type_text(&mut app, "asthma");
        app.handle_action(AppAction::Submit);
        settle(&mut app).await;

        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)));
        assert!(matches!(app.overlay, Overlay::Filter(_)));
        app.handle_action(AppAction::Down);
        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        app.handle_action(AppAction::Submit);

        assert_eq!(app.overlay, Overlay::None);
        assert_eq!(app.session.query().journals, vec!["Cell".to_string()]);

        settle(&mut app).await;
        assert!(matches!(app.load_state, LoadState::Ready(_)));
    }

    #[tokio::test]
    async fn test_escape_cancels_filter() {
        let mut app = app(5);
        type_text(&mut app, "asthma");
        app.handle_action(AppAction::Submit);
        settle(&mut app).await;

        app.open_filter(FacetKind::Topic);
        app.handle_action(AppAction::Input(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        app.handle_action(AppAction::Escape);

        assert_eq!(app.overlay, Overlay::None);
        assert!(app.session.query().categories.is_empty());
    }

    #[tokio::test]
    async fn test_back_to_search_resets_query() {
        let mut app = app(2);
        type_text(&mut app, "asthma");
        app.handle_action(AppAction::Submit);
        settle(&mut app).await;

        app.handle_action(AppAction::Escape);
        assert_eq!(app.route, Route::Search);
        assert!(!app.session.has_submitted());
        assert_eq!(app.form().query, "asthma");
    }
}
