use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::api::{FetchError, NewsApiService};
use crate::config::AppConfig;
use crate::internal::controller::{Completion, Controller, FetchRequest, ViewState};
use crate::internal::models::PageOutcome;
use crate::internal::notification::Notification;
use crate::internal::render::{ArticleCard, render};
use crate::internal::theme::{FileStore, MemoryStore, ThemeService};
use crate::utils::palette::Palette;

use ratatui::Frame;
use ratatui::widgets::ListState;

/// Input modes for the UI.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    Search,
}

/// Actions/messages sent through the app action channel.
#[derive(Debug)]
pub enum Action {
    Quit,
    NavigateUp,
    NavigateDown,
    OpenSelected,
    SubmitSearch(String),
    ClearSearch,
    LoadMore,
    Reload,
    ToggleTheme,
    PageLoaded {
        generation: u64,
        result: Result<PageOutcome, FetchError>,
    },
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub app_version: String,
    pub config: AppConfig,
    pub api_service: Arc<NewsApiService>,
    pub controller: Controller,
    /// Rendered cards for the controller's current articles.
    pub cards: Vec<ArticleCard>,
    pub list_state: ListState,
    pub theme_service: ThemeService,
    pub palette: Palette,
    pub notification: Option<Notification>,
    pub spinner_state: usize,
    pub last_spinner_update: Option<tokio::time::Instant>,
    pub input_mode: InputMode,
    pub search_input: String,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    #[tracing::instrument(skip(config))]
    pub fn new(config: AppConfig) -> Self {
        let api_service = Arc::new(NewsApiService::new(
            &config.network,
            config.logging.enable_performance_metrics,
        ));

        let theme_service = match &config.storage_path {
            Some(path) => ThemeService::new(FileStore::new(path)),
            None => match FileStore::default_location() {
                Ok(store) => ThemeService::new(store),
                Err(e) => {
                    tracing::error!("Failed to resolve storage location: {:#}", e);
                    ThemeService::new(MemoryStore::default())
                }
            },
        };

        Self::with_services(config, api_service, theme_service)
    }

    /// Build the app around an existing API client and theme service.
    pub fn with_services(
        config: AppConfig,
        api_service: Arc<NewsApiService>,
        mut theme_service: ThemeService,
    ) -> Self {
        let start = std::time::Instant::now();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let preference = theme_service.get_preference();
        let palette = Palette::resolve(
            preference,
            config.theme_file.as_deref(),
            config.logging.enable_performance_metrics,
        );
        tracing::info!(theme = %preference, "Restored theme preference");

        let controller = Controller::new(config.network.page_size);

        tracing::info!(elapsed = ?start.elapsed(), "App initialized");

        Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            api_service,
            controller,
            cards: Vec::new(),
            list_state: ListState::default(),
            theme_service,
            palette,
            notification: None,
            spinner_state: 0,
            last_spinner_update: None,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            action_tx,
            action_rx,
        }
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::info(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    fn dispatch(&self, action: Action) {
        if self.action_tx.send(action).is_err() {
            tracing::warn!("action channel closed");
        }
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        // Initial load
        self.start();

        let mut event_interval = tokio::time::interval(Duration::from_millis(16));

        loop {
            self.tick_spinner();

            if self.notification.as_ref().is_some_and(Notification::is_expired) {
                self.notification = None;
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(Duration::from_millis(0))?
                        && let Event::Key(key) = event::read()?
                        && key.kind == KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }
            }

            if !self.running {
                break;
            }
        }
        Ok(())
    }

    /// Kick off the initial headlines load.
    pub fn start(&mut self) {
        let request = self.controller.start();
        self.reset_list();
        self.spawn_fetch(request);
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let api = Arc::clone(&self.api_service);
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let result = api.load_page(&request.query).await;
            let _ = tx.send(Action::PageLoaded {
                generation: request.generation,
                result,
            });
        });
    }

    fn reset_list(&mut self) {
        self.cards = render(self.controller.articles());
        self.list_state.select(None);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.dispatch(Action::Quit);
            return;
        }

        match self.input_mode {
            InputMode::Search => self.handle_search_input(key),
            InputMode::Normal => self.handle_normal_input(key),
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.dispatch(Action::SubmitSearch(self.search_input.clone()));
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.search_input = self.active_search_term();
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => self.search_input.push(c),
            _ => {}
        }
    }

    fn handle_normal_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.dispatch(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.dispatch(Action::NavigateDown),
            KeyCode::Char('k') | KeyCode::Up => self.dispatch(Action::NavigateUp),
            KeyCode::Enter | KeyCode::Char('o') => self.dispatch(Action::OpenSelected),
            KeyCode::Char('m') => self.dispatch(Action::LoadMore),
            KeyCode::Char('r') => self.dispatch(Action::Reload),
            KeyCode::Char('t') => self.dispatch(Action::ToggleTheme),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.search_input = self.active_search_term();
            }
            KeyCode::Char('c') | KeyCode::Esc if self.controller.clear_visible() => {
                self.dispatch(Action::ClearSearch)
            }
            _ => {}
        }
    }

    fn active_search_term(&self) -> String {
        match self.controller.clear_visible() {
            true => self.controller.query().query.clone(),
            false => String::new(),
        }
    }

    #[tracing::instrument(skip(self, action))]
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NavigateUp => self.select_prev(),
            Action::NavigateDown => self.select_next(),
            Action::OpenSelected => {
                if let Some(card) = self.selected_card() {
                    let url = card.url.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::error!("Failed to open {}: {}", url, e);
                        self.notify_error("Could not open the article in a browser");
                    }
                }
            }
            Action::SubmitSearch(term) => {
                let request = self.controller.submit_search(&term);
                self.search_input = self.active_search_term();
                self.reset_list();
                self.spawn_fetch(request);
            }
            Action::ClearSearch => {
                let request = self.controller.clear_search();
                self.search_input.clear();
                self.reset_list();
                self.spawn_fetch(request);
            }
            Action::LoadMore => match self.controller.load_more() {
                Some(request) => self.spawn_fetch(request),
                None if self.controller.state() == ViewState::Loaded
                    && !self.controller.show_more() =>
                {
                    let loaded = self.controller.store().len();
                    self.notify_info(format!("All {loaded} articles loaded"));
                }
                None => {}
            },
            Action::Reload => {
                self.api_service.clear_cache();
                let request = self.controller.reload();
                self.reset_list();
                self.spawn_fetch(request);
            }
            Action::ToggleTheme => {
                let dark = !self.theme_service.current().is_dark();
                if let Err(e) = self.theme_service.toggle(dark) {
                    tracing::error!("{:#}", e);
                    self.notify_error("Could not save theme preference");
                }
                self.palette = Palette::resolve(
                    self.theme_service.current(),
                    self.config.theme_file.as_deref(),
                    self.config.logging.enable_performance_metrics,
                );
            }
            Action::PageLoaded { generation, result } => {
                self.apply_page(generation, result);
            }
        }
    }

    fn apply_page(&mut self, generation: u64, result: Result<PageOutcome, FetchError>) {
        let Completion::Applied(state) = self.controller.complete(generation, result) else {
            return;
        };

        self.cards = render(self.controller.articles());
        match state {
            ViewState::Loaded => {
                if self.list_state.selected().is_none() {
                    self.list_state.select(Some(0));
                }
            }
            ViewState::Empty => self.list_state.select(None),
            ViewState::Error => {
                if let Some(message) = self.controller.last_error().map(str::to_string) {
                    self.notify_error(message);
                }
            }
            ViewState::Idle | ViewState::Loading => {}
        }
    }

    pub fn selected_card(&self) -> Option<&ArticleCard> {
        self.list_state.selected().and_then(|i| self.cards.get(i))
    }

    fn select_next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        match self.list_state.selected() {
            Some(i) if i + 1 < self.cards.len() => self.list_state.select(Some(i + 1)),
            // Scrolling past the last article pulls in the next page.
            Some(_) if self.controller.show_more() => self.dispatch(Action::LoadMore),
            Some(_) => {}
            None => self.list_state.select(Some(0)),
        }
    }

    fn select_prev(&mut self) {
        if let Some(i) = self.list_state.selected() {
            self.list_state.select(Some(i.saturating_sub(1)));
        }
    }

    fn tick_spinner(&mut self) {
        let now = tokio::time::Instant::now();
        match self.last_spinner_update {
            Some(last) if now.duration_since(last) < Duration::from_millis(100) => {}
            _ => {
                self.spinner_state = self.spinner_state.wrapping_add(1);
                self.last_spinner_update = Some(now);
            }
        }
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER_FRAMES[self.spinner_state % SPINNER_FRAMES.len()]
    }

    fn ui(&mut self, f: &mut Frame) {
        super::view::draw(self, f);
    }
}
