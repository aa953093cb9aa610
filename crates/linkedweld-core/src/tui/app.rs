//! Main TUI application state and logic

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::widgets::TableState;
use tracing::warn;

use crate::alerting::{budget_summary, AlertEvaluator};
use crate::dashboard;
use crate::db::Store;
use crate::error::{Error, Result};
use crate::models::{
    Alert, BudgetSummary, Candidate, DashboardStats, DocumentFilter, DocumentType, Project,
    ProjectFilter, Worker, WorkerFilter,
};

/// Active view/tab in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    /// Headline numbers
    #[default]
    Overview,
    /// Workers and their next expiry
    Workers,
    /// Projects with budget bars
    Projects,
    /// Recruitment pipeline
    Pipeline,
    /// Current alerts
    Alerts,
}

impl ActiveTab {
    /// Tab titles in display order
    pub const TITLES: [&'static str; 5] = ["Overview", "Workers", "Projects", "Pipeline", "Alerts"];

    /// Next tab, wrapping around
    pub fn next(self) -> Self {
        match self {
            Self::Overview => Self::Workers,
            Self::Workers => Self::Projects,
            Self::Projects => Self::Pipeline,
            Self::Pipeline => Self::Alerts,
            Self::Alerts => Self::Overview,
        }
    }

    /// Previous tab, wrapping around
    pub fn prev(self) -> Self {
        match self {
            Self::Overview => Self::Alerts,
            Self::Workers => Self::Overview,
            Self::Projects => Self::Workers,
            Self::Pipeline => Self::Projects,
            Self::Alerts => Self::Pipeline,
        }
    }

    /// Position in [`Self::TITLES`]
    pub fn index(self) -> usize {
        match self {
            Self::Overview => 0,
            Self::Workers => 1,
            Self::Projects => 2,
            Self::Pipeline => 3,
            Self::Alerts => 4,
        }
    }
}

/// Worker with the document expiring soonest
#[derive(Debug, Clone)]
pub struct WorkerView {
    /// Worker record
    pub worker: Worker,
    /// Document type and days until it expires
    pub next_expiry: Option<(DocumentType, i64)>,
}

/// Project with its spend
#[derive(Debug, Clone)]
pub struct ProjectView {
    /// Project record
    pub project: Project,
    /// Spend against budget
    pub budget: BudgetSummary,
}

/// Main TUI application state
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Active tab
    pub active_tab: ActiveTab,
    /// Headline numbers
    pub stats: Option<DashboardStats>,
    /// Workers
    pub workers: Vec<WorkerView>,
    /// Projects with budgets
    pub projects: Vec<ProjectView>,
    /// Recruitment candidates
    pub candidates: Vec<Candidate>,
    /// Current alerts
    pub alerts: Vec<Alert>,
    /// Table states
    pub workers_state: TableState,
    /// Projects table selection
    pub projects_state: TableState,
    /// Pipeline table selection
    pub pipeline_state: TableState,
    /// Alerts table selection
    pub alerts_state: TableState,
    /// Last update time
    pub last_update: Instant,
    /// Refresh rate
    pub refresh_rate: Duration,
    /// Reload requested from the keyboard
    pub refresh_requested: bool,
    /// Show help overlay
    pub show_help: bool,
    /// Status message
    pub status_message: Option<(String, Instant)>,
    /// Whether the last load succeeded
    pub connected: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new TUI app
    pub fn new() -> Self {
        Self {
            should_quit: false,
            active_tab: ActiveTab::default(),
            stats: None,
            workers: Vec::new(),
            projects: Vec::new(),
            candidates: Vec::new(),
            alerts: Vec::new(),
            workers_state: TableState::default(),
            projects_state: TableState::default(),
            pipeline_state: TableState::default(),
            alerts_state: TableState::default(),
            last_update: Instant::now(),
            refresh_rate: Duration::from_secs(5),
            refresh_requested: false,
            show_help: false,
            status_message: None,
            connected: false,
        }
    }

    /// Set refresh rate
    pub fn with_refresh_rate(mut self, ms: u64) -> Self {
        self.refresh_rate = Duration::from_millis(ms.max(250));
        self
    }

    /// Handle key events
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.show_help {
            // Any key closes the overlay
            self.show_help = false;
            return;
        }

        match (code, modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => {
                self.should_quit = true;
            }
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('?'), _) => {
                self.show_help = true;
            }
            (KeyCode::Char('r'), KeyModifiers::NONE) => {
                self.refresh_requested = true;
                self.set_status("Refreshing…".to_string());
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.active_tab = self.active_tab.next();
            }
            (KeyCode::BackTab, _) => {
                self.active_tab = self.active_tab.prev();
            }
            (KeyCode::Char(c @ '1'..='5'), KeyModifiers::NONE) => {
                self.active_tab = match c {
                    '1' => ActiveTab::Overview,
                    '2' => ActiveTab::Workers,
                    '3' => ActiveTab::Projects,
                    '4' => ActiveTab::Pipeline,
                    _ => ActiveTab::Alerts,
                };
            }
            _ => self.handle_list_key(code),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) {
        let (state, len) = match self.active_tab {
            ActiveTab::Overview => return,
            ActiveTab::Workers => (&mut self.workers_state, self.workers.len()),
            ActiveTab::Projects => (&mut self.projects_state, self.projects.len()),
            ActiveTab::Pipeline => (&mut self.pipeline_state, self.candidates.len()),
            ActiveTab::Alerts => (&mut self.alerts_state, self.alerts.len()),
        };
        if len == 0 {
            return;
        }

        let i = state.selected().unwrap_or(0);
        match code {
            KeyCode::Up | KeyCode::Char('k') => state.select(Some(i.saturating_sub(1))),
            KeyCode::Down | KeyCode::Char('j') => state.select(Some((i + 1).min(len - 1))),
            KeyCode::Home | KeyCode::Char('g') => state.select(Some(0)),
            KeyCode::End | KeyCode::Char('G') => state.select(Some(len - 1)),
            _ => {}
        }
    }

    /// Set a status message that expires after 3 seconds
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get current status message if not expired
    pub fn get_status(&self) -> Option<&str> {
        self.status_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < Duration::from_secs(3) {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    /// Check if data needs refresh
    pub fn needs_refresh(&self) -> bool {
        self.refresh_requested || self.last_update.elapsed() >= self.refresh_rate
    }

    /// Reload everything from the store
    pub async fn load(&mut self, store: &dyn Store, evaluator: &AlertEvaluator) -> Result<()> {
        let today = Utc::now().date_naive();

        let mut next_expiry: HashMap<_, (DocumentType, i64)> = HashMap::new();
        // Documents arrive soonest expiry first, so the first hit per worker wins
        for document in store.list_documents(&DocumentFilter::default(), today).await? {
            if let Some(days) = document.days_until_expiry(today) {
                next_expiry
                    .entry(document.worker_id)
                    .or_insert((document.doc_type, days));
            }
        }

        self.workers = store
            .list_workers(&WorkerFilter::default())
            .await?
            .into_iter()
            .map(|worker| WorkerView {
                next_expiry: next_expiry.get(&worker.id).copied(),
                worker,
            })
            .collect();

        let mut projects = Vec::new();
        for project in store.list_projects(&ProjectFilter::default()).await? {
            let spent = store.project_spend(project.id).await?;
            let budget = budget_summary(&project, spent, evaluator.thresholds());
            projects.push(ProjectView { project, budget });
        }
        self.projects = projects;

        self.candidates = store.list_candidates(None).await?;
        self.alerts = evaluator.alerts_on(today).await?;
        self.stats = Some(dashboard::build_stats(store, evaluator).await?);

        for (state, len) in [
            (&mut self.workers_state, self.workers.len()),
            (&mut self.projects_state, self.projects.len()),
            (&mut self.pipeline_state, self.candidates.len()),
            (&mut self.alerts_state, self.alerts.len()),
        ] {
            clamp_selection(state, len);
        }

        self.connected = true;
        self.refresh_requested = false;
        self.last_update = Instant::now();
        Ok(())
    }

    /// Run the TUI application
    pub async fn run(&mut self, store: Arc<dyn Store>, evaluator: Arc<AlertEvaluator>) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        };
        use ratatui::{backend::CrosstermBackend, Terminal};
        use std::io;

        let tui_err = |e: io::Error| Error::Tui(e.to_string());

        // Setup terminal
        enable_raw_mode().map_err(tui_err)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(tui_err)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(tui_err)?;

        if let Err(e) = self.load(store.as_ref(), &evaluator).await {
            self.connected = false;
            self.set_status(format!("Load failed: {e}"));
        }

        let mut events = super::EventHandler::new(250);
        events.start();

        let result = async {
            while !self.should_quit {
                terminal
                    .draw(|frame| super::ui::draw(frame, self))
                    .map_err(tui_err)?;

                match events.next().await {
                    Some(super::Event::Key(key)) => self.handle_key(key.code, key.modifiers),
                    Some(super::Event::Tick) => {}
                    Some(super::Event::Resize(_, _)) => {}
                    None => break,
                }

                if self.needs_refresh() {
                    if let Err(e) = self.load(store.as_ref(), &evaluator).await {
                        warn!(error = %e, "Dashboard refresh failed");
                        self.connected = false;
                        self.refresh_requested = false;
                        self.last_update = Instant::now();
                        self.set_status(format!("Refresh failed: {e}"));
                    }
                }
            }
            Ok::<(), Error>(())
        }
        .await;

        // Restore terminal
        disable_raw_mode().map_err(tui_err)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(tui_err)?;
        terminal.show_cursor().map_err(tui_err)?;

        result
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), len) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertingConfig;
    use crate::db::{seed_demo_data, MemoryStore};

    #[test]
    fn test_tab_cycle() {
        let mut app = App::new();
        app.handle_key(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(app.active_tab, ActiveTab::Alerts);
        app.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.active_tab, ActiveTab::Overview);
        app.handle_key(KeyCode::Char('4'), KeyModifiers::NONE);
        assert_eq!(app.active_tab, ActiveTab::Pipeline);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = App::new();
        app.handle_key(KeyCode::Char('?'), KeyModifiers::NONE);
        assert!(app.show_help);
        app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!app.show_help);
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_load_and_navigate() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        seed_demo_data(store.as_ref()).await.unwrap();
        let evaluator = AlertEvaluator::new(store.clone(), &AlertingConfig::default()).unwrap();

        let mut app = App::new();
        app.handle_key(KeyCode::Char('r'), KeyModifiers::NONE);
        assert!(app.needs_refresh());
        app.load(store.as_ref(), &evaluator).await.unwrap();

        assert!(app.connected);
        assert!(!app.refresh_requested);
        assert_eq!(app.workers.len(), 6);
        assert_eq!(app.projects.len(), 3);
        assert!(!app.alerts.is_empty());
        assert_eq!(app.workers_state.selected(), Some(0));

        app.active_tab = ActiveTab::Workers;
        app.handle_key(KeyCode::Char('G'), KeyModifiers::SHIFT);
        app.handle_key(KeyCode::End, KeyModifiers::NONE);
        assert_eq!(app.workers_state.selected(), Some(5));
        app.handle_key(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(app.workers_state.selected(), Some(4));
    }
}
