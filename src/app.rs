use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::{BTreeSet, HashMap, HashSet};

const PAGE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    Highlighted,
    Combined,
}

/// How an existing `.gitignore` is handled on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Append,
    Overwrite,
}

/// Side effect requested by a key press, carried out by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Save the selection. `None` means the target file has not been checked yet.
    Save(Option<SaveMode>),
}

/// Picker state. Holds no I/O handles; network and file work happen in `main`.
pub struct App {
    /// Every identifier returned by the service, sorted.
    pub templates: Vec<String>,
    /// Identifiers matching `query`, best match first.
    pub visible: Vec<String>,
    pub selected: BTreeSet<String>,
    /// Index into `visible`.
    pub cursor: usize,
    pub query: String,
    pub input_mode: InputMode,
    pub preview_mode: PreviewMode,
    pub preview_scroll: u16,
    /// Fetched template bodies keyed by identifier.
    pub previews: HashMap<String, String>,
    /// Identifiers with a preview request in flight.
    pub pending: HashSet<String>,
    /// Last fetch error per identifier; retried when the highlight returns.
    pub failed: HashMap<String, String>,
    pub save_mode: SaveMode,
    pub quit_after_save: bool,
    pub is_loading: bool,
    pub is_saving: bool,
    pub error: Option<String>,
    pub notification: Option<String>,
    matcher: SkimMatcherV2,
}

impl App {
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            visible: Vec::new(),
            selected: BTreeSet::new(),
            cursor: 0,
            query: String::new(),
            input_mode: InputMode::Search,
            preview_mode: PreviewMode::Highlighted,
            preview_scroll: 0,
            previews: HashMap::new(),
            pending: HashSet::new(),
            failed: HashMap::new(),
            save_mode: SaveMode::Append,
            quit_after_save: false,
            is_loading: true,
            is_saving: false,
            error: None,
            notification: None,
            matcher: SkimMatcherV2::default(),
        }
    }

    pub fn set_templates(&mut self, templates: Vec<String>) {
        self.templates = templates;
        self.is_loading = false;
        self.apply_filter();
    }

    pub fn apply_filter(&mut self) {
        self.visible = if self.query.is_empty() {
            self.templates.clone()
        } else {
            let mut scored: Vec<(i64, &String)> = self
                .templates
                .iter()
                .filter_map(|t| self.matcher.fuzzy_match(t, &self.query).map(|s| (s, t)))
                .collect();
            // Stable sort keeps alphabetical order among equal scores.
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            scored.into_iter().map(|(_, t)| t.clone()).collect()
        };

        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
        self.on_highlight_moved();
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.visible.get(self.cursor).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.visible.is_empty() {
            self.cursor = (self.cursor + 1) % self.visible.len();
            self.on_highlight_moved();
        }
    }

    pub fn previous(&mut self) {
        if !self.visible.is_empty() {
            self.cursor = self.cursor.checked_sub(1).unwrap_or(self.visible.len() - 1);
            self.on_highlight_moved();
        }
    }

    fn on_highlight_moved(&mut self) {
        self.preview_scroll = 0;
        if let Some(name) = self.visible.get(self.cursor) {
            self.failed.remove(name);
        }
    }

    pub fn toggle_selection(&mut self) {
        if let Some(name) = self.highlighted().map(str::to_string) {
            if !self.selected.remove(&name) {
                self.selected.insert(name);
            }
        }
        self.clear_messages();
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn selection_summary(&self) -> String {
        self.selected_names().join(", ")
    }

    /// Returns the highlighted identifier if its preview still has to be
    /// fetched, and marks it pending.
    pub fn take_preview_request(&mut self) -> Option<String> {
        let name = self.highlighted()?.to_string();
        if self.previews.contains_key(&name)
            || self.failed.contains_key(&name)
            || !self.pending.insert(name.clone())
        {
            return None;
        }
        Some(name)
    }

    pub fn preview_loaded(&mut self, name: String, content: String) {
        self.pending.remove(&name);
        self.failed.remove(&name);
        self.previews.insert(name, content);
    }

    pub fn preview_failed(&mut self, name: String, err: String) {
        self.pending.remove(&name);
        self.failed.insert(name, err);
    }

    pub fn preview_text(&self) -> String {
        match self.preview_mode {
            PreviewMode::Highlighted => match self.highlighted() {
                Some(name) => match (self.previews.get(name), self.failed.get(name)) {
                    (Some(content), _) => content.clone(),
                    (None, Some(err)) => format!(
                        "Preview of {} unavailable: {}\n\nMove away and back to retry.",
                        name, err
                    ),
                    (None, None) => format!("Fetching {} from gitignore.io...", name),
                },
                None => "Nothing highlighted.".to_string(),
            },
            PreviewMode::Combined if self.selected.is_empty() => {
                "Nothing selected yet. Press SPACE to add a template.".to_string()
            }
            PreviewMode::Combined => self
                .selected
                .iter()
                .map(|name| match (self.previews.get(name), self.failed.contains_key(name)) {
                    (Some(content), _) => content.clone(),
                    (None, true) => format!("# {} (preview unavailable)\n", name),
                    (None, false) => format!("# {} (preview not loaded)\n", name),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn preview_line_count(&self) -> usize {
        self.preview_text().lines().count()
    }

    pub fn scroll_preview(&mut self, delta: i32) {
        let max = self.preview_line_count().saturating_sub(1) as i64;
        let target = (self.preview_scroll as i64 + delta as i64).clamp(0, max.max(0));
        self.preview_scroll = u16::try_from(target).unwrap_or(u16::MAX);
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.notification = None;
    }

    /// Opens the append/overwrite prompt for an existing `.gitignore`.
    pub fn ask_save_mode(&mut self) {
        self.save_mode = SaveMode::Append;
        self.input_mode = InputMode::Confirm;
    }

    pub fn saved(&mut self, message: String) {
        self.is_saving = false;
        self.notification = Some(message);
    }

    pub fn save_failed(&mut self, err: String) {
        self.is_saving = false;
        self.quit_after_save = false;
        self.error = Some(err);
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        match self.input_mode {
            InputMode::Search => self.on_search_key(key),
            InputMode::Normal => self.on_normal_key(key),
            InputMode::Confirm => self.on_confirm_key(key),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char(c) => {
                self.clear_messages();
                self.query.push(c);
                self.apply_filter();
            }
            KeyCode::Backspace => {
                self.clear_messages();
                self.query.pop();
                self.apply_filter();
            }
            KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            _ => {}
        }
        Action::None
    }

    fn on_normal_key(&mut self, key: KeyEvent) -> Action {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return self.request_save(false),
            KeyCode::Enter => return self.request_save(true),
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('/') | KeyCode::Char('i') => {
                self.clear_messages();
                self.input_mode = InputMode::Search;
            }
            KeyCode::Down | KeyCode::Char('j') if alt => self.scroll_preview(1),
            KeyCode::Up | KeyCode::Char('k') if alt => self.scroll_preview(-1),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.scroll_preview(PAGE as i32),
            KeyCode::PageUp => self.scroll_preview(-(PAGE as i32)),
            KeyCode::Char(' ') => self.toggle_selection(),
            KeyCode::Char('p') => {
                self.preview_mode = match self.preview_mode {
                    PreviewMode::Highlighted => PreviewMode::Combined,
                    PreviewMode::Combined => PreviewMode::Highlighted,
                };
                self.preview_scroll = 0;
            }
            _ => {}
        }
        Action::None
    }

    fn on_confirm_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('a') | KeyCode::Left => self.save_mode = SaveMode::Append,
            KeyCode::Char('o') | KeyCode::Right => self.save_mode = SaveMode::Overwrite,
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.is_saving = true;
                return Action::Save(Some(self.save_mode));
            }
            KeyCode::Esc => {
                self.clear_messages();
                self.quit_after_save = false;
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
        Action::None
    }

    fn request_save(&mut self, quit: bool) -> Action {
        if self.is_saving {
            return Action::None;
        }
        if self.selected.is_empty() {
            self.error = Some("No templates selected!".to_string());
            return Action::None;
        }
        self.clear_messages();
        self.quit_after_save = quit;
        Action::Save(None)
    }
}
