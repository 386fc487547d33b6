// src/app.rs
// Panel state: everything the front end renders, independent of how it is
// drawn.

use crate::listing::{self, ModelRecord};
use crate::remote_api::{ConfigSnapshot, ConfigUpdate, ExecResult};
use std::time::{Duration, Instant};

pub const EMPTY_OUTPUT: &str = "No output yet.";
pub const NOTICE_TTL: Duration = Duration::from_millis(1600);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum View {
    Models,
    Run,
    Pull,
    Settings,
}

impl View {
    pub const ALL: [View; 4] = [View::Models, View::Run, View::Pull, View::Settings];

    pub fn title(self) -> &'static str {
        match self {
            View::Models => "Models",
            View::Run => "Run",
            View::Pull => "Pull",
            View::Settings => "Settings",
        }
    }

    pub fn next(self) -> View {
        let i = View::ALL.iter().position(|v| *v == self).unwrap_or(0);
        View::ALL[(i + 1) % View::ALL.len()]
    }

    pub fn previous(self) -> View {
        let i = View::ALL.iter().position(|v| *v == self).unwrap_or(0);
        View::ALL[(i + View::ALL.len() - 1) % View::ALL.len()]
    }

    /// Number of focusable fields in the view.
    pub fn field_count(self) -> usize {
        match self {
            View::Models => 0,
            View::Run => 2,
            View::Pull => 1,
            View::Settings => SettingsForm::FIELDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub shown_at: Instant,
}

/// Editable copy of the daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub host: String,
    pub lang: String,
    pub mode: String,
    pub ollama_exe: String,
    pub unsafe_mode: bool,
    pub no_proxy_auto: bool,
}

impl SettingsForm {
    pub const FIELDS: usize = 6;
    pub const LABELS: [&'static str; Self::FIELDS] =
        ["Host", "Language", "Mode", "Ollama exe", "Unsafe", "No proxy auto"];

    pub fn from_snapshot(s: &ConfigSnapshot) -> Self {
        Self {
            host: s.host.clone().unwrap_or_default(),
            lang: s.lang.clone().filter(|v| !v.is_empty()).unwrap_or_else(|| "en".into()),
            mode: s.mode.clone().filter(|v| !v.is_empty()).unwrap_or_else(|| "auto".into()),
            ollama_exe: s.ollama_exe.clone().unwrap_or_default(),
            unsafe_mode: s.unsafe_mode.unwrap_or(false),
            no_proxy_auto: s.no_proxy_auto.unwrap_or(false),
        }
    }

    pub fn to_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            host: Some(self.host.clone()),
            lang: Some(self.lang.clone()),
            mode: Some(self.mode.clone()),
            ollama_exe: Some(self.ollama_exe.clone()),
            unsafe_mode: Some(self.unsafe_mode),
            no_proxy_auto: Some(self.no_proxy_auto),
        }
    }

    /// Text field at `index`, or `None` for the two toggles.
    pub fn text_field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.host),
            1 => Some(&mut self.lang),
            2 => Some(&mut self.mode),
            3 => Some(&mut self.ollama_exe),
            _ => None,
        }
    }

    pub fn toggle(&mut self, index: usize) {
        match index {
            4 => self.unsafe_mode = !self.unsafe_mode,
            5 => self.no_proxy_auto = !self.no_proxy_auto,
            _ => {}
        }
    }

    pub fn display_value(&self, index: usize) -> String {
        let check = |on: bool| (if on { "[x]" } else { "[ ]" }).to_string();
        match index {
            0 => self.host.clone(),
            1 => self.lang.clone(),
            2 => self.mode.clone(),
            3 => self.ollama_exe.clone(),
            4 => check(self.unsafe_mode),
            _ => check(self.no_proxy_auto),
        }
    }
}

/// Builds the display block for one result: an optional `[label]` line, an
/// `ERROR:` line, an `exitCode:` line, a blank separator after any of those,
/// then the raw output.
pub fn format_output(label: Option<&str>, result: &ExecResult) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        lines.push(format!("[{label}]"));
    }
    if let Some(error) = result.error.as_deref().filter(|e| !e.is_empty()) {
        lines.push(format!("ERROR: {error}"));
    }
    if let Some(code) = result.exit_code {
        lines.push(format!("exitCode: {code}"));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    if let Some(output) = result.output.as_deref().filter(|o| !o.is_empty()) {
        lines.push(output.to_string());
    }
    lines.join("\n")
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub focus: usize,

    pub output: String,
    pub wrap_output: bool,
    pub notice: Option<Notice>,

    pub models: Vec<ModelRecord>,
    pub selected: Option<usize>,
    pub filter_input: String,
    pub is_filtering: bool,

    pub run_model: String,
    pub prompt: String,
    pub pull_model: String,

    pub config: Option<ConfigSnapshot>,
    pub settings: SettingsForm,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Models,
            focus: 0,
            output: EMPTY_OUTPUT.to_string(),
            wrap_output: false,
            notice: None,
            models: Vec::new(),
            selected: None,
            filter_input: String::new(),
            is_filtering: false,
            run_model: String::new(),
            prompt: String::new(),
            pull_model: String::new(),
            config: None,
            settings: SettingsForm::default(),
        }
    }

    // --- Output ---

    /// Replaces the display with the formatted result, unless the result
    /// formats to nothing.
    pub fn show_output(&mut self, label: Option<&str>, result: &ExecResult) {
        let next = format_output(label, result);
        let next = next.trim_end();
        if !next.is_empty() {
            self.output = next.to_string();
        }
    }

    pub fn clear_output(&mut self) {
        self.output = EMPTY_OUTPUT.to_string();
    }

    // --- Notices ---

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn notice_text(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    pub fn expire_notice(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| now.duration_since(n.shown_at) >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    // --- Drafts ---

    /// Prepopulates inputs that are still empty.
    pub fn restore_drafts(&mut self, last_model: &str, last_prompt: &str) {
        if !last_model.is_empty() {
            if self.run_model.is_empty() {
                self.run_model = last_model.to_string();
            }
            if self.pull_model.is_empty() {
                self.pull_model = last_model.to_string();
            }
        }
        if !last_prompt.is_empty() && self.prompt.is_empty() {
            self.prompt = last_prompt.to_string();
        }
    }

    // --- Config ---

    pub fn apply_config(&mut self, snapshot: ConfigSnapshot) {
        self.settings = SettingsForm::from_snapshot(&snapshot);
        self.config = Some(snapshot);
    }

    pub fn host_chip(&self) -> String {
        match self.config.as_ref().and_then(|c| c.host.as_deref()) {
            Some(host) if !host.is_empty() => format!("host: {host}"),
            _ => "host: —".to_string(),
        }
    }

    pub fn mode_chip(&self) -> String {
        let config = self.config.as_ref();
        let pick = |v: Option<&String>| v.filter(|s| !s.is_empty()).cloned();
        let mode = pick(config.and_then(|c| c.selected_mode.as_ref()))
            .or_else(|| pick(config.and_then(|c| c.mode.as_ref())))
            .unwrap_or_else(|| "auto".to_string());
        format!("mode: {mode}")
    }

    // --- Models ---

    pub fn replace_models(&mut self, models: Vec<ModelRecord>) {
        self.models = models;
        self.clamp_selection();
    }

    pub fn visible_models(&self) -> Vec<&ModelRecord> {
        listing::filter_models(&self.models, &self.filter_input)
    }

    pub fn selected_model(&self) -> Option<&ModelRecord> {
        self.selected.and_then(|i| self.visible_models().get(i).copied())
    }

    pub fn next_model(&mut self) {
        let len = self.visible_models().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn previous_model(&mut self) {
        let len = self.visible_models().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    /// Copies the selected model into the run and pull inputs.
    pub fn use_selected_model(&mut self) -> bool {
        let Some(name) = self.selected_model().map(|m| m.name.clone()) else {
            return false;
        };
        self.run_model = name.clone();
        self.pull_model = name;
        true
    }

    pub fn filter_input_char(&mut self, c: char) {
        self.filter_input.push(c);
        self.clamp_selection();
    }

    pub fn filter_input_backspace(&mut self) {
        self.filter_input.pop();
        self.clamp_selection();
    }

    pub fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.is_filtering = false;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_models().len();
        self.selected = if len == 0 {
            None
        } else {
            Some(self.selected.unwrap_or(0).min(len - 1))
        };
    }

    // --- Views and focus ---

    pub fn switch_view(&mut self, view: View) {
        self.view = view;
        self.focus = 0;
    }

    pub fn focus_next(&mut self) {
        let n = self.view.field_count();
        if n > 0 {
            self.focus = (self.focus + 1) % n;
        }
    }

    pub fn focus_previous(&mut self) {
        let n = self.view.field_count();
        if n > 0 {
            self.focus = (self.focus + n - 1) % n;
        }
    }

    /// The text input that currently receives typed characters.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match (self.view, self.focus) {
            (View::Run, 0) => Some(&mut self.run_model),
            (View::Run, _) => Some(&mut self.prompt),
            (View::Pull, _) => Some(&mut self.pull_model),
            (View::Settings, i) => self.settings.text_field_mut(i),
            (View::Models, _) => None,
        }
    }
}
