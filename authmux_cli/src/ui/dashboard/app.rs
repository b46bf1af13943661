use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use authmux_core::core::manager::StatusRow;
use authmux_core::storage::state::{Profile, RegistryState, Tool};

pub const NAME_INPUT_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    AddChoosingTool,
    AddEnteringName,
    ConfirmDelete,
}

/// Payload of one finished background load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub state: RegistryState,
    pub rows: Vec<StatusRow>,
}

/// Side effects the state machine asks the event loop to perform. Everything
/// that touches the manager, the filesystem, or the terminal goes through
/// here so key handling stays pure.
#[derive(Debug)]
pub enum AppCommand {
    Quit,
    Reload,
    SetDefault(Profile),
    Remove(Profile),
    Launch(Profile),
    Login(Profile),
    Logout(Profile),
    CreateAndLogin { tool: Tool, name: String },
    InstallShims,
}

pub struct App {
    pub mode: Mode,
    /// True while a background load is in flight; at most one is.
    pub loading: bool,
    /// False until the first load resolves; the view shows a placeholder.
    pub loaded_once: bool,
    pub state: RegistryState,
    pub rows: Vec<StatusRow>,
    pub cursor: usize,
    pub tool_index: usize,
    pub name_input: String,
    pub message: String,
}

impl App {
    pub fn new() -> Self {
        App {
            mode: Mode::Normal,
            loading: false,
            loaded_once: false,
            state: RegistryState::empty(),
            rows: Vec::new(),
            cursor: 0,
            tool_index: 0,
            name_input: String::new(),
            message: "Welcome to AuthMux. Press 'a' to add your first profile.".to_string(),
        }
    }

    /// Merge a finished load into the model and clamp the cursor.
    pub fn apply_load(&mut self, outcome: Result<LoadOutcome, String>) {
        self.loading = false;
        self.loaded_once = true;
        match outcome {
            Ok(outcome) => {
                self.state = outcome.state;
                self.rows = outcome.rows;
                if self.state.profiles.is_empty() {
                    self.cursor = 0;
                } else if self.cursor >= self.state.profiles.len() {
                    self.cursor = self.state.profiles.len() - 1;
                }
            }
            Err(err) => {
                self.message = format!("Error: {err}");
            }
        }
    }

    pub fn selected_profile(&self) -> Option<&Profile> {
        self.state.profiles.get(self.cursor)
    }

    /// The status row for a profile, if that probe has come back.
    pub fn row_for(&self, profile: &Profile) -> Option<&StatusRow> {
        self.rows
            .iter()
            .find(|r| r.profile.tool == profile.tool && r.profile.name == profile.name)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match self.mode {
            Mode::Normal => self.key_normal(key),
            Mode::AddChoosingTool => self.key_add_tool(key),
            Mode::AddEnteringName => self.key_add_name(key),
            Mode::ConfirmDelete => self.key_confirm_delete(key),
        }
    }

    fn key_normal(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char('q') => return Some(AppCommand::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppCommand::Quit)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.state.profiles.is_empty()
                    && self.cursor < self.state.profiles.len() - 1
                {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('r') => {
                self.message = "Refreshing statuses...".to_string();
                return Some(AppCommand::Reload);
            }
            KeyCode::Char('a') => {
                self.mode = Mode::AddChoosingTool;
                self.tool_index = 0;
                self.message = "Choose tool for new profile".to_string();
            }
            KeyCode::Char('u') => match self.selected_profile() {
                Some(profile) => return Some(AppCommand::SetDefault(profile.clone())),
                None => self.message = "No profile selected".to_string(),
            },
            KeyCode::Char('d') => {
                if self.state.profiles.is_empty() {
                    self.message = "No profile selected".to_string();
                } else {
                    self.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('s') => return Some(AppCommand::InstallShims),
            KeyCode::Enter => match self.selected_profile() {
                Some(profile) => return Some(AppCommand::Launch(profile.clone())),
                None => self.message = "No profile selected".to_string(),
            },
            KeyCode::Char('l') => match self.selected_profile() {
                Some(profile) => return Some(AppCommand::Login(profile.clone())),
                None => self.message = "No profile selected".to_string(),
            },
            KeyCode::Char('o') => match self.selected_profile() {
                Some(profile) => return Some(AppCommand::Logout(profile.clone())),
                None => self.message = "No profile selected".to_string(),
            },
            _ => {}
        }
        None
    }

    fn key_add_tool(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = Mode::Normal;
                self.message = "Add cancelled".to_string();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.mode = Mode::Normal;
                self.message = "Add cancelled".to_string();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.tool_index = self.tool_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.tool_index < Tool::ALL.len() - 1 {
                    self.tool_index += 1;
                }
            }
            KeyCode::Enter => {
                self.mode = Mode::AddEnteringName;
                self.name_input.clear();
                self.message = format!(
                    "Enter profile name for {}",
                    Tool::ALL[self.tool_index]
                );
            }
            _ => {}
        }
        None
    }

    fn key_add_name(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.message = "Add cancelled".to_string();
            }
            KeyCode::Enter => {
                let name = self.name_input.trim().to_string();
                if name.is_empty() {
                    self.message = "Profile name cannot be empty".to_string();
                    return None;
                }
                let tool = Tool::ALL[self.tool_index];
                self.mode = Mode::Normal;
                self.message = format!("Launching login for {tool}/{name}");
                return Some(AppCommand::CreateAndLogin { tool, name });
            }
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.name_input.len() < NAME_INPUT_LIMIT {
                    self.name_input.push(c);
                }
            }
            _ => {}
        }
        None
    }

    fn key_confirm_delete(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char('y') => {
                self.mode = Mode::Normal;
                if let Some(profile) = self.selected_profile() {
                    return Some(AppCommand::Remove(profile.clone()));
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.message = "Delete cancelled".to_string();
            }
            _ => {}
        }
        None
    }
}
