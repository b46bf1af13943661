//! The interactive dashboard: a single event loop that owns the terminal,
//! drives the [`app::App`] state machine, and executes its commands.
//!
//! Concurrency contract: key handling and rendering are strictly sequential;
//! the only background work is at most one in-flight registry/status load,
//! whose outcome is fed back into the loop as a channel message. Interactive
//! child processes run with the terminal temporarily handed over (raw mode
//! off, alternate screen left) and the dashboard resumes when they exit.

pub mod app;
mod view;

use std::io;
use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use log::debug;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use authmux_core::core::errors::Result;
use authmux_core::core::manager::Manager;
use authmux_core::storage::state::Profile;

use crate::shim;

use app::{App, AppCommand, LoadOutcome};

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;
type LoadSender = mpsc::Sender<std::result::Result<LoadOutcome, String>>;

#[derive(PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(manager: Manager) -> Result<()> {
    let manager = Arc::new(manager);
    let mut terminal = init_terminal()?;
    let run_result = event_loop(&mut terminal, manager).await;
    let restore_result = restore_terminal(&mut terminal);
    match (run_result, restore_result) {
        (Err(run_error), _) => Err(run_error),
        (Ok(()), Err(restore_error)) => Err(restore_error.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Drop raw mode and the alternate screen so a child process owns the
/// terminal for a while.
fn suspend_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn resume_terminal(terminal: &mut TuiTerminal) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()
}

async fn event_loop(terminal: &mut TuiTerminal, manager: Arc<Manager>) -> Result<()> {
    let mut app = App::new();
    let (load_tx, mut load_rx) = mpsc::channel(1);
    start_load(&manager, &load_tx, &mut app);

    let mut events = EventStream::new();
    loop {
        terminal.draw(|frame| view::render(frame, &app))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(command) = app.handle_key(key) {
                            let flow =
                                execute_command(terminal, &mut app, &manager, &load_tx, command)
                                    .await?;
                            if flow == Flow::Quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        app.message = format!("Input error: {err}");
                    }
                    None => break,
                }
            }
            Some(outcome) = load_rx.recv() => {
                app.apply_load(outcome);
            }
        }
    }
    Ok(())
}

/// Kick off a background registry/status load unless one is already running.
fn start_load(manager: &Arc<Manager>, load_tx: &LoadSender, app: &mut App) {
    if app.loading {
        debug!("load already in flight; skipping");
        return;
    }
    app.loading = true;
    let manager = manager.clone();
    let tx = load_tx.clone();
    tokio::spawn(async move {
        let outcome = load_snapshot(&manager).await;
        let _ = tx.send(outcome).await;
    });
}

async fn load_snapshot(manager: &Manager) -> std::result::Result<LoadOutcome, String> {
    let state = manager.load().map_err(|e| e.to_string())?;
    let rows = manager.status_rows(None).await.map_err(|e| e.to_string())?;
    Ok(LoadOutcome { state, rows })
}

async fn execute_command(
    terminal: &mut TuiTerminal,
    app: &mut App,
    manager: &Arc<Manager>,
    load_tx: &LoadSender,
    command: AppCommand,
) -> Result<Flow> {
    match command {
        AppCommand::Quit => return Ok(Flow::Quit),
        AppCommand::Reload => start_load(manager, load_tx, app),
        AppCommand::SetDefault(profile) => {
            match manager.set_default(profile.tool, &profile.name) {
                Ok(()) => {
                    app.message = format!("Default set: {}/{}", profile.tool, profile.name);
                    start_load(manager, load_tx, app);
                }
                Err(err) => app.message = format!("Failed to set default: {err}"),
            }
        }
        AppCommand::Remove(profile) => {
            match manager.remove_profile(profile.tool, &profile.name, false) {
                Ok(()) => {
                    app.message = format!("Removed {}/{}", profile.tool, profile.name);
                    start_load(manager, load_tx, app);
                }
                Err(err) => app.message = format!("Delete failed: {err}"),
            }
        }
        AppCommand::Launch(profile) => {
            run_in_terminal(terminal, app, manager, load_tx, Interactive::Run, profile).await?;
        }
        AppCommand::Login(profile) => {
            run_in_terminal(terminal, app, manager, load_tx, Interactive::Login, profile)
                .await?;
        }
        AppCommand::Logout(profile) => {
            run_in_terminal(terminal, app, manager, load_tx, Interactive::Logout, profile)
                .await?;
        }
        AppCommand::CreateAndLogin { tool, name } => match manager.ensure_profile(tool, &name) {
            Ok((profile, _created)) => {
                run_in_terminal(terminal, app, manager, load_tx, Interactive::Login, profile)
                    .await?;
            }
            Err(err) => app.message = format!("Failed: {err}"),
        },
        AppCommand::InstallShims => install_shims(app, manager),
    }
    Ok(Flow::Continue)
}

enum Interactive {
    Run,
    Login,
    Logout,
}

/// Hand the terminal to a child process, run it to completion, resume the
/// dashboard, and fold the result into the message line.
async fn run_in_terminal(
    terminal: &mut TuiTerminal,
    app: &mut App,
    manager: &Arc<Manager>,
    load_tx: &LoadSender,
    kind: Interactive,
    profile: Profile,
) -> Result<()> {
    suspend_terminal(terminal)?;
    let cancel = CancellationToken::new();
    let result = match kind {
        Interactive::Run => manager.run_tool(&cancel, &profile, &[]).await,
        Interactive::Login => manager.login_profile(&cancel, &profile).await,
        Interactive::Logout => manager.logout_profile(&cancel, &profile).await,
    };
    resume_terminal(terminal)?;

    app.message = match result {
        Ok(()) => "Done.".to_string(),
        Err(err) => format!("Action failed: {err}"),
    };
    start_load(manager, load_tx, app);
    Ok(())
}

fn install_shims(app: &mut App, manager: &Arc<Manager>) {
    if app.state.profiles.is_empty() {
        app.message = "No profiles to shim".to_string();
        return;
    }
    let dir = match shim::default_shim_dir() {
        Ok(dir) => dir,
        Err(err) => {
            app.message = format!("Failed to detect shim dir: {err}");
            return;
        }
    };
    let bin = shim::resolve_authmux_bin();
    let mut count = 0;
    for profile in &app.state.profiles {
        if shim::install(&dir, profile, &bin).is_ok() {
            count += 1;
        }
    }
    app.message = format!("Installed {count} shim(s) in {}", dir.display());
}
