use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use authmux_core::core::errors::{Error, Result};
use authmux_core::core::manager::{Manager, StatusRow, STATUS_PROBE_TIMEOUT};
use authmux_core::storage::state::{RegistryState, Tool};

use crate::shim;
use crate::ui::dashboard;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "authmux",
    version,
    about = "Multi-profile auth manager for Claude Code and Codex"
)]
pub struct Args {
    /// AuthMux state directory (default: $AUTHMUX_HOME or ~/.authmux)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Create a profile and launch the tool's login flow
    Add { tool: String, profile: String },
    /// List profiles and their auth status
    List {
        /// Filter by tool (claude|codex)
        #[arg(long)]
        tool: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the default profile for a tool
    Use { tool: String, profile: String },
    /// Run a tool using the selected or default auth profile
    Run {
        tool: String,
        profile: Option<String>,
        /// Arguments after `--` are handed to the tool verbatim
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Show auth status
    Status {
        tool: Option<String>,
        profile: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Log out from one profile
    Logout { tool: String, profile: String },
    /// Rename a profile
    Rename {
        tool: String,
        old_profile: String,
        new_profile: String,
    },
    /// Remove a profile from the registry
    Remove {
        tool: String,
        profile: String,
        /// Delete the profile directory from disk
        #[arg(long)]
        purge: bool,
    },
    /// Manage generated launcher shims
    Shim {
        #[command(subcommand)]
        command: ShimCommand,
    },
    /// Check tool binaries, profile directories, and defaults
    Doctor {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShimCommand {
    /// Generate claude-<profile> and codex-<profile> commands
    Install {
        /// Directory to install shims
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Remove generated shims
    Uninstall {
        tool: Option<String>,
        profile: Option<String>,
        /// Directory containing shims
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Remove all authmux-generated shims in the directory
        #[arg(long)]
        all: bool,
    },
}

fn manager_from_root_flag(root: &Option<PathBuf>) -> Result<Manager> {
    match root {
        None => Manager::open_default(),
        Some(path) if path.is_absolute() => Manager::new(path.clone()),
        Some(path) => {
            let cwd = env::current_dir()?;
            Manager::new(cwd.join(path))
        }
    }
}

pub async fn run_cli(args: Args) -> Result<()> {
    let manager = manager_from_root_flag(&args.root)?;
    match args.command {
        None => dashboard::run(manager).await,
        Some(CliCommand::Add { tool, profile }) => add(&manager, &tool, &profile).await,
        Some(CliCommand::List { tool, json }) => list(&manager, tool.as_deref(), json).await,
        Some(CliCommand::Use { tool, profile }) => {
            let tool = Tool::parse(&tool)?;
            manager.set_default(tool, &profile)?;
            println!("Default for {tool} set to {profile}");
            Ok(())
        }
        Some(CliCommand::Run {
            tool,
            profile,
            args,
        }) => run_tool(&manager, &tool, profile.as_deref(), &args).await,
        Some(CliCommand::Status {
            tool,
            profile,
            json,
        }) => status(&manager, tool.as_deref(), profile.as_deref(), json).await,
        Some(CliCommand::Logout { tool, profile }) => {
            let tool = Tool::parse(&tool)?;
            let state = manager.load()?;
            let profile = manager.get_profile(&state, tool, &profile)?;
            manager
                .logout_profile(&CancellationToken::new(), &profile)
                .await
        }
        Some(CliCommand::Rename {
            tool,
            old_profile,
            new_profile,
        }) => {
            let tool = Tool::parse(&tool)?;
            manager.rename_profile(tool, &old_profile, &new_profile)?;
            println!("Renamed {tool}/{old_profile} to {new_profile}");
            Ok(())
        }
        Some(CliCommand::Remove {
            tool,
            profile,
            purge,
        }) => {
            let tool = Tool::parse(&tool)?;
            manager.remove_profile(tool, &profile, purge)?;
            println!("Removed {tool}/{profile}");
            if purge {
                println!("Profile directory purged.");
            }
            Ok(())
        }
        Some(CliCommand::Shim { command }) => run_shim(&manager, command),
        Some(CliCommand::Doctor { json }) => doctor(&manager, json),
    }
}

async fn add(manager: &Manager, tool: &str, profile_name: &str) -> Result<()> {
    let tool = Tool::parse(tool)?;
    let (profile, created) = manager.ensure_profile(tool, profile_name)?;
    if created {
        println!("Created profile {tool}/{profile_name}");
    }
    match shim::install_for_profile(&profile) {
        Ok(path) => println!("Installed shim: {}", path.display()),
        Err(err) => {
            println!("Warning: could not install shim for {tool}/{profile_name}: {err}")
        }
    }
    println!("Starting login for {tool}/{profile_name}...");
    manager
        .login_profile(&CancellationToken::new(), &profile)
        .await?;
    match timeout(STATUS_PROBE_TIMEOUT, manager.status_for_profile(&profile)).await {
        Ok(Ok(status)) => println!("Login completed. Logged in: {}", status.logged_in),
        Ok(Err(err)) => println!("Login completed. Status check error: {err}"),
        Err(_) => println!(
            "Login completed. Status check error: {}",
            Error::StatusTimeout(STATUS_PROBE_TIMEOUT)
        ),
    }
    Ok(())
}

async fn list(manager: &Manager, tool: Option<&str>, json: bool) -> Result<()> {
    let filter = tool.map(Tool::parse).transpose()?;
    let state = manager.load()?;
    let rows = manager.status_rows(filter).await?;
    if json {
        print_rows_json(&state, &rows)?;
        return Ok(());
    }
    if rows.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }
    print_rows(&state, &rows);
    println!("* = default");
    Ok(())
}

async fn run_tool(
    manager: &Manager,
    tool: &str,
    profile: Option<&str>,
    args: &[String],
) -> Result<()> {
    let tool = Tool::parse(tool)?;
    let state = manager.load()?;
    let profile = manager.resolve_profile(&state, tool, profile)?;
    info!("running {}/{} with {} arg(s)", tool, profile.name, args.len());
    manager
        .run_tool(&CancellationToken::new(), &profile, args)
        .await
}

async fn status(
    manager: &Manager,
    tool: Option<&str>,
    profile: Option<&str>,
    json: bool,
) -> Result<()> {
    let state = manager.load()?;
    match (tool, profile) {
        (None, _) => {
            let rows = manager.status_rows(None).await?;
            if json {
                print_rows_json(&state, &rows)?;
            } else if rows.is_empty() {
                println!("No profiles found.");
            } else {
                print_rows(&state, &rows);
                println!("* = default");
            }
            Ok(())
        }
        (Some(tool), None) => {
            let tool = Tool::parse(tool)?;
            let rows = manager.status_rows(Some(tool)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_rows(&state, &rows);
            }
            Ok(())
        }
        (Some(tool), Some(profile)) => {
            let tool = Tool::parse(tool)?;
            let profile = manager.get_profile(&state, tool, profile)?;
            let status =
                match timeout(STATUS_PROBE_TIMEOUT, manager.status_for_profile(&profile)).await {
                    Ok(result) => result?,
                    Err(_) => return Err(Error::StatusTimeout(STATUS_PROBE_TIMEOUT)),
                };
            if json {
                let payload = json!({ "profile": profile, "status": status });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}/{}", profile.tool, profile.name);
                println!("  dir: {}", profile.dir.display());
                println!("  logged in: {}", status.logged_in);
                if let Some(method) = &status.method {
                    println!("  method: {method}");
                }
            }
            Ok(())
        }
    }
}

fn run_shim(manager: &Manager, command: ShimCommand) -> Result<()> {
    match command {
        ShimCommand::Install { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => shim::default_shim_dir()?,
            };
            let state = manager.load()?;
            let bin = shim::resolve_authmux_bin();
            let mut count = 0;
            for profile in &state.profiles {
                match shim::install(&dir, profile, &bin) {
                    Ok(path) => {
                        println!("installed: {}", path.display());
                        count += 1;
                    }
                    Err(err) => println!(
                        "Warning: could not install shim for {}/{}: {err}",
                        profile.tool, profile.name
                    ),
                }
            }
            println!("Installed {count} shim(s) in {}", dir.display());
            Ok(())
        }
        ShimCommand::Uninstall {
            tool,
            profile,
            dir,
            all,
        } => {
            let dir = match dir {
                Some(dir) => dir,
                None => shim::default_shim_dir()?,
            };
            if all {
                let removed = shim::remove_all(&dir)?;
                println!("Removed {} shim(s)", removed.len());
                for path in removed {
                    println!("removed: {}", path.display());
                }
                return Ok(());
            }
            let (Some(tool), Some(profile)) = (tool, profile) else {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "provide <tool> <profile> or use --all",
                )));
            };
            let tool = Tool::parse(&tool)?;
            shim::remove(&dir, tool, &profile)?;
            println!("Removed shim {}", shim::shim_name(tool, &profile));
            Ok(())
        }
    }
}

fn doctor(manager: &Manager, json: bool) -> Result<()> {
    let report = manager.doctor()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("Root: {}", report.root_dir.display());
    println!("Profiles: {}", report.profiles_total);
    for (tool, ok) in &report.tool_binaries {
        let state = if *ok { "ok" } else { "missing" };
        println!("Binary {tool:<6} : {state}");
    }
    if !report.missing_dirs.is_empty() {
        println!("Missing profile directories:");
        for entry in &report.missing_dirs {
            println!("  - {entry}");
        }
    }
    if !report.bad_defaults.is_empty() {
        println!("Default profile issues:");
        for entry in &report.bad_defaults {
            println!("  - {entry}");
        }
    }
    if report.missing_dirs.is_empty() && report.bad_defaults.is_empty() {
        println!("No structural issues found.");
    }
    Ok(())
}

fn print_rows(state: &RegistryState, rows: &[StatusRow]) {
    for row in rows {
        let marker = if state.default_for(row.profile.tool) == Some(row.profile.name.as_str()) {
            "*"
        } else {
            " "
        };
        let status = match (&row.error, row.status.logged_in) {
            (Some(err), _) => format!("error: {err}"),
            (None, true) => "logged-in".to_string(),
            (None, false) => "logged-out".to_string(),
        };
        println!("{marker} {}/{}  {status}", row.profile.tool, row.profile.name);
    }
}

fn print_rows_json(state: &RegistryState, rows: &[StatusRow]) -> Result<()> {
    let payload = json!({ "defaults": state.defaults, "profiles": rows });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
