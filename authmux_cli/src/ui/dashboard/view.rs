use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use authmux_core::storage::state::{Profile, Tool};

use super::app::{App, Mode};

pub fn render(frame: &mut Frame, app: &App) {
    if !app.loaded_once {
        frame.render_widget(Paragraph::new("Loading AuthMux..."), frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Line::from(vec![
        Span::styled(
            "AuthMux",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  profile-based auth launcher for Claude + Codex",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_profiles_pane(frame, body[0], app);
    render_detail_pane(frame, body[1], app);

    frame.render_widget(
        Paragraph::new(Span::styled(
            app.message.as_str(),
            Style::default().fg(Color::Cyan),
        )),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "* = default profile · ● logged in · ○ logged out · ⚠ status check failed",
            Style::default().fg(Color::DarkGray),
        )),
        chunks[3],
    );
}

fn status_icon(app: &App, profile: &Profile) -> &'static str {
    match app.row_for(profile) {
        None => "…",
        Some(row) if row.error.is_some() => "⚠",
        Some(row) if row.status.logged_in => "●",
        Some(_) => "○",
    }
}

fn render_profiles_pane(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Profiles");
    if app.state.profiles.is_empty() {
        frame.render_widget(
            Paragraph::new("No profiles yet.\n\nPress 'a' to create one.").block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .state
        .profiles
        .iter()
        .map(|profile| {
            let marker = if app.state.default_for(profile.tool) == Some(profile.name.as_str())
            {
                "*"
            } else {
                " "
            };
            ListItem::new(format!(
                "{marker} {} {}/{}",
                status_icon(app, profile),
                profile.tool,
                profile.name
            ))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    let mut list_state = ListState::default();
    list_state.select(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_detail_pane(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(profile) = app.selected_profile() {
        let (status, error) = match app.row_for(profile) {
            None => ("unknown".to_string(), None),
            Some(row) => match &row.error {
                Some(err) => ("error".to_string(), Some(err.clone())),
                None if row.status.logged_in => ("logged in".to_string(), None),
                None => ("logged out".to_string(), None),
            },
        };
        let is_default = app.state.default_for(profile.tool) == Some(profile.name.as_str());
        lines.push(Line::from(format!("Tool: {}", profile.tool)));
        lines.push(Line::from(format!("Profile: {}", profile.name)));
        lines.push(Line::from(format!("Default: {is_default}")));
        lines.push(Line::from(format!("Dir: {}", profile.dir.display())));
        lines.push(Line::from(format!("Status: {status}")));
        if let Some(err) = error {
            lines.push(Line::from(Span::styled(
                format!("Error: {err}"),
                Style::default().fg(Color::Red),
            )));
        }
    } else {
        lines.push(Line::from("Select a profile"));
    }

    lines.push(Line::from(""));
    lines.push(Line::from("Actions:"));
    for action in [
        "[Enter] Launch",
        "[a] Add profile",
        "[l] Login",
        "[o] Logout",
        "[u] Set default",
        "[d] Remove",
        "[s] Install shims",
        "[r] Refresh",
        "[q] Quit",
    ] {
        lines.push(Line::from(action));
    }

    let modal_style = Style::default().bg(Color::Indexed(57)).fg(Color::Yellow);
    match app.mode {
        Mode::AddChoosingTool => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Choose tool:", modal_style)));
            for (i, tool) in Tool::ALL.iter().enumerate() {
                let prefix = if i == app.tool_index { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{prefix}{tool}"),
                    modal_style,
                )));
            }
        }
        Mode::AddEnteringName => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("New profile name:", modal_style)));
            lines.push(Line::from(Span::styled(
                format!("> {}_", app.name_input),
                modal_style,
            )));
        }
        Mode::ConfirmDelete => {
            if let Some(profile) = app.selected_profile() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!(
                        "Delete {}/{} from registry? (y/n)",
                        profile.tool, profile.name
                    ),
                    modal_style,
                )));
            }
        }
        Mode::Normal => {}
    }

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(details, area);
}
