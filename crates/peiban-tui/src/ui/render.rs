use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use peiban_core::auth::{Resolved, Route};

use crate::app::{App, AppState};

use super::screens::{compose, detail, history, home, login, profile};
use super::styles;

const LOGO: [&str; 3] = [
    "   ╔═╗╔═╗╦╔╗ ╔═╗╔╗╔",
    "   ╠═╝║╣ ║╠╩╗╠═╣║║║",
    "   ╩  ╚═╝╩╚═╝╩ ╩╝╚╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", "quit")
        }
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Log out of this account?", "log out")
        }
        AppState::ConfirmingDelete => {
            render_confirm_overlay(frame, "Delete this entry for good?", "delete")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let screen = match app.view {
        Resolved::Screen(route) => route.title(),
        Resolved::Waiting => "",
    };
    let title = format!("  Peiban  {}", screen);

    // Signed-in name on the right, or the help hint
    let session = app.session.snapshot();
    let right = match session.user() {
        Some(user) => format!("{}  [?] Help", user.display_name()),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.chars().count() + right.chars().count() + 4),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        Resolved::Waiting => render_waiting(frame, area),
        Resolved::Screen(Route::Login) => login::render(frame, app, area),
        Resolved::Screen(Route::Home) => home::render(frame, app, area),
        Resolved::Screen(Route::Profile) => profile::render(frame, app, area),
        Resolved::Screen(Route::Compose) => compose::render(frame, app, area),
        Resolved::Screen(Route::History) => history::render(frame, app, area),
        Resolved::Screen(Route::LogDetail(_)) => detail::render(frame, app, area),
    }
}

/// Neutral placeholder while the session is settling.
fn render_waiting(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(30, 3, area);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "Loading...",
        styles::muted_style(),
    )))
    .alignment(ratatui::layout::Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(styles::border_style(false)));
    frame.render_widget(paragraph, area);
}

fn shortcuts_for(view: Resolved) -> &'static str {
    match view {
        Resolved::Waiting => "[q]uit",
        Resolved::Screen(Route::Login) => "Enter: continue | Tab: WeChat | Esc: back",
        Resolved::Screen(Route::Home) => "[c]heck in | [n]ew | [h]istory | [p]rofile | [o] log out | [q]uit",
        Resolved::Screen(Route::Profile) => "Tab: next field | Enter: select | Esc: back",
        Resolved::Screen(Route::Compose) => "Tab: next field | Del: drop image | Esc: back",
        Resolved::Screen(Route::History) => "Enter: open | [m]ore | [n]ew | Esc: back",
        Resolved::Screen(Route::LogDetail(_)) => "[d]elete | Esc: back",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status_message, app.is_busy()) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, true) => " Working... ".to_string(),
        (None, false) => String::new(),
    };
    let right_text = format!(" {} ", shortcuts_for(app.view));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(format!("           {}", l), styles::title_style())))
        .collect();
    help_text.extend([
        Line::from(Span::styled(
            format!("              version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Home", styles::highlight_style())),
        help_line("c / Enter", "Check in for today"),
        help_line("←/→", "Previous/next month"),
        help_line("n", "New journal entry"),
        help_line("h", "Journal history"),
        help_line("p", "Edit profile"),
        help_line("o", "Log out"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab / ↑↓", "Move between fields"),
        help_line("Enter", "Select / add image / submit"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" History", styles::highlight_style())),
        help_line("↑/↓", "Navigate (loads more at the end)"),
        help_line("d", "Delete the open entry"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 10, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(format!("         {}", l), styles::title_style())))
        .collect();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// One labelled form field: `Label: [value▌]`
pub fn field_line(label: &str, value: &str, focused: bool, width: usize) -> Line<'static> {
    let cursor = if focused { "▌" } else { "" };
    let shown: String = value.chars().rev().take(width).collect::<Vec<_>>().into_iter().rev().collect();
    Line::from(vec![
        Span::styled(format!("  {:>10}: [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = width), styles::field_style(focused)),
        Span::styled("]", styles::muted_style()),
    ])
}

/// A focusable button: `[ ▶ Label ◀ ]`
pub fn button_line(label: &str, focused: bool, indent: usize) -> Line<'static> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw(format!("{}[", " ".repeat(indent))),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}
