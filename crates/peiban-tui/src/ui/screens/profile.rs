use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use peiban_core::api::image_url;

use crate::app::{App, ProfileField};
use crate::ui::render::{button_line, field_line};
use crate::ui::styles;
use crate::utils::mask_phone;

const FIELD_WIDTH: usize = 32;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_account(frame, app, chunks[0]);
    render_form(frame, app, chunks[1]);
}

/// Read-only account facts from the session.
fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session.snapshot();
    let mut lines = vec![Line::from("")];

    if let Some(user) = session.user() {
        let avatar = user
            .avatar
            .as_deref()
            .map(|a| image_url(&app.config.uploads_base_url, a))
            .unwrap_or_else(|| "(none)".to_string());
        let since = user
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(format!("  {}", user.display_name()), styles::title_style())));
        lines.push(Line::from(""));
        for (label, value) in [
            ("ID", user.id.to_string()),
            ("Phone", user.phone.as_deref().map(mask_phone).unwrap_or_else(|| "-".to_string())),
            ("Gender", user.gender_display().to_string()),
            ("Joined", since),
            ("Avatar", avatar),
        ] {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<8}", label), styles::muted_style()),
                Span::styled(value, styles::list_item_style()),
            ]));
        }
        if let Some(signature) = user.signature.as_deref().filter(|s| !s.is_empty()) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(format!("  \"{}\"", signature), styles::highlight_style())));
        }
    }

    let block = Block::default()
        .title(" Account ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.profile;
    let focus = form.focus;

    let gender = form.gender.map(|g| g.display_name()).unwrap_or("Not set");
    let gender_focused = focus == ProfileField::Gender;
    let mut lines = vec![
        Line::from(""),
        field_line("Nickname", &form.nickname, focus == ProfileField::Nickname, FIELD_WIDTH),
        Line::from(vec![
            Span::styled(format!("  {:>10}: ", "Gender"), styles::muted_style()),
            Span::styled(format!("< {} >", gender), styles::field_style(gender_focused)),
        ]),
        field_line("Signature", &form.signature, focus == ProfileField::Signature, FIELD_WIDTH),
        Line::from(""),
        button_line("Save profile", focus == ProfileField::Save, 14),
        Line::from(""),
        Line::from(Span::styled("  Change avatar (path to an image file):", styles::muted_style())),
        field_line("Avatar", &form.avatar_path, focus == ProfileField::AvatarPath, FIELD_WIDTH),
        Line::from(Span::styled("              Enter to upload", styles::muted_style())),
    ];

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Edit profile ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
