use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus, LoginStep};
use crate::ui::render::{button_line, centered_rect_fixed, field_line};
use crate::ui::styles;
use crate::utils::format_phone;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.login;
    let height = if form.error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(46, height, area);

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("        Daily check-ins and a journal", styles::title_style())),
        Line::from(""),
    ];

    let input_focused = form.focus == LoginFocus::Input;
    match form.step {
        LoginStep::Phone => {
            lines.push(field_line("Phone", &form.phone, input_focused, 16));
            lines.push(Line::from(Span::styled(
                "               We'll send you a code",
                styles::muted_style(),
            )));
        }
        LoginStep::Code => {
            lines.push(Line::from(vec![
                Span::styled("         Code sent to ", styles::muted_style()),
                Span::styled(format_phone(&form.phone), styles::highlight_style()),
            ]));
            lines.push(field_line("Code", &form.code, input_focused, 16));
        }
    }

    lines.push(Line::from(""));
    let action = match form.step {
        LoginStep::Phone => "Send code",
        LoginStep::Code => "  Log in ",
    };
    lines.push(button_line(action, input_focused, 12));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "            ───── or ─────",
        styles::muted_style(),
    )));
    lines.push(button_line("WeChat  ", form.focus == LoginFocus::Wechat, 12));

    // Error message
    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Log in ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}
