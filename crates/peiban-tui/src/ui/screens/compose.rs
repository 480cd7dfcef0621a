use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use peiban_core::validate::{MAX_CONTENT_CHARS, MAX_IMAGES};

use crate::app::{App, ComposeField};
use crate::ui::render::{button_line, field_line};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.compose;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // Caption
            Constraint::Length(8), // Images
            Constraint::Length(5), // Submit + error
        ])
        .split(area);

    // Caption
    let content_focused = form.focus == ComposeField::Content;
    let cursor = if content_focused { "▌" } else { "" };
    let count = form.content.chars().count();
    let caption = Paragraph::new(format!("{}{}", form.content, cursor))
        .style(styles::list_item_style())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" Caption {}/{} ", count, MAX_CONTENT_CHARS))
                .borders(Borders::ALL)
                .border_style(styles::border_style(content_focused)),
        );
    frame.render_widget(caption, chunks[0]);

    // Images
    let images_focused = form.focus == ComposeField::ImagePath;
    let inner_width = chunks[1].width.saturating_sub(18) as usize;
    let mut items: Vec<ListItem> = form
        .images
        .iter()
        .enumerate()
        .map(|(i, p)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), styles::muted_style()),
                Span::styled(p.display().to_string(), styles::list_item_style()),
            ]))
        })
        .collect();
    if form.images.len() < MAX_IMAGES {
        items.push(ListItem::new(field_line("Add", &form.image_input, images_focused, inner_width.max(8))));
    }
    let list = List::new(items).block(
        Block::default()
            .title(format!(" Images {}/{} ", form.images.len(), MAX_IMAGES))
            .borders(Borders::ALL)
            .border_style(styles::border_style(images_focused)),
    );
    frame.render_widget(list, chunks[1]);

    // Submit
    let mut lines = vec![
        Line::from(""),
        button_line("Publish", form.focus == ComposeField::Submit, 4),
    ];
    if let Some(ref error) = form.error {
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }
    frame.render_widget(Paragraph::new(lines), chunks[2]);
}
