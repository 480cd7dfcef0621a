use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use peiban_core::api::image_url;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Entry ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let Some(entry) = app.detail.as_ref() else {
        let paragraph = Paragraph::new(Span::styled(" Loading entry...", styles::muted_style())).block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", entry.created_display()), styles::muted_style())),
        Line::from(""),
    ];
    match entry.content_or_empty() {
        "" => lines.push(Line::from(Span::styled(" (no caption)", styles::muted_style()))),
        content => lines.extend(
            content
                .lines()
                .map(|l| Line::from(Span::styled(format!(" {}", l), styles::list_item_style()))),
        ),
    }

    if !entry.images.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" Photos ({})", entry.images.len()),
            styles::highlight_style(),
        )));
        for (i, path) in entry.images.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), styles::muted_style()),
                Span::styled(image_url(&app.config.uploads_base_url, path), styles::list_item_style()),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
