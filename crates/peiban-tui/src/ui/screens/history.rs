use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::{first_line, truncate_string};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.history;
    let text_width = (area.width as usize).saturating_sub(30);

    let mut items: Vec<ListItem> = history
        .logs
        .iter()
        .map(|entry| {
            let preview = match first_line(entry.content_or_empty()) {
                "" => "(photos only)".to_string(),
                line => truncate_string(line, text_width),
            };
            let photos = match entry.images.len() {
                0 => String::new(),
                n => format!(" [{} photo{}]", n, if n == 1 { "" } else { "s" }),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {}  ", entry.created_display()), styles::muted_style()),
                Span::styled(preview, styles::list_item_style()),
                Span::styled(photos, styles::highlight_style()),
            ]))
        })
        .collect();

    if history.logs.is_empty() && history.page > 0 {
        items.push(ListItem::new(Span::styled(
            " No entries yet. Press [n] to write one.",
            styles::muted_style(),
        )));
    } else if history.has_more() {
        items.push(ListItem::new(Span::styled(
            " ... more entries, press [m] or scroll down",
            styles::muted_style(),
        )));
    }

    let title = format!(" Journal ({} of {}) ", history.logs.len(), history.total);
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !history.logs.is_empty() {
        state.select(Some(history.selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
