use chrono::{Datelike, Local, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use peiban_core::api::image_url;

use crate::app::App;
use crate::ui::render::button_line;
use crate::ui::styles;
use crate::utils::{format_long_date, month_title};

/// Weeks of a month as Sunday-first rows; `None` pads days outside it.
pub fn month_weeks(year: i32, month: u32) -> Vec<[Option<u32>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let days = days_in_month(first);
    let offset = first.weekday().num_days_from_sunday() as usize;

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    for day in 1..=days {
        let slot = (offset + day as usize - 1) % 7;
        week[slot] = Some(day);
        if slot == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let today = Local::now().date_naive();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_today(frame, app, today, chunks[0]);
    render_calendar(frame, app, today, chunks[1]);
}

fn render_today(frame: &mut Frame, app: &App, today: NaiveDate, area: Rect) {
    let session = app.session.snapshot();
    let name = session.user().map(|u| u.display_name()).unwrap_or_default();

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  Hi, {}", name), styles::title_style())),
        Line::from(Span::styled(format!("  {}", format_long_date(today)), styles::muted_style())),
    ];
    if let Some(avatar) = session.user().and_then(|u| u.avatar.as_deref()) {
        lines.push(Line::from(Span::styled(
            format!("  {}", image_url(&app.config.uploads_base_url, avatar)),
            styles::muted_style(),
        )));
    }
    lines.push(Line::from(""));

    match app.home.status {
        None => lines.push(Line::from(Span::styled("  Loading today's status...", styles::muted_style()))),
        Some(_) if app.home.checked_in() => {
            lines.push(Line::from(Span::styled("  ✓ Checked in today", styles::success_style())));
        }
        Some(_) => {
            lines.push(button_line("Check in", true, 2));
        }
    }

    let streak = app.home.calendar.current_streak(today);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Streak: ", styles::muted_style()),
        Span::styled(
            format!("{} day{}", streak, if streak == 1 { "" } else { "s" }),
            styles::highlight_style(),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  Check-ins (90 days): ", styles::muted_style()),
        Span::styled(app.home.calendar.checkin_dates.len().to_string(), styles::highlight_style()),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  [n] Write an entry", styles::list_item_style())));
    lines.push(Line::from(Span::styled("  [h] Journal history", styles::list_item_style())));
    lines.push(Line::from(Span::styled("  [p] Profile", styles::list_item_style())));

    let block = Block::default()
        .title(" Today ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_calendar(frame: &mut Frame, app: &App, today: NaiveDate, area: Rect) {
    let (year, month) = app.home.month;
    let checked = app.home.calendar.days_in_month(year, month);
    let is_current_month = today.year() == year && today.month() == month;

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  ← ", styles::muted_style()),
            Span::styled(format!("{:^20}", month_title(year, month)), styles::title_style()),
            Span::styled(" →", styles::muted_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled("   Su  Mo  Tu  We  Th  Fr  Sa", styles::muted_style())),
    ];

    for week in month_weeks(year, month) {
        let mut spans = vec![Span::raw("  ")];
        for day in week {
            match day {
                Some(d) => {
                    let style = if checked.contains(&d) {
                        styles::checked_day_style()
                    } else if is_current_month && d == today.day() {
                        styles::today_style()
                    } else {
                        styles::list_item_style()
                    };
                    spans.push(Span::raw(" "));
                    spans.push(Span::styled(format!("{:>2}", d), style));
                    spans.push(Span::raw(" "));
                }
                None => spans.push(Span::raw("    ")),
            }
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled(" 1 ", styles::checked_day_style()),
        Span::styled(" checked in   ", styles::muted_style()),
        Span::styled(" 1", styles::today_style()),
        Span::styled("  today", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Calendar ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_weeks_layout() {
        // May 2024 starts on a Wednesday and has 31 days
        let weeks = month_weeks(2024, 5);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0], [None, None, None, Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(weeks[4][5], Some(31));
        assert_eq!(weeks[4][6], None);
    }

    #[test]
    fn test_month_weeks_leap_february() {
        let weeks = month_weeks(2024, 2);
        let days: Vec<u32> = weeks.iter().flatten().flatten().copied().collect();
        assert_eq!(days.len(), 29);
        assert_eq!(month_weeks(2023, 2).iter().flatten().flatten().count(), 28);
    }

    #[test]
    fn test_month_weeks_december_and_invalid() {
        let days = month_weeks(2024, 12).iter().flatten().flatten().count();
        assert_eq!(days, 31);
        assert!(month_weeks(2024, 13).is_empty());
    }
}
