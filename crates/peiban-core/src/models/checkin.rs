use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub id: i64,
    pub user_id: i64,
    pub checkin_date: NaiveDate,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinStatus {
    pub checked_in: bool,
    pub date: NaiveDate,
}

/// Check-in dates over the backend's lookback window (90 days).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckinCalendar {
    #[serde(default)]
    pub checkin_dates: Vec<NaiveDate>,
}

impl CheckinCalendar {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.checkin_dates.contains(&date)
    }

    /// Days of the given month that have a check-in, sorted and deduplicated.
    pub fn days_in_month(&self, year: i32, month: u32) -> BTreeSet<u32> {
        self.checkin_dates
            .iter()
            .filter(|d| d.year() == year && d.month() == month)
            .map(|d| d.day())
            .collect()
    }

    /// Consecutive days checked in, ending today (or yesterday if today is
    /// not checked in yet).
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let dates: BTreeSet<NaiveDate> = self.checkin_dates.iter().copied().collect();
        let mut day = if dates.contains(&today) {
            today
        } else {
            match today.pred_opt() {
                Some(d) => d,
                None => return 0,
            }
        };

        let mut streak = 0;
        while dates.contains(&day) {
            streak += 1;
            day = match day.pred_opt() {
                Some(d) => d,
                None => break,
            };
        }
        streak
    }
}
