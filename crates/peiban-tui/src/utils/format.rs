use chrono::{Datelike, NaiveDate, Weekday};

/// Format a mainland mobile number for display as `138 0013 8000`.
/// Anything that is not 11 digits is returned unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        11 => format!("{} {} {}", &digits[0..3], &digits[3..7], &digits[7..11]),
        _ => phone.to_string(),
    }
}

/// Mask the middle of a phone number: `138****8000`
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() != 11 {
        return phone.to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[7..].iter().collect();
    format!("{}****{}", head, tail)
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// First line of a multi-line text, for list previews
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

/// Long date for the home header, e.g. "Friday, May 3, 2024"
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {}, {}",
        weekday_name(date.weekday()),
        date.format("%B"),
        date.day(),
        date.year()
    )
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn month_title(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first.format("%B %Y").to_string(),
        None => format!("{}-{:02}", year, month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("13800138000"), "138 0013 8000");
        assert_eq!(format_phone("138-0013-8000"), "138 0013 8000");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("13800138000"), "138****8000");
        assert_eq!(mask_phone("12345"), "12345");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("今天天气很好啊", 5), "今天...");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_format_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(format_long_date(date), "Friday, May 3, 2024");
        assert_eq!(month_title(2024, 5), "May 2024");
    }
}
