use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A journal entry: optional caption plus up to nine image paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl LogEntry {
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn created_display(&self) -> String {
        self.created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
}

impl LogPage {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_page() {
        let json = r#"{
            "logs": [
                {"id": 2, "user_id": 1, "content": "晚饭", "images": ["logs/b.jpg"], "created_at": "2024-05-03T19:00:00"},
                {"id": 1, "user_id": 1, "content": null, "images": [], "created_at": null}
            ],
            "total": 21, "page": 1, "per_page": 20, "pages": 2
        }"#;
        let page: LogPage = serde_json::from_str(json).expect("parse log page");
        assert_eq!(page.logs.len(), 2);
        assert!(page.has_more());
        assert_eq!(page.logs[0].created_display(), "2024-05-03 19:00");
        assert_eq!(page.logs[1].content_or_empty(), "");
        assert_eq!(page.logs[1].created_display(), "-");
    }

    #[test]
    fn test_last_page_has_no_more() {
        let page = LogPage { logs: vec![], total: 3, page: 1, per_page: 20, pages: 1 };
        assert!(!page.has_more());
        let empty = LogPage { logs: vec![], total: 0, page: 1, per_page: 20, pages: 0 };
        assert!(!empty.has_more());
    }
}
