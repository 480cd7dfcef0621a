use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Cycle through the selectable values, with `None` meaning "not set".
    pub fn cycle(current: Option<Gender>) -> Option<Gender> {
        match current {
            None => Some(Gender::Male),
            Some(Gender::Male) => Some(Gender::Female),
            Some(Gender::Female) => Some(Gender::Other),
            Some(Gender::Other) => None,
        }
    }
}

/// The account as returned by `/auth/me` and the profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_gender")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub signature: Option<String>,
    /// Path relative to the uploads root, e.g. `avatars/<uuid>.jpg`.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            phone: None,
            nickname: None,
            gender: None,
            signature: None,
            avatar: None,
            created_at: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Name to show in headers; falls back to the user id.
    pub fn display_name(&self) -> String {
        match self.nickname.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("User {}", self.id),
        }
    }

    pub fn gender_display(&self) -> &'static str {
        self.gender.map(|g| g.display_name()).unwrap_or("Not set")
    }
}

/// The backend stores gender as free text, so unknown or empty values are
/// treated as "not set" rather than failing the whole payload.
fn lenient_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("male") => Some(Gender::Male),
        Some("female") => Some(Gender::Female),
        Some("other") => Some(Gender::Other),
        _ => None,
    })
}

/// Body for `PUT /user/profile`. Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvatarResponse {
    pub avatar: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let json = r#"{"id": 7, "phone": "13800138000", "nickname": "用户8000",
            "gender": "female", "signature": null, "avatar": "avatars/a.jpg",
            "created_at": "2024-03-01T08:15:30.123456"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.id, 7);
        assert_eq!(user.gender, Some(Gender::Female));
        assert_eq!(user.avatar.as_deref(), Some("avatars/a.jpg"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_parse_user_unknown_gender() {
        let user: User = serde_json::from_str(r#"{"id": 1, "gender": ""}"#).expect("parse user");
        assert_eq!(user.gender, None);
        let user: User = serde_json::from_str(r#"{"id": 1, "gender": "robot"}"#).expect("parse user");
        assert_eq!(user.gender, None);
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(User::new(3).display_name(), "User 3");
        assert_eq!(User::new(3).with_nickname("  ").display_name(), "User 3");
        assert_eq!(User::new(3).with_nickname("A").display_name(), "A");
    }

    #[test]
    fn test_gender_cycle() {
        assert_eq!(Gender::cycle(None), Some(Gender::Male));
        assert_eq!(Gender::cycle(Some(Gender::Male)), Some(Gender::Female));
        assert_eq!(Gender::cycle(Some(Gender::Female)), Some(Gender::Other));
        assert_eq!(Gender::cycle(Some(Gender::Other)), None);
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            nickname: Some("B".to_string()),
            gender: Some(Gender::Other),
            signature: None,
        };
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(json, serde_json::json!({"nickname": "B", "gender": "other"}));
    }
}
