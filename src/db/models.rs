use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User row. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    pub default_currency_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Currency {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Record {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub currency_id: Option<String>,
    #[sqlx(rename = "created_at")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub amount: f64,
}

/// Filter for listing records. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        self.user_id.as_deref().map_or(true, |u| u == record.user_id)
            && self
                .category_id
                .as_deref()
                .map_or(true, |c| c == record.category_id)
    }
}

/// Fresh opaque id, 32 lowercase hex chars.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
