//! Time entry domain models (工时记录)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// 工时记录实体
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntry {
    pub id: i64,
    pub project_id: i64,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub description: Option<String>,
    pub billable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 工时记录的可调整字段集合
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TimeEntryFields {
    pub project_id: i64,
    pub entry_date: NaiveDate,
    pub hours: f64,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: Option<String>,
    pub billable: bool,
}

impl TimeEntryFields {
    pub const FIELD_NAMES: &'static [&'static str] =
        &["project_id", "entry_date", "hours", "description", "billable"];

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl TimeEntry {
    pub fn fields(&self) -> TimeEntryFields {
        TimeEntryFields {
            project_id: self.project_id,
            entry_date: self.entry_date,
            hours: self.hours,
            description: self.description.clone(),
            billable: self.billable,
        }
    }
}
