//! Project domain models (项目)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// 合法的项目状态
pub const VALID_STATUSES: &[&str] = &["active", "completed", "on_hold", "cancelled"];

/// 项目实体
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub estimated_budget: Option<f64>,
    pub estimated_hours: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 项目的可调整字段集合
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectFields {
    pub client_id: i64,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub estimated_budget: Option<f64>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub estimated_hours: Option<f64>,
    pub notes: Option<String>,
}

impl ProjectFields {
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "client_id",
        "name",
        "start_date",
        "end_date",
        "status",
        "estimated_budget",
        "estimated_hours",
        "notes",
    ];

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl Project {
    pub fn fields(&self) -> ProjectFields {
        ProjectFields {
            client_id: self.client_id,
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.clone(),
            estimated_budget: self.estimated_budget,
            estimated_hours: self.estimated_hours,
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses() {
        assert!(VALID_STATUSES.contains(&"active"));
        assert!(VALID_STATUSES.contains(&"completed"));
        assert!(VALID_STATUSES.contains(&"on_hold"));
        assert!(VALID_STATUSES.contains(&"cancelled"));
        assert!(!VALID_STATUSES.contains(&"archived"));
    }

    #[test]
    fn test_negative_budget_rejected() {
        let fields = ProjectFields {
            client_id: 1,
            name: "Website Revamp".to_string(),
            start_date: None,
            end_date: None,
            status: "active".to_string(),
            estimated_budget: Some(-100.0),
            estimated_hours: None,
            notes: None,
        };

        let errors = fields.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("estimated_budget"));
    }
}
