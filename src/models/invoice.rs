//! Invoice domain models (发票)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// 合法的发票状态
pub const VALID_STATUSES: &[&str] = &["draft", "sent", "paid", "overdue", "cancelled"];

/// 发票编号前缀，完整格式为 INV-YYYYMM-NNNN
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// 发票实体
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub client_id: i64,
    pub project_id: i64,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 发票的可调整字段集合
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvoiceFields {
    pub client_id: i64,
    pub project_id: i64,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub subtotal: f64,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub tax: f64,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub total: f64,
    pub status: String,
    pub notes: Option<String>,
}

impl InvoiceFields {
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "client_id",
        "project_id",
        "invoice_number",
        "invoice_date",
        "due_date",
        "subtotal",
        "tax",
        "total",
        "status",
        "notes",
    ];

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl Invoice {
    pub fn fields(&self) -> InvoiceFields {
        InvoiceFields {
            client_id: self.client_id,
            project_id: self.project_id,
            invoice_number: self.invoice_number.clone(),
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            status: self.status.clone(),
            notes: self.notes.clone(),
        }
    }
}
