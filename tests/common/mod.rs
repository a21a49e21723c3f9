//! 测试公共工具
//! 内存 SQLite + 迁移，以及各实体的测试数据构造

#![allow(dead_code)]

use chrono::NaiveDate;
use erp_audit::models::client::ClientFields;
use erp_audit::models::invoice::InvoiceFields;
use erp_audit::models::project::ProjectFields;
use erp_audit::models::time_entry::TimeEntryFields;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// 创建内存数据库并执行迁移
/// 单连接：内存库的每个连接是独立的数据库
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    pool
}

pub fn client_fields(name: &str) -> ClientFields {
    ClientFields {
        name: name.to_string(),
        email: Some("billing@acme.example".to_string()),
        phone: Some("010-1111-2222".to_string()),
        company: Some("Acme Inc".to_string()),
        address: None,
        notes: None,
    }
}

pub fn project_fields(client_id: i64, name: &str) -> ProjectFields {
    ProjectFields {
        client_id,
        name: name.to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 31),
        status: "active".to_string(),
        estimated_budget: Some(5000.0),
        estimated_hours: Some(120.0),
        notes: None,
    }
}

pub fn time_entry_fields(project_id: i64) -> TimeEntryFields {
    TimeEntryFields {
        project_id,
        entry_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        hours: 3.5,
        description: Some("wireframes".to_string()),
        billable: true,
    }
}

pub fn invoice_fields(client_id: i64, project_id: i64, number: &str) -> InvoiceFields {
    InvoiceFields {
        client_id,
        project_id,
        invoice_number: number.to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
        subtotal: 1000.0,
        tax: 100.0,
        total: 1100.0,
        status: "draft".to_string(),
        notes: None,
    }
}
