//! Invoice repository (发票数据访问)

use crate::{
    error::AppError,
    models::invoice::{Invoice, InvoiceFields},
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct InvoiceRepository {
    db: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 创建发票
    pub async fn create(&self, fields: &InvoiceFields) -> Result<Invoice, AppError> {
        let now = Utc::now();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices
                (client_id, project_id, invoice_number, invoice_date, due_date,
                 subtotal, tax, total, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.client_id)
        .bind(fields.project_id)
        .bind(&fields.invoice_number)
        .bind(fields.invoice_date)
        .bind(fields.due_date)
        .bind(fields.subtotal)
        .bind(fields.tax)
        .bind(fields.total)
        .bind(&fields.status)
        .bind(&fields.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(invoice)
    }

    /// 根据 ID 查找发票
    pub async fn get(&self, id: i64) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(invoice)
    }

    /// 根据发票编号查找
    pub async fn get_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>, AppError> {
        let invoice =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE invoice_number = ?")
                .bind(invoice_number)
                .fetch_optional(&self.db)
                .await?;

        Ok(invoice)
    }

    /// 列出全部发票
    pub async fn list_all(&self) -> Result<Vec<Invoice>, AppError> {
        let invoices =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY invoice_date DESC, id DESC")
                .fetch_all(&self.db)
                .await?;

        Ok(invoices)
    }

    /// 按状态列出发票
    pub async fn list_by_status(&self, status: &str) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE status = ? ORDER BY invoice_date DESC, id DESC",
        )
        .bind(status)
        .fetch_all(&self.db)
        .await?;

        Ok(invoices)
    }

    /// 统计某客户名下的发票数
    pub async fn count_by_client(&self, client_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices WHERE client_id = ?")
                .bind(client_id)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 统计某项目名下的发票数
    pub async fn count_by_project(&self, project_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 某前缀下最大的发票编号（生成下一个编号用）
    pub async fn max_number_with_prefix(&self, prefix: &str) -> Result<Option<String>, AppError> {
        let pattern = format!("{}%", prefix);
        let max = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(invoice_number) FROM invoices WHERE invoice_number LIKE ?",
        )
        .bind(pattern)
        .fetch_one(&self.db)
        .await?;

        Ok(max)
    }

    /// 整行更新发票（单条原子语句）
    pub async fn update(&self, id: i64, fields: &InvoiceFields) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = ?, project_id = ?, invoice_number = ?, invoice_date = ?, due_date = ?,
                subtotal = ?, tax = ?, total = ?, status = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.client_id)
        .bind(fields.project_id)
        .bind(&fields.invoice_number)
        .bind(fields.invoice_date)
        .bind(fields.due_date)
        .bind(fields.subtotal)
        .bind(fields.tax)
        .bind(fields.total)
        .bind(&fields.status)
        .bind(&fields.notes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 仅更新状态（系统自动重算路径用）
    pub async fn update_status(&self, id: i64, status: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE invoices SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 删除发票
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
