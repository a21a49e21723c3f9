//! Time entry repository (工时数据访问)

use crate::{
    error::AppError,
    models::time_entry::{TimeEntry, TimeEntryFields},
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct TimeEntryRepository {
    db: SqlitePool,
}

impl TimeEntryRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 创建工时记录
    pub async fn create(&self, fields: &TimeEntryFields) -> Result<TimeEntry, AppError> {
        let now = Utc::now();
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries
                (project_id, entry_date, hours, description, billable, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.project_id)
        .bind(fields.entry_date)
        .bind(fields.hours)
        .bind(&fields.description)
        .bind(fields.billable)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// 根据 ID 查找工时记录
    pub async fn get(&self, id: i64) -> Result<Option<TimeEntry>, AppError> {
        let entry = sqlx::query_as::<_, TimeEntry>("SELECT * FROM time_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(entry)
    }

    /// 列出某项目的全部工时记录
    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<TimeEntry>, AppError> {
        let entries = sqlx::query_as::<_, TimeEntry>(
            "SELECT * FROM time_entries WHERE project_id = ? ORDER BY entry_date DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// 统计某项目的工时记录数（删除前的引用完整性检查用）
    pub async fn count_by_project(&self, project_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM time_entries WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 某项目的工时合计
    pub async fn sum_hours_by_project(&self, project_id: i64) -> Result<f64, AppError> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(hours), 0) FROM time_entries WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// 整行更新工时记录（单条原子语句）
    pub async fn update(&self, id: i64, fields: &TimeEntryFields) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE time_entries
            SET project_id = ?, entry_date = ?, hours = ?, description = ?, billable = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.project_id)
        .bind(fields.entry_date)
        .bind(fields.hours)
        .bind(&fields.description)
        .bind(fields.billable)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 删除工时记录
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
