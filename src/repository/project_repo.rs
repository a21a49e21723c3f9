//! Project repository (项目数据访问)

use crate::{
    error::AppError,
    models::project::{Project, ProjectFields},
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct ProjectRepository {
    db: SqlitePool,
}

impl ProjectRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 创建项目
    pub async fn create(&self, fields: &ProjectFields) -> Result<Project, AppError> {
        let now = Utc::now();
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (client_id, name, start_date, end_date, status, estimated_budget, estimated_hours, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.client_id)
        .bind(&fields.name)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.status)
        .bind(fields.estimated_budget)
        .bind(fields.estimated_hours)
        .bind(&fields.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(project)
    }

    /// 根据 ID 查找项目
    pub async fn get(&self, id: i64) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }

    /// 列出全部项目
    pub async fn list_all(&self) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(projects)
    }

    /// 列出某客户的项目
    pub async fn list_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError> {
        let projects =
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE client_id = ? ORDER BY name")
                .bind(client_id)
                .fetch_all(&self.db)
                .await?;

        Ok(projects)
    }

    /// 按状态列出项目
    pub async fn list_by_status(&self, status: &str) -> Result<Vec<Project>, AppError> {
        let projects =
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE status = ? ORDER BY name")
                .bind(status)
                .fetch_all(&self.db)
                .await?;

        Ok(projects)
    }

    /// 统计某客户名下的项目数（删除前的引用完整性检查用）
    pub async fn count_by_client(&self, client_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE client_id = ?")
                .bind(client_id)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 整行更新项目（单条原子语句）
    pub async fn update(&self, id: i64, fields: &ProjectFields) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET client_id = ?, name = ?, start_date = ?, end_date = ?, status = ?,
                estimated_budget = ?, estimated_hours = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.client_id)
        .bind(&fields.name)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.status)
        .bind(fields.estimated_budget)
        .bind(fields.estimated_hours)
        .bind(&fields.notes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 删除项目
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
