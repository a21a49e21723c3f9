//! Client repository (客户数据访问)

use crate::{
    error::AppError,
    models::client::{Client, ClientFields},
};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct ClientRepository {
    db: SqlitePool,
}

impl ClientRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 创建客户
    pub async fn create(&self, fields: &ClientFields) -> Result<Client, AppError> {
        let now = Utc::now();
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, email, phone, company, address, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.company)
        .bind(&fields.address)
        .bind(&fields.notes)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(client)
    }

    /// 根据 ID 查找客户
    pub async fn get(&self, id: i64) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(client)
    }

    /// 列出全部客户
    pub async fn list_all(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(clients)
    }

    /// 按名称模糊搜索
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<Client>, AppError> {
        let pattern = format!("%{}%", query);
        let clients =
            sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE name LIKE ? ORDER BY name")
                .bind(pattern)
                .fetch_all(&self.db)
                .await?;

        Ok(clients)
    }

    /// 按邮箱模糊搜索
    pub async fn search_by_email(&self, query: &str) -> Result<Vec<Client>, AppError> {
        let pattern = format!("%{}%", query);
        let clients =
            sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE email LIKE ? ORDER BY name")
                .bind(pattern)
                .fetch_all(&self.db)
                .await?;

        Ok(clients)
    }

    /// 整行更新客户（单条原子语句）
    pub async fn update(&self, id: i64, fields: &ClientFields) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = ?, email = ?, phone = ?, company = ?, address = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.company)
        .bind(&fields.address)
        .bind(&fields.notes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 删除客户
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
