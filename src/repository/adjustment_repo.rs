//! Adjustment repository (审计数据访问)
//!
//! 只追加的审计表。此层只有 INSERT 和 SELECT，
//! 任何地方都不存在针对 adjustments 的 UPDATE / DELETE。

use crate::{error::AppError, models::adjustment::AdjustmentRow};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 待插入的审计记录，值已编码为存储文本
#[derive(Debug, Clone)]
pub struct NewAdjustment<'a> {
    pub entity_type: &'a str,
    pub entity_id: i64,
    pub field_name: &'a str,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub reason: &'a str,
    pub adjusted_by: &'a str,
    pub created_at: DateTime<Utc>,
}

pub struct AdjustmentRepository {
    db: SqlitePool,
}

impl AdjustmentRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 追加一条审计记录，返回新分配的 id
    pub async fn insert(&self, rec: &NewAdjustment<'_>) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO adjustments
                (entity_type, entity_id, field_name, old_value, new_value, reason, adjusted_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rec.entity_type)
        .bind(rec.entity_id)
        .bind(rec.field_name)
        .bind(rec.old_value)
        .bind(rec.new_value)
        .bind(rec.reason)
        .bind(rec.adjusted_by)
        .bind(rec.created_at)
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// 根据 ID 查找审计记录
    pub async fn get_by_id(&self, id: i64) -> Result<Option<AdjustmentRow>, AppError> {
        let row = sqlx::query_as::<_, AdjustmentRow>("SELECT * FROM adjustments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row)
    }

    /// 查询某个实体的全部审计记录
    /// 按创建时间倒序，同一时间戳按 id 倒序
    pub async fn list_by_reference(
        &self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<AdjustmentRow>, AppError> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT * FROM adjustments
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// 分页查询全部审计记录（全局活动流）
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<AdjustmentRow>, AppError> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT * FROM adjustments
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// 统计审计记录总数
    pub async fn count_all(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM adjustments")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}
