//! 审计服务
//! Audit Writer（追加记录）与 Audit Reader（历史查询）

use crate::{
    codec,
    error::AppError,
    models::adjustment::*,
    repository::adjustment_repo::{AdjustmentRepository, NewAdjustment},
};
use serde_json::Value;
use sqlx::SqlitePool;

/// 一次字段变更的记录参数
#[derive(Debug, Clone)]
pub struct AdjustmentParams<'a> {
    pub entity_type: EntityKind,
    pub entity_id: i64,
    pub field_name: &'a str,
    pub old_value: Option<&'a Value>,
    pub new_value: Option<&'a Value>,
    pub reason: &'a str,
    pub adjusted_by: ActorTag,
}

pub struct AuditService {
    db: SqlitePool,
}

impl AuditService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 追加一条审计记录
    ///
    /// 存储失败返回 `AuditUnavailable`。调用方（领域服务）对已提交的
    /// 主变更不做回滚：审计写入相对主变更是尽力而为的。
    pub async fn record_change(
        &self,
        params: AdjustmentParams<'_>,
    ) -> Result<Adjustment, AppError> {
        let field_name = params.field_name.trim();
        if field_name.is_empty() {
            return Err(AppError::InvalidInput(vec![
                "field_name: must not be empty".to_string(),
            ]));
        }

        // system 角色的自动写入允许省略事由，落默认值；其他角色必须给出事由
        let reason = params.reason.trim();
        let reason = if reason.is_empty() {
            if params.adjusted_by == ActorTag::System {
                DEFAULT_SYSTEM_REASON
            } else {
                return Err(AppError::ReasonRequired);
            }
        } else {
            reason
        };

        let old_value = codec::encode(params.old_value)?;
        let new_value = codec::encode(params.new_value)?;
        let created_at = chrono::Utc::now();

        let repo = AdjustmentRepository::new(self.db.clone());
        let id = repo
            .insert(&NewAdjustment {
                entity_type: params.entity_type.as_str(),
                entity_id: params.entity_id,
                field_name,
                old_value: old_value.as_deref(),
                new_value: new_value.as_deref(),
                reason,
                adjusted_by: params.adjusted_by.as_str(),
                created_at,
            })
            .await
            .map_err(|e| AppError::AuditUnavailable(e.to_string()))?;

        tracing::info!(
            entity_type = %params.entity_type,
            entity_id = params.entity_id,
            field = field_name,
            adjusted_by = %params.adjusted_by,
            "Adjustment recorded"
        );

        Ok(Adjustment {
            id,
            entity_type: params.entity_type.as_str().to_string(),
            entity_id: params.entity_id,
            field_name: field_name.to_string(),
            old_value: params.old_value.cloned(),
            new_value: params.new_value.cloned(),
            reason: reason.to_string(),
            adjusted_by: params.adjusted_by.as_str().to_string(),
            created_at,
        })
    }

    /// 根据 ID 查询审计记录
    pub async fn get_by_id(&self, id: i64) -> Result<Adjustment, AppError> {
        let repo = AdjustmentRepository::new(self.db.clone());
        let row = repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        Adjustment::from_row(row)
    }

    /// 查询某实体的全部审计记录，按创建时间倒序（同时间戳按 id 倒序）
    pub async fn get_by_reference(
        &self,
        entity_type: EntityKind,
        entity_id: i64,
    ) -> Result<Vec<Adjustment>, AppError> {
        let repo = AdjustmentRepository::new(self.db.clone());
        let rows = repo
            .list_by_reference(entity_type.as_str(), entity_id)
            .await?;

        rows.into_iter().map(Adjustment::from_row).collect()
    }

    /// 分页查询全部审计记录及总数（全局活动流）
    ///
    /// 超出范围的分页返回空列表而不是错误，total 始终是真实总行数。
    pub async fn get_all(&self, limit: i64, offset: i64) -> Result<AdjustmentPage, AppError> {
        let mut violations = Vec::new();
        if limit < 0 {
            violations.push("limit: must be >= 0".to_string());
        }
        if offset < 0 {
            violations.push("offset: must be >= 0".to_string());
        }
        if !violations.is_empty() {
            return Err(AppError::InvalidInput(violations));
        }

        let repo = AdjustmentRepository::new(self.db.clone());
        let total = repo.count_all().await?;
        let items = repo
            .list_all(limit, offset)
            .await?
            .into_iter()
            .map(Adjustment::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AdjustmentPage { items, total })
    }

    /// 某实体的格式化变更历史
    /// get_by_reference 的纯投影，不做额外存储访问
    pub async fn get_change_history(
        &self,
        entity_type: EntityKind,
        entity_id: i64,
    ) -> Result<Vec<ChangeEntry>, AppError> {
        let adjustments = self.get_by_reference(entity_type, entity_id).await?;
        Ok(adjustments.into_iter().map(ChangeEntry::from).collect())
    }
}
