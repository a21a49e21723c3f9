//! 工时服务
//! 工时记录 CRUD 的变更集编排

use crate::{
    error::AppError,
    models::adjustment::{ChangeEntry, EntityKind, FIELD_CREATED, FIELD_DELETED},
    models::time_entry::{TimeEntry, TimeEntryFields},
    repository::{ProjectRepository, TimeEntryRepository},
    services::audit_service::AuditService,
    services::changeset::{self, ChangeOutcome, DeleteOutcome},
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// 单条工时上限（小时）
const MAX_HOURS_PER_ENTRY: f64 = 24.0;

pub struct TimeEntryService {
    db: SqlitePool,
    audit: Arc<AuditService>,
}

impl TimeEntryService {
    pub fn new(db: SqlitePool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    async fn validate_fields(&self, fields: &TimeEntryFields) -> Result<Vec<String>, AppError> {
        let mut errors = match fields.validate() {
            Ok(()) => Vec::new(),
            Err(e) => changeset::flatten_validation(&e),
        };

        if fields.hours <= 0.0 {
            errors.push("hours: must be greater than 0".to_string());
        } else if fields.hours > MAX_HOURS_PER_ENTRY {
            errors.push(format!("hours: must not exceed {}", MAX_HOURS_PER_ENTRY));
        }

        let project = ProjectRepository::new(self.db.clone())
            .get(fields.project_id)
            .await?;
        if project.is_none() {
            errors.push("project_id: project does not exist".to_string());
        }

        Ok(errors)
    }

    /// 创建工时记录
    pub async fn create_entry(
        &self,
        fields: TimeEntryFields,
    ) -> Result<ChangeOutcome<TimeEntry>, AppError> {
        let errors = self.validate_fields(&fields).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let repo = TimeEntryRepository::new(self.db.clone());
        let entry = repo.create(&fields).await?;

        let snapshot = Value::Object(entry.fields().to_map());
        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::TimeEntry,
            entry.id,
            FIELD_CREATED,
            None,
            Some(&snapshot),
            "new time entry recorded",
        )
        .await;

        tracing::info!(time_entry_id = entry.id, "Time entry created");
        Ok(ChangeOutcome { entity: entry, warnings })
    }

    /// 更新工时记录
    pub async fn update_entry(
        &self,
        entry_id: i64,
        updates: &Map<String, Value>,
        reason: &str,
    ) -> Result<ChangeOutcome<TimeEntry>, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = TimeEntryRepository::new(self.db.clone());
        let current = repo.get(entry_id).await?.ok_or(AppError::NotFound)?;

        let unknown = changeset::unknown_fields(updates, TimeEntryFields::FIELD_NAMES);
        if !unknown.is_empty() {
            return Err(AppError::InvalidInput(unknown));
        }

        let before = current.fields().to_map();
        let merged = changeset::merge_fields(before.clone(), updates);
        let candidate: TimeEntryFields = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::InvalidInput(vec![e.to_string()]))?;

        let errors = self.validate_fields(&candidate).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let changed = changeset::changed_fields(updates, &before, &candidate.to_map());
        if changed.is_empty() {
            return Ok(ChangeOutcome::clean(current));
        }

        repo.update(entry_id, &candidate).await?;
        let updated = repo.get(entry_id).await?.ok_or(AppError::NotFound)?;

        let warnings = changeset::log_changes(
            &self.audit,
            EntityKind::TimeEntry,
            entry_id,
            &changed,
            &before,
            &updated.fields().to_map(),
            reason,
        )
        .await;

        tracing::info!(time_entry_id = entry_id, changed = changed.len(), "Time entry updated");
        Ok(ChangeOutcome { entity: updated, warnings })
    }

    /// 删除工时记录
    pub async fn delete_entry(&self, entry_id: i64, reason: &str) -> Result<DeleteOutcome, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = TimeEntryRepository::new(self.db.clone());
        let current = repo.get(entry_id).await?.ok_or(AppError::NotFound)?;

        let snapshot = serde_json::to_value(&current).map_err(|e| AppError::Encode(e.to_string()))?;

        if !repo.delete(entry_id).await? {
            return Err(AppError::NotFound);
        }

        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::TimeEntry,
            entry_id,
            FIELD_DELETED,
            Some(&snapshot),
            None,
            reason,
        )
        .await;

        tracing::info!(time_entry_id = entry_id, "Time entry deleted");
        Ok(DeleteOutcome { warnings })
    }

    /// 根据 ID 获取工时记录
    pub async fn get_entry(&self, entry_id: i64) -> Result<TimeEntry, AppError> {
        TimeEntryRepository::new(self.db.clone())
            .get(entry_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 列出某项目的工时记录
    pub async fn list_entries_by_project(&self, project_id: i64) -> Result<Vec<TimeEntry>, AppError> {
        TimeEntryRepository::new(self.db.clone())
            .list_by_project(project_id)
            .await
    }

    /// 工时记录的变更历史
    pub async fn get_change_history(&self, entry_id: i64) -> Result<Vec<ChangeEntry>, AppError> {
        self.audit
            .get_change_history(EntityKind::TimeEntry, entry_id)
            .await
    }
}
