//! 项目服务
//! 项目 CRUD 的变更集编排

use crate::{
    error::AppError,
    models::adjustment::{ChangeEntry, EntityKind, FIELD_CREATED, FIELD_DELETED},
    models::project::{Project, ProjectFields, VALID_STATUSES},
    repository::{ClientRepository, InvoiceRepository, ProjectRepository, TimeEntryRepository},
    services::audit_service::AuditService,
    services::changeset::{self, ChangeOutcome, DeleteOutcome},
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

pub struct ProjectService {
    db: SqlitePool,
    audit: Arc<AuditService>,
}

impl ProjectService {
    pub fn new(db: SqlitePool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    /// 领域校验，返回全部违规项
    async fn validate_fields(&self, fields: &ProjectFields) -> Result<Vec<String>, AppError> {
        let mut errors = match fields.validate() {
            Ok(()) => Vec::new(),
            Err(e) => changeset::flatten_validation(&e),
        };

        if !VALID_STATUSES.contains(&fields.status.as_str()) {
            errors.push(format!(
                "status: must be one of {}",
                VALID_STATUSES.join(", ")
            ));
        }

        if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
            if start > end {
                errors.push("end_date: must not be earlier than start_date".to_string());
            }
        }

        let client = ClientRepository::new(self.db.clone())
            .get(fields.client_id)
            .await?;
        if client.is_none() {
            errors.push("client_id: client does not exist".to_string());
        }

        Ok(errors)
    }

    /// 创建项目，记录一条 "created" 审计
    pub async fn create_project(
        &self,
        fields: ProjectFields,
    ) -> Result<ChangeOutcome<Project>, AppError> {
        let errors = self.validate_fields(&fields).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let repo = ProjectRepository::new(self.db.clone());
        let project = repo.create(&fields).await?;

        let snapshot = Value::Object(project.fields().to_map());
        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Project,
            project.id,
            FIELD_CREATED,
            None,
            Some(&snapshot),
            "new project registered",
        )
        .await;

        tracing::info!(project_id = project.id, "Project created");
        Ok(ChangeOutcome { entity: project, warnings })
    }

    /// 更新项目，对每个实际变化的字段各记录一条审计
    pub async fn update_project(
        &self,
        project_id: i64,
        updates: &Map<String, Value>,
        reason: &str,
    ) -> Result<ChangeOutcome<Project>, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = ProjectRepository::new(self.db.clone());
        let current = repo.get(project_id).await?.ok_or(AppError::NotFound)?;

        let unknown = changeset::unknown_fields(updates, ProjectFields::FIELD_NAMES);
        if !unknown.is_empty() {
            return Err(AppError::InvalidInput(unknown));
        }

        let before = current.fields().to_map();
        let merged = changeset::merge_fields(before.clone(), updates);
        let candidate: ProjectFields = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::InvalidInput(vec![e.to_string()]))?;

        let errors = self.validate_fields(&candidate).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let changed = changeset::changed_fields(updates, &before, &candidate.to_map());
        if changed.is_empty() {
            return Ok(ChangeOutcome::clean(current));
        }

        repo.update(project_id, &candidate).await?;
        let updated = repo.get(project_id).await?.ok_or(AppError::NotFound)?;

        let warnings = changeset::log_changes(
            &self.audit,
            EntityKind::Project,
            project_id,
            &changed,
            &before,
            &updated.fields().to_map(),
            reason,
        )
        .await;

        tracing::info!(project_id, changed = changed.len(), "Project updated");
        Ok(ChangeOutcome { entity: updated, warnings })
    }

    /// 删除项目，名下还有工时或发票时拒绝
    pub async fn delete_project(
        &self,
        project_id: i64,
        reason: &str,
    ) -> Result<DeleteOutcome, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = ProjectRepository::new(self.db.clone());
        let current = repo.get(project_id).await?.ok_or(AppError::NotFound)?;

        let mut violations = Vec::new();
        let time_entries = TimeEntryRepository::new(self.db.clone())
            .count_by_project(project_id)
            .await?;
        if time_entries > 0 {
            violations.push(format!(
                "cannot delete: {} time entr(ies) still reference this project",
                time_entries
            ));
        }
        let invoices = InvoiceRepository::new(self.db.clone())
            .count_by_project(project_id)
            .await?;
        if invoices > 0 {
            violations.push(format!(
                "cannot delete: {} invoice(s) still reference this project",
                invoices
            ));
        }
        if !violations.is_empty() {
            return Err(AppError::InvalidInput(violations));
        }

        let snapshot = serde_json::to_value(&current).map_err(|e| AppError::Encode(e.to_string()))?;

        if !repo.delete(project_id).await? {
            return Err(AppError::NotFound);
        }

        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Project,
            project_id,
            FIELD_DELETED,
            Some(&snapshot),
            None,
            reason,
        )
        .await;

        tracing::info!(project_id, "Project deleted");
        Ok(DeleteOutcome { warnings })
    }

    /// 根据 ID 获取项目
    pub async fn get_project(&self, project_id: i64) -> Result<Project, AppError> {
        ProjectRepository::new(self.db.clone())
            .get(project_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 列出全部项目
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        ProjectRepository::new(self.db.clone()).list_all().await
    }

    /// 列出某客户的项目
    pub async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError> {
        ProjectRepository::new(self.db.clone())
            .list_by_client(client_id)
            .await
    }

    /// 按状态列出项目
    pub async fn list_projects_by_status(&self, status: &str) -> Result<Vec<Project>, AppError> {
        if !VALID_STATUSES.contains(&status) {
            return Err(AppError::InvalidInput(vec![format!(
                "status: must be one of {}",
                VALID_STATUSES.join(", ")
            )]));
        }
        ProjectRepository::new(self.db.clone())
            .list_by_status(status)
            .await
    }

    /// 项目累计工时
    pub async fn total_hours(&self, project_id: i64) -> Result<f64, AppError> {
        // 先确认项目存在，避免对不存在的项目返回 0
        self.get_project(project_id).await?;
        TimeEntryRepository::new(self.db.clone())
            .sum_hours_by_project(project_id)
            .await
    }

    /// 项目的变更历史
    pub async fn get_change_history(&self, project_id: i64) -> Result<Vec<ChangeEntry>, AppError> {
        self.audit
            .get_change_history(EntityKind::Project, project_id)
            .await
    }
}
