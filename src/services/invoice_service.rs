//! 发票服务
//! 发票 CRUD 的变更集编排，外加编号生成与系统状态重算路径

use crate::{
    error::AppError,
    models::adjustment::{ActorTag, ChangeEntry, EntityKind, FIELD_CREATED, FIELD_DELETED},
    models::invoice::{Invoice, InvoiceFields, INVOICE_NUMBER_PREFIX, VALID_STATUSES},
    repository::{ClientRepository, InvoiceRepository, ProjectRepository},
    services::audit_service::{AdjustmentParams, AuditService},
    services::changeset::{self, ChangeOutcome, DeleteOutcome},
};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// 金额字段的比较容差
const AMOUNT_EPSILON: f64 = 1e-6;

pub struct InvoiceService {
    db: SqlitePool,
    audit: Arc<AuditService>,
}

impl InvoiceService {
    pub fn new(db: SqlitePool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    /// 领域校验，返回全部违规项
    /// `existing_id` 在更新时排除自身的编号唯一性冲突
    async fn validate_fields(
        &self,
        fields: &InvoiceFields,
        existing_id: Option<i64>,
    ) -> Result<Vec<String>, AppError> {
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

        if fields.due_date < fields.invoice_date {
            errors.push("due_date: must not be earlier than invoice_date".to_string());
        }

        if (fields.subtotal + fields.tax - fields.total).abs() > AMOUNT_EPSILON {
            errors.push("total: must equal subtotal + tax".to_string());
        }

        if ClientRepository::new(self.db.clone())
            .get(fields.client_id)
            .await?
            .is_none()
        {
            errors.push("client_id: client does not exist".to_string());
        }

        if ProjectRepository::new(self.db.clone())
            .get(fields.project_id)
            .await?
            .is_none()
        {
            errors.push("project_id: project does not exist".to_string());
        }

        let duplicate = InvoiceRepository::new(self.db.clone())
            .get_by_number(&fields.invoice_number)
            .await?;
        if let Some(existing) = duplicate {
            if existing_id != Some(existing.id) {
                errors.push("invoice_number: already in use".to_string());
            }
        }

        Ok(errors)
    }

    /// 创建发票，记录一条 "created" 审计
    pub async fn create_invoice(
        &self,
        fields: InvoiceFields,
    ) -> Result<ChangeOutcome<Invoice>, AppError> {
        let errors = self.validate_fields(&fields, None).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let repo = InvoiceRepository::new(self.db.clone());
        let invoice = repo.create(&fields).await?;

        let snapshot = Value::Object(invoice.fields().to_map());
        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Invoice,
            invoice.id,
            FIELD_CREATED,
            None,
            Some(&snapshot),
            "new invoice issued",
        )
        .await;

        tracing::info!(invoice_id = invoice.id, number = %invoice.invoice_number, "Invoice created");
        Ok(ChangeOutcome { entity: invoice, warnings })
    }

    /// 更新发票，对每个实际变化的字段各记录一条审计
    pub async fn update_invoice(
        &self,
        invoice_id: i64,
        updates: &Map<String, Value>,
        reason: &str,
    ) -> Result<ChangeOutcome<Invoice>, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = InvoiceRepository::new(self.db.clone());
        let current = repo.get(invoice_id).await?.ok_or(AppError::NotFound)?;

        let unknown = changeset::unknown_fields(updates, InvoiceFields::FIELD_NAMES);
        if !unknown.is_empty() {
            return Err(AppError::InvalidInput(unknown));
        }

        let before = current.fields().to_map();
        let merged = changeset::merge_fields(before.clone(), updates);
        let candidate: InvoiceFields = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::InvalidInput(vec![e.to_string()]))?;

        let errors = self.validate_fields(&candidate, Some(invoice_id)).await?;
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let changed = changeset::changed_fields(updates, &before, &candidate.to_map());
        if changed.is_empty() {
            return Ok(ChangeOutcome::clean(current));
        }

        repo.update(invoice_id, &candidate).await?;
        let updated = repo.get(invoice_id).await?.ok_or(AppError::NotFound)?;

        let warnings = changeset::log_changes(
            &self.audit,
            EntityKind::Invoice,
            invoice_id,
            &changed,
            &before,
            &updated.fields().to_map(),
            reason,
        )
        .await;

        tracing::info!(invoice_id, changed = changed.len(), "Invoice updated");
        Ok(ChangeOutcome { entity: updated, warnings })
    }

    /// 状态流转的便捷路径
    ///
    /// 不带事由的调用按系统自动重算处理（system 角色 + 默认事由），
    /// 带事由的调用按用户变更处理。
    pub async fn update_status(
        &self,
        invoice_id: i64,
        status: &str,
        reason: Option<&str>,
    ) -> Result<ChangeOutcome<Invoice>, AppError> {
        if !VALID_STATUSES.contains(&status) {
            return Err(AppError::InvalidInput(vec![format!(
                "status: must be one of {}",
                VALID_STATUSES.join(", ")
            )]));
        }

        let repo = InvoiceRepository::new(self.db.clone());
        let current = repo.get(invoice_id).await?.ok_or(AppError::NotFound)?;

        if current.status == status {
            return Ok(ChangeOutcome::clean(current));
        }

        repo.update_status(invoice_id, status).await?;
        let updated = repo.get(invoice_id).await?.ok_or(AppError::NotFound)?;

        let (reason, adjusted_by) = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => (r, ActorTag::User),
            _ => ("", ActorTag::System),
        };

        let old_status = json!(current.status);
        let new_status = json!(updated.status);
        let mut warnings = Vec::new();

        let result = self
            .audit
            .record_change(AdjustmentParams {
                entity_type: EntityKind::Invoice,
                entity_id: invoice_id,
                field_name: "status",
                old_value: Some(&old_status),
                new_value: Some(&new_status),
                reason,
                adjusted_by,
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(invoice_id, error = %e, "Failed to record status adjustment");
            warnings.push(format!("failed to record change for field 'status': {}", e));
        }

        tracing::info!(invoice_id, status, "Invoice status updated");
        Ok(ChangeOutcome { entity: updated, warnings })
    }

    /// 删除发票
    pub async fn delete_invoice(
        &self,
        invoice_id: i64,
        reason: &str,
    ) -> Result<DeleteOutcome, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = InvoiceRepository::new(self.db.clone());
        let current = repo.get(invoice_id).await?.ok_or(AppError::NotFound)?;

        let snapshot = serde_json::to_value(&current).map_err(|e| AppError::Encode(e.to_string()))?;

        if !repo.delete(invoice_id).await? {
            return Err(AppError::NotFound);
        }

        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Invoice,
            invoice_id,
            FIELD_DELETED,
            Some(&snapshot),
            None,
            reason,
        )
        .await;

        tracing::info!(invoice_id, "Invoice deleted");
        Ok(DeleteOutcome { warnings })
    }

    /// 生成下一个发票编号，格式 INV-YYYYMM-NNNN
    pub async fn generate_invoice_number(&self) -> Result<String, AppError> {
        let prefix = format!(
            "{}-{}-",
            INVOICE_NUMBER_PREFIX,
            chrono::Utc::now().format("%Y%m")
        );

        let max = InvoiceRepository::new(self.db.clone())
            .max_number_with_prefix(&prefix)
            .await?;

        let next_seq = max
            .and_then(|number| {
                number
                    .strip_prefix(&prefix)
                    .and_then(|suffix| suffix.parse::<u32>().ok())
            })
            .map(|seq| seq + 1)
            .unwrap_or(1);

        Ok(format!("{}{:04}", prefix, next_seq))
    }

    /// 根据 ID 获取发票
    pub async fn get_invoice(&self, invoice_id: i64) -> Result<Invoice, AppError> {
        InvoiceRepository::new(self.db.clone())
            .get(invoice_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 列出全部发票
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        InvoiceRepository::new(self.db.clone()).list_all().await
    }

    /// 按状态列出发票
    pub async fn list_invoices_by_status(&self, status: &str) -> Result<Vec<Invoice>, AppError> {
        if !VALID_STATUSES.contains(&status) {
            return Err(AppError::InvalidInput(vec![format!(
                "status: must be one of {}",
                VALID_STATUSES.join(", ")
            )]));
        }
        InvoiceRepository::new(self.db.clone())
            .list_by_status(status)
            .await
    }

    /// 发票的变更历史
    pub async fn get_change_history(&self, invoice_id: i64) -> Result<Vec<ChangeEntry>, AppError> {
        self.audit
            .get_change_history(EntityKind::Invoice, invoice_id)
            .await
    }
}
