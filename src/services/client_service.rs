//! 客户服务
//! 客户 CRUD 的变更集编排：校验 → 差异 → 应用 → 尽力记录审计

use crate::{
    error::AppError,
    models::adjustment::{ChangeEntry, EntityKind, FIELD_CREATED, FIELD_DELETED},
    models::client::{Client, ClientFields},
    repository::{ClientRepository, InvoiceRepository, ProjectRepository},
    services::audit_service::AuditService,
    services::changeset::{self, ChangeOutcome, DeleteOutcome},
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

pub struct ClientService {
    db: SqlitePool,
    audit: Arc<AuditService>,
}

impl ClientService {
    pub fn new(db: SqlitePool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    /// 领域校验，返回全部违规项
    fn validate_fields(fields: &ClientFields) -> Vec<String> {
        let mut errors = match fields.validate() {
            Ok(()) => Vec::new(),
            Err(e) => changeset::flatten_validation(&e),
        };

        if let Some(phone) = &fields.phone {
            if !is_valid_phone(phone) {
                errors.push("phone: invalid phone format".to_string());
            }
        }

        errors
    }

    /// 创建客户，记录一条 "created" 审计
    pub async fn create_client(
        &self,
        fields: ClientFields,
    ) -> Result<ChangeOutcome<Client>, AppError> {
        let errors = Self::validate_fields(&fields);
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        let repo = ClientRepository::new(self.db.clone());
        let client = repo.create(&fields).await?;

        let snapshot = Value::Object(client.fields().to_map());
        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Client,
            client.id,
            FIELD_CREATED,
            None,
            Some(&snapshot),
            "new client registered",
        )
        .await;

        tracing::info!(client_id = client.id, "Client created");
        Ok(ChangeOutcome { entity: client, warnings })
    }

    /// 更新客户，对每个实际变化的字段各记录一条审计
    pub async fn update_client(
        &self,
        client_id: i64,
        updates: &Map<String, Value>,
        reason: &str,
    ) -> Result<ChangeOutcome<Client>, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = ClientRepository::new(self.db.clone());
        let current = repo.get(client_id).await?.ok_or(AppError::NotFound)?;

        let unknown = changeset::unknown_fields(updates, ClientFields::FIELD_NAMES);
        if !unknown.is_empty() {
            return Err(AppError::InvalidInput(unknown));
        }

        let before = current.fields().to_map();
        let merged = changeset::merge_fields(before.clone(), updates);
        let candidate: ClientFields = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::InvalidInput(vec![e.to_string()]))?;

        let errors = Self::validate_fields(&candidate);
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors));
        }

        // 空差异是合法的空操作，不写任何审计
        let changed = changeset::changed_fields(updates, &before, &candidate.to_map());
        if changed.is_empty() {
            return Ok(ChangeOutcome::clean(current));
        }

        repo.update(client_id, &candidate).await?;
        let updated = repo.get(client_id).await?.ok_or(AppError::NotFound)?;

        // 新值取落库后的快照，防止应用阶段的静默规范化被漏记
        let warnings = changeset::log_changes(
            &self.audit,
            EntityKind::Client,
            client_id,
            &changed,
            &before,
            &updated.fields().to_map(),
            reason,
        )
        .await;

        tracing::info!(client_id, changed = changed.len(), "Client updated");
        Ok(ChangeOutcome { entity: updated, warnings })
    }

    /// 删除客户，记录一条携带完整快照的 "deleted" 审计
    /// 名下还有项目或发票时拒绝删除
    pub async fn delete_client(
        &self,
        client_id: i64,
        reason: &str,
    ) -> Result<DeleteOutcome, AppError> {
        changeset::ensure_reason(reason)?;

        let repo = ClientRepository::new(self.db.clone());
        let current = repo.get(client_id).await?.ok_or(AppError::NotFound)?;

        let mut violations = Vec::new();
        let projects = ProjectRepository::new(self.db.clone())
            .count_by_client(client_id)
            .await?;
        if projects > 0 {
            violations.push(format!(
                "cannot delete: {} project(s) still reference this client",
                projects
            ));
        }
        let invoices = InvoiceRepository::new(self.db.clone())
            .count_by_client(client_id)
            .await?;
        if invoices > 0 {
            violations.push(format!(
                "cannot delete: {} invoice(s) still reference this client",
                invoices
            ));
        }
        if !violations.is_empty() {
            return Err(AppError::InvalidInput(violations));
        }

        let snapshot = serde_json::to_value(&current).map_err(|e| AppError::Encode(e.to_string()))?;

        if !repo.delete(client_id).await? {
            return Err(AppError::NotFound);
        }

        let warnings = changeset::log_lifecycle(
            &self.audit,
            EntityKind::Client,
            client_id,
            FIELD_DELETED,
            Some(&snapshot),
            None,
            reason,
        )
        .await;

        tracing::info!(client_id, "Client deleted");
        Ok(DeleteOutcome { warnings })
    }

    /// 根据 ID 获取客户
    pub async fn get_client(&self, client_id: i64) -> Result<Client, AppError> {
        ClientRepository::new(self.db.clone())
            .get(client_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 列出全部客户
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        ClientRepository::new(self.db.clone()).list_all().await
    }

    /// 按名称或邮箱搜索客户，空查询返回全部
    pub async fn search_clients(&self, query: &str, by_email: bool) -> Result<Vec<Client>, AppError> {
        let repo = ClientRepository::new(self.db.clone());
        if query.trim().is_empty() {
            return repo.list_all().await;
        }
        if by_email {
            repo.search_by_email(query).await
        } else {
            repo.search_by_name(query).await
        }
    }

    /// 客户的变更历史
    pub async fn get_change_history(&self, client_id: i64) -> Result<Vec<ChangeEntry>, AppError> {
        self.audit
            .get_change_history(EntityKind::Client, client_id)
            .await
    }
}

/// 电话号码：数字、空格、加号、括号和连字符，7 到 20 位
fn is_valid_phone(phone: &str) -> bool {
    let len = phone.chars().count();
    (7..=20).contains(&len)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | ' ' | '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("010-1111-2222"));
        assert!(is_valid_phone("+82 10 9999 8888"));
        assert!(is_valid_phone("(02) 123-4567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("not-a-phone-number"));
    }
}
