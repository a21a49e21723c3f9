//! 变更集编排公共逻辑
//! 各领域服务共享的「校验 → 差异 → 应用 → 尽力记录」模式

use crate::{
    error::AppError,
    models::adjustment::{ActorTag, EntityKind},
    services::audit_service::{AdjustmentParams, AuditService},
};
use serde_json::{Map, Value};

/// 更新/创建成功的结果：实体快照加上审计阶段产生的警告
#[derive(Debug, Clone)]
pub struct ChangeOutcome<T> {
    pub entity: T,
    pub warnings: Vec<String>,
}

impl<T> ChangeOutcome<T> {
    pub fn clean(entity: T) -> Self {
        Self {
            entity,
            warnings: Vec::new(),
        }
    }
}

/// 删除成功的结果
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub warnings: Vec<String>,
}

/// 用户发起的变更必须带非空事由
pub fn ensure_reason(reason: &str) -> Result<(), AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::ReasonRequired);
    }
    Ok(())
}

/// 更新请求里出现的未知字段名，每个一条违规
pub fn unknown_fields(proposed: &Map<String, Value>, allowed: &[&str]) -> Vec<String> {
    proposed
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .map(|key| format!("{}: unknown field", key))
        .collect()
}

/// 把请求中出现的字段覆盖到当前快照上
/// 请求中缺席的字段保持不变；显式的 null 表示「设为 null」
pub fn merge_fields(
    mut current: Map<String, Value>,
    proposed: &Map<String, Value>,
) -> Map<String, Value> {
    for (key, value) in proposed {
        current.insert(key.clone(), value.clone());
    }
    current
}

/// 差异集：请求中出现、且规范化后的值与当前值不同的字段
/// 值相等比较，不是同一性比较
pub fn changed_fields(
    proposed: &Map<String, Value>,
    before: &Map<String, Value>,
    after: &Map<String, Value>,
) -> Vec<String> {
    proposed
        .keys()
        .filter(|key| before.get(key.as_str()) != after.get(key.as_str()))
        .cloned()
        .collect()
}

/// validator 校验结果展平为违规列表，保留全部违规而不仅是第一条
pub fn flatten_validation(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut out: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    out.sort();
    out
}

/// 快照值转为审计的一侧：实体快照里的 null 表示该字段无值，
/// 存储为真正的 NULL（单侧差异语义，与原始数据一致）
fn audit_side<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|v| !v.is_null())
}

/// 对差异集中的每个字段各记录一条审计，失败降级为警告
///
/// 主变更此时已经提交，这里的任何失败都不往上传播为错误，
/// 只打 warn 日志并附在成功结果上返回。
pub async fn log_changes(
    audit: &AuditService,
    entity_type: EntityKind,
    entity_id: i64,
    fields: &[String],
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    reason: &str,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for field in fields {
        let result = audit
            .record_change(AdjustmentParams {
                entity_type,
                entity_id,
                field_name: field,
                old_value: audit_side(before, field),
                new_value: audit_side(after, field),
                reason,
                adjusted_by: ActorTag::User,
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(
                entity_type = %entity_type,
                entity_id,
                field = %field,
                error = %e,
                "Failed to record adjustment, primary change is already committed"
            );
            warnings.push(format!("failed to record change for field '{}': {}", field, e));
        }
    }

    warnings
}

/// 记录一条整实体生命周期事件（"created" / "deleted"），失败降级为警告
pub async fn log_lifecycle(
    audit: &AuditService,
    entity_type: EntityKind,
    entity_id: i64,
    field_name: &str,
    old_value: Option<&Value>,
    new_value: Option<&Value>,
    reason: &str,
) -> Vec<String> {
    let result = audit
        .record_change(AdjustmentParams {
            entity_type,
            entity_id,
            field_name,
            old_value,
            new_value,
            reason,
            adjusted_by: ActorTag::User,
        })
        .await;

    match result {
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(
                entity_type = %entity_type,
                entity_id,
                event = field_name,
                error = %e,
                "Failed to record lifecycle adjustment, primary change is already committed"
            );
            vec![format!("failed to record '{}' event: {}", field_name, e)]
        }
    }
}
