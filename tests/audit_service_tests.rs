//! 审计服务集成测试
//!
//! 覆盖写入前置条件、倒序查询、全局分页和历史投影

use erp_audit::error::AppError;
use erp_audit::models::adjustment::{ActorTag, EntityKind, DEFAULT_SYSTEM_REASON};
use erp_audit::services::audit_service::{AdjustmentParams, AuditService};
use serde_json::json;

mod common;

fn params<'a>(
    entity_id: i64,
    field_name: &'a str,
    old: Option<&'a serde_json::Value>,
    new: Option<&'a serde_json::Value>,
    reason: &'a str,
) -> AdjustmentParams<'a> {
    AdjustmentParams {
        entity_type: EntityKind::Client,
        entity_id,
        field_name,
        old_value: old,
        new_value: new,
        reason,
        adjusted_by: ActorTag::User,
    }
}

#[tokio::test]
async fn test_record_change_assigns_id_and_round_trips() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let old = json!("010-1111-2222");
    let new = json!("010-9999-8888");
    let recorded = audit
        .record_change(params(7, "phone", Some(&old), Some(&new), "customer requested"))
        .await
        .unwrap();

    assert!(recorded.id > 0);
    assert_eq!(recorded.entity_type, "client");
    assert_eq!(recorded.field_name, "phone");

    let fetched = audit.get_by_id(recorded.id).await.unwrap();
    assert_eq!(fetched.old_value, Some(old));
    assert_eq!(fetched.new_value, Some(new));
    assert_eq!(fetched.reason, "customer requested");
    assert_eq!(fetched.adjusted_by, "user");
}

#[tokio::test]
async fn test_record_change_requires_reason_for_user_actor() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let new = json!("x");
    let result = audit
        .record_change(params(1, "name", None, Some(&new), "   "))
        .await;

    assert!(matches!(result, Err(AppError::ReasonRequired)));
}

#[tokio::test]
async fn test_system_actor_gets_default_reason() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let old = json!("draft");
    let new = json!("overdue");
    let recorded = audit
        .record_change(AdjustmentParams {
            entity_type: EntityKind::Invoice,
            entity_id: 3,
            field_name: "status",
            old_value: Some(&old),
            new_value: Some(&new),
            reason: "",
            adjusted_by: ActorTag::System,
        })
        .await
        .unwrap();

    assert_eq!(recorded.reason, DEFAULT_SYSTEM_REASON);
    assert_eq!(recorded.adjusted_by, "system");
}

#[tokio::test]
async fn test_record_change_rejects_empty_field_name() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let result = audit.record_change(params(1, "  ", None, None, "reason")).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_get_by_id_not_found() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let result = audit.get_by_id(9999).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_get_by_reference_descending_order() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let values: Vec<_> = (0..3).map(|i| json!(format!("v{}", i))).collect();
    let mut ids = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let old = if i == 0 { None } else { Some(&values[i - 1]) };
        let rec = audit
            .record_change(params(7, "name", old, Some(value), "renamed"))
            .await
            .unwrap();
        ids.push(rec.id);
    }

    // 另一个实体的记录不应混入
    let noise = json!("other");
    audit
        .record_change(params(8, "name", None, Some(&noise), "other entity"))
        .await
        .unwrap();

    let history = audit.get_by_reference(EntityKind::Client, 7).await.unwrap();
    assert_eq!(history.len(), 3);
    let fetched_ids: Vec<_> = history.iter().map(|a| a.id).collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(fetched_ids, expected);

    // 记录不可变：再次查询内容不变
    let again = audit.get_by_reference(EntityKind::Client, 7).await.unwrap();
    assert_eq!(again.len(), 3);
    assert_eq!(again[0].new_value, history[0].new_value);
}

#[tokio::test]
async fn test_get_all_pagination_window_and_total() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let mut ids = Vec::new();
    for i in 0..5 {
        let value = json!(i);
        let rec = audit
            .record_change(params(i, "created", None, Some(&value), "seeded"))
            .await
            .unwrap();
        ids.push(rec.id);
    }
    ids.reverse(); // 期望的全局倒序

    let page = audit.get_all(2, 1).await.unwrap();
    assert_eq!(page.total, 5);
    let page_ids: Vec<_> = page.items.iter().map(|a| a.id).collect();
    assert_eq!(page_ids, ids[1..3].to_vec());

    // 超出范围返回空列表而不是错误，总数不变
    let beyond = audit.get_all(10, 100).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);

    // limit 为 0 合法
    let empty = audit.get_all(0, 0).await.unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 5);
}

#[tokio::test]
async fn test_get_all_rejects_negative_bounds() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let result = audit.get_all(-1, 0).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let result = audit.get_all(10, -5).await;
    match result {
        Err(AppError::InvalidInput(violations)) => {
            assert_eq!(violations, vec!["offset: must be >= 0".to_string()]);
        }
        other => panic!("expected InvalidInput, got {:?}", other.map(|p| p.total)),
    }
}

#[tokio::test]
async fn test_one_sided_values_stay_one_sided() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let snapshot = json!({"id": 42, "name": "Website Revamp", "status": "active"});
    let recorded = audit
        .record_change(AdjustmentParams {
            entity_type: EntityKind::Project,
            entity_id: 42,
            field_name: "deleted",
            old_value: Some(&snapshot),
            new_value: None,
            reason: "contract cancelled",
            adjusted_by: ActorTag::User,
        })
        .await
        .unwrap();

    let fetched = audit.get_by_id(recorded.id).await.unwrap();
    assert_eq!(fetched.old_value, Some(snapshot));
    assert_eq!(fetched.new_value, None);
}

#[tokio::test]
async fn test_change_history_is_projection_of_reference_query() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    let old = json!("Acme");
    let new = json!("Acme Corp");
    audit
        .record_change(params(7, "name", Some(&old), Some(&new), "rebranding"))
        .await
        .unwrap();

    let records = audit.get_by_reference(EntityKind::Client, 7).await.unwrap();
    let history = audit
        .get_change_history(EntityKind::Client, 7)
        .await
        .unwrap();

    assert_eq!(history.len(), records.len());
    assert_eq!(history[0].field, records[0].field_name);
    assert_eq!(history[0].old, records[0].old_value);
    assert_eq!(history[0].new, records[0].new_value);
    assert_eq!(history[0].reason, records[0].reason);
    assert_eq!(history[0].by, records[0].adjusted_by);
    assert_eq!(history[0].at, records[0].created_at);
}

#[tokio::test]
async fn test_record_change_store_failure_is_audit_unavailable() {
    let pool = common::setup_test_db().await;
    let audit = AuditService::new(pool.clone());

    sqlx::query("DROP TABLE adjustments")
        .execute(&pool)
        .await
        .unwrap();

    let new = json!("x");
    let result = audit
        .record_change(params(1, "name", None, Some(&new), "reason"))
        .await;

    assert!(matches!(result, Err(AppError::AuditUnavailable(_))));
}
