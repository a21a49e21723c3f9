//! Adjustment domain models (审计记录)

use crate::codec;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 整实体生命周期事件的保留字段名
pub const FIELD_CREATED: &str = "created";
pub const FIELD_DELETED: &str = "deleted";

/// system 角色自动写入时的默认变更事由
pub const DEFAULT_SYSTEM_REASON: &str = "automated system adjustment";

/// 被审计的实体类型
///
/// 存储层只存文本，新增实体类型不需要改表结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Project,
    TimeEntry,
    Invoice,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Project => "project",
            EntityKind::TimeEntry => "time_entry",
            EntityKind::Invoice => "invoice",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作者类别标签，不是个人身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorTag {
    User,
    System,
    Import,
}

impl ActorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorTag::User => "user",
            ActorTag::System => "system",
            ActorTag::Import => "import",
        }
    }
}

impl fmt::Display for ActorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审计记录的存储行，值保持编码后的文本
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdjustmentRow {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: String,
    pub adjusted_by: String,
    pub created_at: DateTime<Utc>,
}

/// 审计记录，值已解码。创建后不可变
#[derive(Debug, Clone, Serialize)]
pub struct Adjustment {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub field_name: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub reason: String,
    pub adjusted_by: String,
    pub created_at: DateTime<Utc>,
}

impl Adjustment {
    /// 从存储行解码
    pub fn from_row(row: AdjustmentRow) -> Result<Self, AppError> {
        let old_value = codec::decode(row.old_value.as_deref())?;
        let new_value = codec::decode(row.new_value.as_deref())?;

        Ok(Adjustment {
            id: row.id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            field_name: row.field_name,
            old_value,
            new_value,
            reason: row.reason,
            adjusted_by: row.adjusted_by,
            created_at: row.created_at,
        })
    }
}

/// 变更历史的展示投影
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEntry {
    pub field: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    pub reason: String,
    pub by: String,
    pub at: DateTime<Utc>,
}

impl From<Adjustment> for ChangeEntry {
    fn from(adj: Adjustment) -> Self {
        ChangeEntry {
            field: adj.field_name,
            old: adj.old_value,
            new: adj.new_value,
            reason: adj.reason,
            by: adj.adjusted_by,
            at: adj.created_at,
        }
    }
}

/// 全局活动流的分页结果
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentPage {
    pub items: Vec<Adjustment>,
    pub total: i64,
}
