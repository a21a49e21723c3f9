//! 数据模型模块
//! 审计记录 + 四类领域实体（客户、项目、工时、发票）

pub mod adjustment;
pub mod client;
pub mod invoice;
pub mod project;
pub mod time_entry;
