//! 自由职业者 ERP 审计核心库
//! 提供字段级变更审计（adjustments）与各领域服务的变更集编排

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;
