//! 共享库
//!
//! 包含奖励引擎各组件共用的配置加载、可观测性初始化与错误类型。

pub mod config;
pub mod error;
pub mod observability;
