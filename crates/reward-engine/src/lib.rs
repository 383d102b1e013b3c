//! 信用卡奖励规则引擎
//!
//! 估算并记录用户每笔交易在各张信用卡上可获得的回赠（现金或里数），支持：
//! - 按卡片、产品线偏好与层级解析交易类别
//! - 按声明顺序评估规则，处理封顶、任务门槛与等级回赠
//! - 换算为现金/里数并排序
//! - 与评估结果一致的账本提交与等级晋升
//! - 计数周期登记表与配置审计

pub mod audit;
pub mod catalog;
pub mod category;
pub mod cli;
pub mod commit;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod models;
pub mod ranking;
pub mod registry;
pub mod store;
pub mod test_utils;
pub mod tier;

pub use audit::AuditFinding;
pub use catalog::RewardCatalog;
pub use category::CategoryResolver;
pub use commit::{CommitReceipt, LedgerCommitter};
pub use compiler::{CompiledRule, RuleBody, RuleCompiler};
pub use engine::RewardEngine;
pub use error::{Result, RewardError};
pub use evaluator::RuleEvaluator;
pub use loader::load_config;
pub use models::{
    CapTracking, CardProfile, CardResult, DisplayMode, Profile, RewardConfig, RuleDefinition,
    Settings, UsageKey, UsageLedger,
};
pub use ranking::rank;
pub use registry::{CounterRegistry, RegistryEntry, RegistryPriority, build_registry};
pub use store::{JsonFileProfileStore, MemoryProfileStore, ProfileStore};
pub use tier::{TierAdvance, TierProgression};
