//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `evaluate` - 评估一笔交易在全部持有卡片上的回赠并排序
//! - `commit` - 以指定卡片记账
//! - `registry` - 输出计数周期登记表
//! - `advance-tier` - 等级晋升
//! - `audit` - 输出配置审计结果
//!
//! # 使用示例
//!
//! ```bash
//! # 评估一笔餐饮消费
//! reward-engine evaluate --amount 1000 --category dining
//!
//! # 按里数口径评估
//! reward-engine evaluate -a 1000 -c overseas_jp --mode miles
//!
//! # 以指定卡片记账
//! reward-engine --profile data/profile.json commit --card everyday -a 1000 -c dining
//!
//! # 输出登记表
//! reward-engine --rules config/rules.yaml registry
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
