//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 信用卡奖励规则引擎命令行工具
///
/// 未指定的路径与展示口径取自配置文件（config/default.toml）及 REWARD_ 环境变量。
#[derive(Parser, Debug)]
#[command(name = "reward-engine")]
#[command(version, about = "信用卡奖励规则引擎")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 规则配置文件（JSON/YAML）
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// 用户档案文件（JSON）
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 评估一笔交易，按估值降序输出全部持有卡片的结果
    Evaluate {
        /// 交易金额
        #[arg(short, long)]
        amount: f64,

        /// 原始交易类别
        #[arg(short, long)]
        category: String,

        /// 展示口径（cash, miles）
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// 重新评估指定卡片并记账
    Commit {
        /// 卡片 ID
        #[arg(long)]
        card: String,

        /// 交易金额
        #[arg(short, long)]
        amount: f64,

        /// 原始交易类别
        #[arg(short, long)]
        category: String,

        /// 展示口径（cash, miles）
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// 输出计数周期登记表（JSON）
    Registry,

    /// 等级晋升并清零等级计数
    AdvanceTier,

    /// 输出配置审计结果
    Audit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_evaluate() {
        let cli = Cli::parse_from(["reward-engine", "evaluate", "-a", "1000", "-c", "dining"]);
        match cli.command {
            Commands::Evaluate {
                amount,
                category,
                mode,
            } => {
                assert_eq!(amount, 1000.0);
                assert_eq!(category, "dining");
                assert!(mode.is_none());
            }
            _ => panic!("预期 Evaluate 命令"),
        }
    }

    #[test]
    fn test_cli_parse_commit() {
        let cli = Cli::parse_from([
            "reward-engine",
            "commit",
            "--card",
            "everyday",
            "--amount",
            "250.5",
            "--category",
            "online",
            "--mode",
            "miles",
        ]);
        match cli.command {
            Commands::Commit {
                card,
                amount,
                category,
                mode,
            } => {
                assert_eq!(card, "everyday");
                assert_eq!(amount, 250.5);
                assert_eq!(category, "online");
                assert_eq!(mode.as_deref(), Some("miles"));
            }
            _ => panic!("预期 Commit 命令"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from([
            "reward-engine",
            "--log-level",
            "debug",
            "--rules",
            "rules.json",
            "--profile",
            "/tmp/profile.json",
            "advance-tier",
        ]);

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.rules, Some(PathBuf::from("rules.json")));
        assert_eq!(cli.profile, Some(PathBuf::from("/tmp/profile.json")));
        assert!(matches!(cli.command, Commands::AdvanceTier));
    }
}
