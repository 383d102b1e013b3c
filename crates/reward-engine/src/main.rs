//! 奖励引擎命令行入口
//!
//! 评估交易回赠、记账、输出登记表与审计结果。

use anyhow::Result;
use clap::Parser;
use reward_shared::{config::AppConfig, observability};
use tracing::{info, warn};

use reward_engine::cli::{Cli, CommandRunner};

const SERVICE_NAME: &str = "reward-engine";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. 加载配置：config/default.toml -> config/{env}.toml -> config/reward-engine.toml -> REWARD_ 环境变量
    let (config, config_error) = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // 2. 命令行日志级别优先于配置文件
    let obs_config = config
        .observability
        .clone()
        .with_service_name(SERVICE_NAME)
        .with_log_level(cli.log_level.as_deref());
    let _guard = observability::init(&obs_config)?;

    if let Some(e) = config_error {
        warn!("Failed to load config, using defaults: {}", e);
    }
    info!(environment = %config.environment, "Configuration loaded");

    // 3. 命令行路径优先于配置文件
    let rules_path = cli.rules.unwrap_or(config.engine.rules_path);
    let profile_path = cli.profile.unwrap_or(config.engine.profile_path);

    let runner = CommandRunner::from_paths(&rules_path, &profile_path, &config.engine.display_mode)?;
    runner.run(cli.command)
}
