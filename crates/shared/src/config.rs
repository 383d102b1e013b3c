//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::observability::ObservabilityConfig;

/// 奖励引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 卡片与规则定义文件（JSON 或 YAML，按扩展名识别）
    pub rules_path: PathBuf,
    /// 用户档案（设置、用量账本、统计）的持久化文件
    pub profile_path: PathBuf,
    /// 默认展示口径：cash 或 miles
    pub display_mode: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("config/rules.yaml"),
            profile_path: PathBuf::from("data/profile.json"),
            display_mode: "cash".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（REWARD_ 前缀，双下划线分隔层级，如 REWARD_ENGINE__RULES_PATH -> engine.rules_path）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        // .env 文件可选，不存在时忽略
        let _ = dotenvy::dotenv();

        let env = std::env::var("REWARD_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from_dir(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置（便于测试注入临时目录）
    pub fn load_from_dir(
        service_name: &str,
        env: &str,
        config_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("REWARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.observability.service_name = config.service_name.clone();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.display_mode, "cash");
        assert_eq!(config.observability.log_level, "info");
        assert!(config.environment.is_empty());
    }

    #[test]
    fn test_load_layers_service_file_over_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [engine]
            rules_path = "rules/base.yaml"
            display_mode = "cash"
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("reward-engine.toml"),
            r#"
            [engine]
            display_mode = "miles"
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from_dir("reward-engine", "test", dir.path()).unwrap();

        assert_eq!(config.service_name, "reward-engine");
        assert_eq!(config.environment, "test");
        assert_eq!(config.engine.rules_path, PathBuf::from("rules/base.yaml"));
        assert_eq!(config.engine.display_mode, "miles");
        assert_eq!(config.observability.service_name, "reward-engine");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_dir("reward-engine", "development", dir.path()).unwrap();
        assert_eq!(config.engine.profile_path, PathBuf::from("data/profile.json"));
    }
}
