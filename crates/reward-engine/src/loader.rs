//! 配置文件加载
//!
//! 按扩展名选择 JSON 或 YAML 解析。

use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::error::{RewardError, Result};
use crate::models::RewardConfig;

#[instrument(skip_all)]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RewardConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let config: RewardConfig = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => return Err(RewardError::UnsupportedFormat(path.display().to_string())),
    };

    info!(
        path = %path.display(),
        cards = config.cards.len(),
        rules = config.rules.len(),
        "奖励配置已加载"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("rules.yml");
        fs::write(&yaml, "rules:\n  - id: base\n    kind: always-base\n    rate: 0.004\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().rules.len(), 1);

        let json = dir.path().join("rules.JSON");
        fs::write(&json, r#"{"cards": [{"id": "red", "name": "Red", "currency": "rc"}]}"#).unwrap();
        let config = load_config(&json).unwrap();
        assert_eq!(config.cards[0].id, "red");
        assert!(!config.cards[0].owned);
    }

    #[test]
    fn test_misspelled_cap_mode_keeps_other_rules() {
        use crate::engine::RewardEngine;
        use crate::models::{DisplayMode, EntryStatus, Profile};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        fs::write(
            &path,
            r#"
cards:
  - id: red
    name: Red
    currency: cash
    owned: true
    rules: [base, dining]
rules:
  - id: base
    kind: always-base
    rate: 0.004
  - id: dining
    kind: flat-category
    categories: [dining]
    rate: 0.1
    cap_key: k
    cap_limit: 300
    cap_mode: rewards
conversions:
  cash:
    cash_per_unit: 1.0
"#,
        )
        .unwrap();

        let engine = RewardEngine::from_path(&path).unwrap();
        let result = engine
            .evaluate_card("red", 1000.0, "dining", DisplayMode::Cash, &Profile::default())
            .unwrap();

        assert_eq!(result.entry("dining").unwrap().status, EntryStatus::Unsupported);
        assert!((result.total_rate - 0.004).abs() < 1e-12);
        assert_eq!(engine.audit()[0].code(), "UNSUPPORTED_RULE");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(load_config(&path).unwrap_err().code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/rules.yaml").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }
}
