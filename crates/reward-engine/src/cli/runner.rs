//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑，输出 JSON 到标准输出。

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::audit::AuditFinding;
use crate::commit::CommitReceipt;
use crate::engine::RewardEngine;
use crate::models::{CardResult, DisplayMode};
use crate::registry::CounterRegistry;
use crate::store::{JsonFileProfileStore, ProfileStore};
use crate::tier::TierAdvance;

use super::commands::Commands;

/// 命令执行器
///
/// 持有引擎与档案存储，作为 CLI 与引擎之间的桥梁。
pub struct CommandRunner {
    engine: RewardEngine,
    store: JsonFileProfileStore,
    default_mode: DisplayMode,
}

impl CommandRunner {
    pub fn new(engine: RewardEngine, store: JsonFileProfileStore, default_mode: DisplayMode) -> Self {
        Self {
            engine,
            store,
            default_mode,
        }
    }

    /// 从规则文件与档案路径创建
    pub fn from_paths(rules: &Path, profile: &Path, default_mode: &str) -> Result<Self> {
        let engine = RewardEngine::from_path(rules)
            .with_context(|| format!("加载规则配置失败: {}", rules.display()))?;
        let default_mode = default_mode
            .parse()
            .with_context(|| format!("无效的默认展示口径: {}", default_mode))?;

        Ok(Self::new(engine, JsonFileProfileStore::new(profile), default_mode))
    }

    /// 执行子命令并输出结果
    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Evaluate {
                amount,
                category,
                mode,
            } => print_json(&self.run_evaluate(amount, &category, mode.as_deref())?),
            Commands::Commit {
                card,
                amount,
                category,
                mode,
            } => print_json(&self.run_commit(&card, amount, &category, mode.as_deref())?),
            Commands::Registry => print_json(self.run_registry()),
            Commands::AdvanceTier => print_json(&self.run_advance_tier()?),
            Commands::Audit => print_json(self.run_audit()),
        }
    }

    pub fn run_evaluate(
        &self,
        amount: f64,
        category: &str,
        mode: Option<&str>,
    ) -> Result<Vec<CardResult>> {
        let mode = self.display_mode(mode)?;
        let profile = self.store.load().context("读取用户档案失败")?;
        Ok(self.engine.evaluate_all(amount, category, mode, &profile)?)
    }

    /// 重新评估指定卡片后记账，保证账本与评估一致
    pub fn run_commit(
        &self,
        card_id: &str,
        amount: f64,
        category: &str,
        mode: Option<&str>,
    ) -> Result<CommitReceipt> {
        let mode = self.display_mode(mode)?;
        let mut profile = self.store.load().context("读取用户档案失败")?;

        let result = self
            .engine
            .evaluate_card(card_id, amount, category, mode, &profile)?;
        let receipt = self.engine.commit(&result, &mut profile, &self.store)?;

        info!(
            card_id,
            path = %self.store.path().display(),
            "档案已更新"
        );
        Ok(receipt)
    }

    pub fn run_registry(&self) -> &CounterRegistry {
        self.engine.registry()
    }

    pub fn run_advance_tier(&self) -> Result<TierAdvance> {
        let mut profile = self.store.load().context("读取用户档案失败")?;
        Ok(self.engine.advance_tier(&mut profile, &self.store)?)
    }

    pub fn run_audit(&self) -> &[AuditFinding] {
        self.engine.audit()
    }

    fn display_mode(&self, requested: Option<&str>) -> Result<DisplayMode> {
        match requested {
            Some(mode) => Ok(mode.parse()?),
            None => Ok(self.default_mode),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, UsageKey};
    use crate::test_utils::sample_config;

    fn runner(dir: &Path) -> CommandRunner {
        let rules = dir.join("rules.yaml");
        std::fs::write(&rules, serde_yaml::to_string(&sample_config()).unwrap()).unwrap();
        CommandRunner::from_paths(&rules, &dir.join("profile.json"), "cash").unwrap()
    }

    #[test]
    fn test_evaluate_with_empty_profile() {
        let dir = tempfile::tempdir().unwrap();
        let results = runner(dir.path()).run_evaluate(1000.0, "dining", None).unwrap();
        assert_eq!(results[0].card_id, "dining_reward");
        assert!((results[0].display_value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_commit_writes_profile() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        let receipt = runner
            .run_commit("dining_reward", 1000.0, "dining", None)
            .unwrap();
        assert_eq!(receipt.value_of(&UsageKey::configured("k")), Some(100.0));

        let saved: Profile = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("profile.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.stats.transaction_count, 1);
        assert_eq!(saved.ledger.get(&UsageKey::configured("k")), 100.0);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            runner(dir.path())
                .run_evaluate(100.0, "dining", Some("points"))
                .is_err()
        );
    }

    #[test]
    fn test_advance_tier_persists() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let advance = runner.run_advance_tier().unwrap();
        assert_eq!(advance.level, 1);
        assert_eq!(runner.run_advance_tier().unwrap().level, 2);
    }
}
