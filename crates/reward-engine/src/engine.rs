//! 奖励引擎
//!
//! 组合规则目录、评估器、排序、账本提交与等级晋升，对外提供统一入口。

use std::path::Path;
use std::time::Instant;

use metrics::{counter, histogram};
use reward_shared::observability::metrics::{
    EVALUATION_DURATION_SECONDS, EVALUATIONS_TOTAL, TIER_ADVANCES_TOTAL,
};
use tracing::{info, instrument, warn};

use crate::audit::AuditFinding;
use crate::catalog::RewardCatalog;
use crate::commit::{CommitReceipt, LedgerCommitter};
use crate::error::{RewardError, Result};
use crate::evaluator::RuleEvaluator;
use crate::loader::load_config;
use crate::models::{CardResult, DisplayMode, Profile, RewardConfig};
use crate::ranking::rank;
use crate::registry::{CounterRegistry, build_registry};
use crate::store::ProfileStore;
use crate::tier::{TierAdvance, TierProgression};

pub struct RewardEngine {
    catalog: RewardCatalog,
    registry: CounterRegistry,
}

impl RewardEngine {
    pub fn new(config: RewardConfig) -> Self {
        let registry = build_registry(&config);
        let catalog = RewardCatalog::build(config);
        Self { catalog, registry }
    }

    /// 从 JSON/YAML 文件创建
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load_config(path)?))
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    /// 计数周期登记表
    pub fn registry(&self) -> &CounterRegistry {
        &self.registry
    }

    /// 配置审计结果
    pub fn audit(&self) -> &[AuditFinding] {
        self.catalog.findings()
    }

    /// 评估全部持有的卡片并按展示口径排序
    #[instrument(skip(self, profile))]
    pub fn evaluate_all(
        &self,
        amount: f64,
        raw_category: &str,
        display_mode: DisplayMode,
        profile: &Profile,
    ) -> Result<Vec<CardResult>> {
        self.validate(amount, profile)?;
        let start = Instant::now();

        let evaluator = RuleEvaluator::new(&self.catalog);
        let results: Vec<CardResult> = self
            .catalog
            .owned_cards()
            .map(|card| {
                evaluator.evaluate(
                    amount,
                    raw_category,
                    display_mode,
                    card,
                    &profile.ledger,
                    &profile.settings,
                )
            })
            .collect();

        counter!(EVALUATIONS_TOTAL).increment(results.len() as u64);
        histogram!(EVALUATION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        let ranked = rank(results, display_mode);
        info!(
            cards = ranked.len(),
            best = ranked.first().map(|r| r.card_id.as_str()).unwrap_or("-"),
            "评估完成"
        );

        Ok(ranked)
    }

    /// 评估单张卡（卡片不要求已持有）
    pub fn evaluate_card(
        &self,
        card_id: &str,
        amount: f64,
        raw_category: &str,
        display_mode: DisplayMode,
        profile: &Profile,
    ) -> Result<CardResult> {
        self.validate(amount, profile)?;
        let card = self
            .catalog
            .card(card_id)
            .ok_or_else(|| RewardError::CardNotFound(card_id.to_string()))?;

        counter!(EVALUATIONS_TOTAL).increment(1);
        Ok(RuleEvaluator::new(&self.catalog).evaluate(
            amount,
            raw_category,
            display_mode,
            card,
            &profile.ledger,
            &profile.settings,
        ))
    }

    /// 记账：结果需为本引擎评估所得，且未经修改
    pub fn commit(
        &self,
        result: &CardResult,
        profile: &mut Profile,
        store: &dyn ProfileStore,
    ) -> Result<CommitReceipt> {
        if self.catalog.card(&result.card_id).is_none() {
            return Err(RewardError::CardNotFound(result.card_id.clone()));
        }
        LedgerCommitter::commit(result, profile, store)
    }

    /// 等级晋升并落盘，失败时档案保持不变
    #[instrument(skip(self, profile, store), fields(level = profile.settings.tier_level))]
    pub fn advance_tier(
        &self,
        profile: &mut Profile,
        store: &dyn ProfileStore,
    ) -> Result<TierAdvance> {
        let program = self
            .catalog
            .config()
            .tier_program
            .as_ref()
            .ok_or(RewardError::TierProgramMissing)?;

        let mut staged = profile.clone();
        let advance = TierProgression::advance(&mut staged.ledger, &mut staged.settings, program);

        if let Err(e) = store.save(&staged) {
            warn!(error = %e, "档案写入失败，等级未变更");
            return Err(e);
        }

        *profile = staged;
        counter!(TIER_ADVANCES_TOTAL).increment(1);
        info!(
            previous_level = advance.previous_level,
            level = advance.level,
            at_max = advance.at_max,
            "等级已晋升"
        );

        Ok(advance)
    }

    fn validate(&self, amount: f64, profile: &Profile) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RewardError::InvalidAmount(amount));
        }
        profile
            .settings
            .validate_allocation(self.catalog.config().allocation.budget)
    }
}
