//! 规则评估器
//!
//! 单笔交易 × 单张卡的有序规则 × 账本 -> 奖励明细。评估只读账本，不产生副作用。
//! 封顶、不支持的口径、未知规则都作为结果注记返回，每张卡总能得到结果。

use tracing::debug;

use crate::catalog::RewardCatalog;
use crate::compiler::{CapRule, CompiledRule, RuleBody};
use crate::models::{
    BreakdownEntry, CapMode, CapTracking, CardProfile, CardResult, DisplayMode, EntryStatus,
    MissionTag, Settings, TierTracking, UsageKey, UsageLedger,
};

/// 门槛检查结果
#[derive(Debug, Clone, Copy, PartialEq)]
enum GateOutcome {
    Pass,
    Skip,
    /// 任务门槛未达成：当前进度 / 要求
    Locked { progress: f64, required: f64 },
}

/// 规则贡献累加器
#[derive(Debug, Default)]
struct Contributions {
    total_rate: f64,
    breakdown: Vec<BreakdownEntry>,
    spending_cap: Option<UsageKey>,
    reward_cap: Option<(UsageKey, Option<UsageKey>, f64)>,
    tier: Option<TierTracking>,
    mission_tags: Vec<MissionTag>,
}

impl Contributions {
    fn push(&mut self, rule: &CompiledRule, status: EntryStatus, rate: f64) {
        self.total_rate += rate;
        self.breakdown
            .push(BreakdownEntry::new(&rule.id, &rule.label, status, rate));
    }

    fn push_with_note(
        &mut self,
        rule: &CompiledRule,
        status: EntryStatus,
        rate: f64,
        note: String,
    ) {
        self.total_rate += rate;
        self.breakdown
            .push(BreakdownEntry::new(&rule.id, &rule.label, status, rate).with_note(note));
    }

    /// 奖励口径优先；同一口径内以声明顺序第一条产生贡献的规则为准
    fn cap_tracking(&mut self) -> CapTracking {
        if let Some((key, secondary, amount)) = self.reward_cap.take() {
            return CapTracking::RewardCap {
                key,
                secondary,
                amount,
            };
        }
        match self.spending_cap.take() {
            Some(key) => CapTracking::SpendingCap { key },
            None => CapTracking::None,
        }
    }
}

/// 规则评估器
pub struct RuleEvaluator<'a> {
    catalog: &'a RewardCatalog,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(catalog: &'a RewardCatalog) -> Self {
        Self { catalog }
    }

    /// 评估单张卡
    ///
    /// `amount` 由调用方保证为正数。
    pub fn evaluate(
        &self,
        amount: f64,
        raw_category: &str,
        display_mode: DisplayMode,
        card: &CardProfile,
        ledger: &UsageLedger,
        settings: &Settings,
    ) -> CardResult {
        let category = self
            .catalog
            .resolver()
            .resolve(&card.id, raw_category, settings);
        let replacer = self.find_replacer(card, &category, amount, ledger, settings);

        let mut acc = Contributions::default();

        for (rule_id, rule) in self.catalog.card_rules(card) {
            let Some(rule) = rule else {
                debug!(card_id = %card.id, rule_id, "规则不存在");
                acc.breakdown.push(
                    BreakdownEntry::new(rule_id, rule_id, EntryStatus::Unsupported, 0.0)
                        .with_note("规则不存在"),
                );
                continue;
            };

            if let RuleBody::Unsupported { reason } = &rule.body {
                acc.push_with_note(rule, EntryStatus::Unsupported, 0.0, reason.clone());
                continue;
            }

            match self.check_gates(rule, amount, &category, ledger, settings) {
                GateOutcome::Pass => {}
                GateOutcome::Skip => {
                    debug!(card_id = %card.id, rule_id, "门槛未满足，跳过");
                    continue;
                }
                GateOutcome::Locked { progress, required } => {
                    acc.push_with_note(
                        rule,
                        EntryStatus::Locked,
                        0.0,
                        format!("任务进度 {:.2}/{:.2}", progress, required),
                    );
                    continue;
                }
            }

            match &rule.body {
                RuleBody::FlatCategory { rate, cap, .. } => {
                    if self.matches(rule, &category) {
                        self.apply_flat(rule, *rate, cap.as_ref(), amount, ledger, &mut acc);
                    }
                }
                RuleBody::AlwaysBase { rate } => match &replacer {
                    Some(replacer_id) => {
                        debug!(card_id = %card.id, rule_id, replacer = %replacer_id, "基础回赠被取代");
                    }
                    None => acc.push(rule, EntryStatus::Active, *rate),
                },
                RuleBody::TieredCapped => {
                    self.apply_tier(rule, amount, &category, ledger, settings, &mut acc);
                }
                RuleBody::FlexibleAllocation { rate_per_unit } => {
                    self.apply_flexible(rule, *rate_per_unit, &category, settings, &mut acc);
                }
                RuleBody::FixedBonusAllocation {
                    rate_per_unit,
                    units,
                } => {
                    if self.in_any_bucket(rule, &category) {
                        acc.push(rule, EntryStatus::Active, units * rate_per_unit);
                    }
                }
                RuleBody::MissionObserver { mission_id } => {
                    // 未配置匹配集合时全部消费都合资格
                    let eligible = rule.categories.is_empty() || self.matches(rule, &category);
                    acc.mission_tags.push(MissionTag {
                        mission_id: mission_id.clone(),
                        eligible,
                    });
                }
                RuleBody::Unsupported { .. } => {}
            }
        }

        let total_rate = acc.total_rate;
        let native_value = total_rate * amount;
        let cap_tracking = acc.cap_tracking();

        let mut result = CardResult {
            card_id: card.id.clone(),
            card_name: card.name.clone(),
            amount,
            raw_category: raw_category.to_string(),
            category,
            currency: card.currency.clone(),
            total_rate,
            native_value,
            cash_value: 0.0,
            miles_value: 0.0,
            display_mode,
            display_value: 0.0,
            breakdown: acc.breakdown,
            cap_tracking,
            tier_tracking: acc.tier,
            mission_tags: acc.mission_tags,
            replacer,
            unsupported: None,
            conversion: None,
        };
        self.convert(&mut result);

        debug!(
            card_id = %result.card_id,
            category = %result.category,
            total_rate = result.total_rate,
            display_value = result.display_value,
            "卡片评估完成"
        );

        result
    }

    /// 第一条命中且门槛通过的 replace 规则
    fn find_replacer(
        &self,
        card: &CardProfile,
        category: &str,
        amount: f64,
        ledger: &UsageLedger,
        settings: &Settings,
    ) -> Option<String> {
        self.catalog
            .card_rules(card)
            .filter_map(|(_, rule)| rule)
            .find(|rule| {
                rule.is_replacer()
                    && self.matches(rule, category)
                    && self.check_gates(rule, amount, category, ledger, settings)
                        == GateOutcome::Pass
            })
            .map(|rule| rule.id.clone())
    }

    fn check_gates(
        &self,
        rule: &CompiledRule,
        amount: f64,
        category: &str,
        ledger: &UsageLedger,
        settings: &Settings,
    ) -> GateOutcome {
        let gates = &rule.gates;

        if let Some(toggle) = &gates.toggle {
            if !settings.is_enabled(toggle) {
                return GateOutcome::Skip;
            }
        }
        if gates.min_single_spend.is_some_and(|min| amount < min) {
            return GateOutcome::Skip;
        }
        if gates.min_spend.is_some_and(|min| amount < min) {
            return GateOutcome::Skip;
        }
        if let Some(mission) = &gates.mission {
            let progress = ledger.get(&mission.key);
            if progress < mission.required {
                if self.matches(rule, category) {
                    return GateOutcome::Locked {
                        progress,
                        required: mission.required,
                    };
                }
                return GateOutcome::Skip;
            }
        }

        GateOutcome::Pass
    }

    fn matches(&self, rule: &CompiledRule, category: &str) -> bool {
        self.catalog.resolver().is_match(&rule.categories, category)
    }

    fn in_any_bucket(&self, rule: &CompiledRule, category: &str) -> bool {
        if !rule.categories.is_empty() && !self.matches(rule, category) {
            return false;
        }
        self.catalog
            .resolver()
            .bucket_of(&self.catalog.config().allocation, category)
            .is_some()
    }

    fn apply_flat(
        &self,
        rule: &CompiledRule,
        rate: f64,
        cap: Option<&CapRule>,
        amount: f64,
        ledger: &UsageLedger,
        acc: &mut Contributions,
    ) {
        let Some(cap) = cap else {
            acc.push(rule, EntryStatus::Active, rate);
            return;
        };

        match cap.mode {
            CapMode::Reward => {
                let mut remaining = (cap.limit - ledger.get(&cap.key)).max(0.0);
                if let Some(secondary) = &cap.secondary {
                    remaining = remaining.min((secondary.limit - ledger.get(&secondary.key)).max(0.0));
                }

                if remaining <= 0.0 {
                    acc.push_with_note(rule, EntryStatus::Capped, 0.0, format!("额度已用尽 ({})", cap.key));
                    return;
                }

                let full = amount * rate;
                let (status, effective_rate, generated) = if full > remaining {
                    (EntryStatus::Partial, remaining / amount, remaining)
                } else {
                    (EntryStatus::Active, rate, full)
                };

                if status == EntryStatus::Partial {
                    acc.push_with_note(
                        rule,
                        status,
                        effective_rate,
                        format!("剩余奖励额度 {:.2}", remaining),
                    );
                } else {
                    acc.push(rule, status, effective_rate);
                }

                if acc.reward_cap.is_none() && generated > 0.0 {
                    let secondary = cap.secondary.as_ref().map(|s| s.key.clone());
                    acc.reward_cap = Some((cap.key.clone(), secondary, generated));
                }
            }
            CapMode::Spending => {
                let remaining = (cap.limit - ledger.get(&cap.key)).max(0.0);

                if remaining <= 0.0 {
                    acc.push_with_note(rule, EntryStatus::Capped, 0.0, format!("额度已用尽 ({})", cap.key));
                    return;
                }

                if amount > remaining {
                    acc.push_with_note(
                        rule,
                        EntryStatus::Partial,
                        remaining * rate / amount,
                        format!("剩余消费额度 {:.2}", remaining),
                    );
                } else {
                    acc.push(rule, EntryStatus::Active, rate);
                }

                if acc.spending_cap.is_none() {
                    acc.spending_cap = Some(cap.key.clone());
                }
            }
        }
    }

    fn apply_tier(
        &self,
        rule: &CompiledRule,
        amount: f64,
        category: &str,
        ledger: &UsageLedger,
        settings: &Settings,
        acc: &mut Contributions,
    ) {
        if settings.tier_level == 0 {
            return;
        }
        if !rule.categories.is_empty() && !self.matches(rule, category) {
            return;
        }

        let Some(program) = &self.catalog.config().tier_program else {
            acc.push_with_note(rule, EntryStatus::Unsupported, 0.0, "未配置等级计划".to_string());
            return;
        };
        let Some(level) = program.level(settings.tier_level) else {
            acc.push_with_note(
                rule,
                EntryStatus::Unsupported,
                0.0,
                format!("等级计划 {} 缺少第 {} 档", program.id, settings.tier_level),
            );
            return;
        };

        let qualifying_spend = self
            .catalog
            .resolver()
            .is_match(std::slice::from_ref(&program.privileged_category), category);
        let remaining = (level.cap - ledger.get(&UsageKey::tier_reward(&program.id))).max(0.0);
        let full = amount * level.rate;

        // 等级规则自行记账：贡献在此处计入总回赠率，且只计一次
        let generated_reward = if remaining <= 0.0 {
            acc.push_with_note(rule, EntryStatus::Capped, 0.0, format!("第 {} 档额度已用尽", level.level));
            0.0
        } else if full > remaining {
            acc.push_with_note(
                rule,
                EntryStatus::Partial,
                remaining / amount,
                format!("第 {} 档剩余额度 {:.2}", level.level, remaining),
            );
            remaining
        } else {
            acc.push(rule, EntryStatus::Active, level.rate);
            full
        };

        if acc.tier.is_none() {
            acc.tier = Some(TierTracking {
                program_id: program.id.clone(),
                generated_reward,
                qualifying_spend,
            });
        }
    }

    fn apply_flexible(
        &self,
        rule: &CompiledRule,
        rate_per_unit: f64,
        category: &str,
        settings: &Settings,
        acc: &mut Contributions,
    ) {
        if !rule.categories.is_empty() && !self.matches(rule, category) {
            return;
        }

        let Some(bucket) = self
            .catalog
            .resolver()
            .bucket_of(&self.catalog.config().allocation, category)
        else {
            return;
        };

        let weight = settings.allocation_weight(bucket);
        if weight == 0 {
            return;
        }

        acc.push_with_note(
            rule,
            EntryStatus::Active,
            f64::from(weight) * rate_per_unit,
            format!("{} × {}", bucket, weight),
        );
    }

    /// 原生奖励换算为现金/里数
    fn convert(&self, result: &mut CardResult) {
        result.conversion = self.catalog.config().conversions.get(&result.currency).copied();
        if let Some(conversion) = &result.conversion {
            result.cash_value = result.native_value * conversion.cash_per_unit;
            result.miles_value = result.native_value * conversion.miles_per_unit;
        }
        result.project(result.display_mode);
    }
}
