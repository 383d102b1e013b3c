//! 计数周期登记表
//!
//! 扫描配置，为每个用量键给出重置周期元数据，供外部调度器判断计数是否需要归零。
//! 同一键可能被多处登记，优先级严格更高者覆盖，同级保留先登记者。

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{AnchorRef, PeriodSpec, PeriodType, RewardConfig, RuleDefinition, UsageKey};

/// 登记优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryPriority {
    /// 使用默认周期
    Fallback,
    /// 继承推广活动周期
    Promotion,
    /// 规则或任务显式配置的周期
    Explicit,
}

/// 登记来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Rule { rule_id: String },
    Mission { mission_id: String },
    Campaign { campaign_id: String },
    Tier { program_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub period: PeriodType,
    pub anchor: AnchorRef,
    pub provenance: Provenance,
    pub priority: RegistryPriority,
}

pub type CounterRegistry = BTreeMap<UsageKey, RegistryEntry>;

struct RegistryBuilder<'a> {
    config: &'a RewardConfig,
    entries: CounterRegistry,
}

impl<'a> RegistryBuilder<'a> {
    fn register(
        &mut self,
        key: UsageKey,
        spec: &PeriodSpec,
        provenance: Provenance,
        priority: RegistryPriority,
    ) {
        if let Some(existing) = self.entries.get(&key) {
            if priority <= existing.priority {
                return;
            }
            debug!(key = %key, from = ?existing.priority, to = ?priority, "登记被更高优先级覆盖");
        }

        self.entries.insert(
            key,
            RegistryEntry {
                period: spec.period,
                anchor: spec.anchor.clone(),
                provenance,
                priority,
            },
        );
    }

    /// 规则显式周期或默认周期
    fn rule_period(&self, rule: &RuleDefinition) -> (PeriodSpec, RegistryPriority) {
        match &rule.period {
            Some(spec) => (spec.clone(), RegistryPriority::Explicit),
            None => (self.config.default_period.clone(), RegistryPriority::Fallback),
        }
    }

    fn register_rule(&mut self, rule: &RuleDefinition) {
        let (spec, priority) = self.rule_period(rule);
        let provenance = || Provenance::Rule {
            rule_id: rule.id.clone(),
        };

        for key in rule_keys(rule) {
            self.register(key, &spec, provenance(), priority);
        }

        if let Some(mission_id) = &rule.mission_id {
            let default_period = self.config.default_period.clone();
            for key in [
                UsageKey::mission_total(mission_id),
                UsageKey::mission_eligible(mission_id),
            ] {
                self.register(
                    key,
                    &default_period,
                    provenance(),
                    RegistryPriority::Fallback,
                );
            }
        }
    }

    fn build(mut self) -> CounterRegistry {
        let config = self.config;

        // 1. 卡片规则：卡片顺序，再按规则声明顺序；未挂到任何卡上的规则随后
        let mut visited = std::collections::BTreeSet::new();
        let card_rules = config.cards.iter().flat_map(|card| card.rules.iter());
        let ordered: Vec<&RuleDefinition> = card_rules
            .filter_map(|id| config.rule(id))
            .chain(config.rules.iter())
            .filter(|rule| visited.insert(rule.id.clone()))
            .collect();
        for rule in ordered {
            self.register_rule(rule);
        }

        // 2. 任务
        for mission in &config.missions {
            let (spec, priority) = match &mission.period {
                Some(spec) => (spec.clone(), RegistryPriority::Explicit),
                None => (config.default_period.clone(), RegistryPriority::Fallback),
            };
            for key in [
                UsageKey::mission_total(&mission.id),
                UsageKey::mission_eligible(&mission.id),
            ] {
                self.register(
                    key,
                    &spec,
                    Provenance::Mission {
                        mission_id: mission.id.clone(),
                    },
                    priority,
                );
            }
        }

        // 3. 推广活动
        for campaign in &config.campaigns {
            let provenance = || Provenance::Campaign {
                campaign_id: campaign.id.clone(),
            };
            let owned_keys = campaign
                .rule_ids
                .iter()
                .filter_map(|id| config.rule(id))
                .flat_map(rule_keys);
            let extra_keys = campaign.keys.iter().map(UsageKey::configured);

            for key in owned_keys.chain(extra_keys) {
                self.register(key, &campaign.period, provenance(), RegistryPriority::Promotion);
            }
        }

        // 4. 等级计划
        if let Some(program) = &config.tier_program {
            let (spec, priority) = match &program.period {
                Some(spec) => (spec.clone(), RegistryPriority::Explicit),
                None => (PeriodSpec::tier(), RegistryPriority::Fallback),
            };
            for key in [
                UsageKey::tier_reward(&program.id),
                UsageKey::tier_spend(&program.id),
            ] {
                self.register(
                    key,
                    &spec,
                    Provenance::Tier {
                        program_id: program.id.clone(),
                    },
                    priority,
                );
            }
        }

        self.entries
    }
}

/// 规则拥有的封顶键与任务门槛键
fn rule_keys(rule: &RuleDefinition) -> Vec<UsageKey> {
    let mut keys: Vec<UsageKey> = [
        rule.cap_key.as_deref(),
        rule.secondary_cap_key.as_deref(),
        rule.req_mission_key.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|key| !key.is_empty())
    .map(UsageKey::configured)
    .collect();

    if let Some(mission_id) = rule.req_mission_id.as_deref().filter(|id| !id.is_empty()) {
        keys.push(UsageKey::mission_eligible(mission_id));
    }
    keys
}

/// 构建计数周期登记表
pub fn build_registry(config: &RewardConfig) -> CounterRegistry {
    RegistryBuilder {
        config,
        entries: BTreeMap::new(),
    }
    .build()
}
