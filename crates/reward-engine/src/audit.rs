//! 配置审计
//!
//! 加载配置后执行的离线检查。发现的问题以数据形式返回并以 warn 级别记录，
//! 不会中断加载或评估。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use metrics::counter;
use reward_shared::observability::metrics::AUDIT_FINDINGS_TOTAL;
use serde::Serialize;
use tracing::warn;

use crate::category::CategoryResolver;
use crate::compiler::{CompiledRule, RuleBody, RuleCompiler};
use crate::models::{CapMode, RewardConfig};

/// 审计发现
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum AuditFinding {
    /// 规则无法编译，评估时贡献为零
    UnsupportedRule { rule_id: String, reason: String },
    /// 同一封顶键被消费口径与奖励口径共用
    SharedCapKey { key: String, rule_ids: Vec<String> },
    /// 规则引用了未登记的类别（规则仍然生效）
    UnknownCategory { rule_id: String, category: String },
    /// 卡片引用了不存在的规则
    DanglingRuleRef { card_id: String, rule_id: String },
    /// 卡片币种缺少换算条目
    MissingConversion { card_id: String, currency: String },
    /// 等级计划缺少某一档位
    TierLevelGap { program_id: String, level: u8 },
    /// 规则引用了未定义的任务
    UndefinedMission { rule_id: String, mission_id: String },
    /// 消费口径封顶配置了次级封顶，次级封顶不会生效
    IgnoredSecondaryCap { rule_id: String },
    /// 推广活动引用了不存在的规则
    DanglingCampaignRule { campaign_id: String, rule_id: String },
}

impl AuditFinding {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedRule { .. } => "UNSUPPORTED_RULE",
            Self::SharedCapKey { .. } => "SHARED_CAP_KEY",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::DanglingRuleRef { .. } => "DANGLING_RULE_REF",
            Self::MissingConversion { .. } => "MISSING_CONVERSION",
            Self::TierLevelGap { .. } => "TIER_LEVEL_GAP",
            Self::UndefinedMission { .. } => "UNDEFINED_MISSION",
            Self::IgnoredSecondaryCap { .. } => "IGNORED_SECONDARY_CAP",
            Self::DanglingCampaignRule { .. } => "DANGLING_CAMPAIGN_RULE",
        }
    }
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRule { rule_id, reason } => {
                write!(f, "规则 {} 无法评估: {}", rule_id, reason)
            }
            Self::SharedCapKey { key, rule_ids } => write!(
                f,
                "封顶键 {} 被不同口径的规则共用: {}",
                key,
                rule_ids.join(", ")
            ),
            Self::UnknownCategory { rule_id, category } => {
                write!(f, "规则 {} 引用了未知类别 {}", rule_id, category)
            }
            Self::DanglingRuleRef { card_id, rule_id } => {
                write!(f, "卡片 {} 引用了不存在的规则 {}", card_id, rule_id)
            }
            Self::MissingConversion { card_id, currency } => {
                write!(f, "卡片 {} 的币种 {} 缺少换算条目", card_id, currency)
            }
            Self::TierLevelGap { program_id, level } => {
                write!(f, "等级计划 {} 缺少第 {} 档", program_id, level)
            }
            Self::UndefinedMission {
                rule_id,
                mission_id,
            } => write!(f, "规则 {} 引用了未定义的任务 {}", rule_id, mission_id),
            Self::IgnoredSecondaryCap { rule_id } => {
                write!(f, "规则 {} 为消费口径封顶，次级封顶不会生效", rule_id)
            }
            Self::DanglingCampaignRule {
                campaign_id,
                rule_id,
            } => write!(f, "推广活动 {} 引用了不存在的规则 {}", campaign_id, rule_id),
        }
    }
}

/// 配置审计器
pub struct ConfigAuditor<'a> {
    config: &'a RewardConfig,
    rules: &'a BTreeMap<String, CompiledRule>,
    resolver: &'a CategoryResolver,
}

impl<'a> ConfigAuditor<'a> {
    pub fn new(
        config: &'a RewardConfig,
        rules: &'a BTreeMap<String, CompiledRule>,
        resolver: &'a CategoryResolver,
    ) -> Self {
        Self {
            config,
            rules,
            resolver,
        }
    }

    /// 执行全部检查，并逐条记录日志与指标
    pub fn audit(&self) -> Vec<AuditFinding> {
        let mut findings = Vec::new();

        self.check_rules(&mut findings);
        self.check_categories(&mut findings);
        self.check_cards(&mut findings);
        self.check_campaigns(&mut findings);
        self.check_tier_program(&mut findings);

        for finding in &findings {
            warn!(code = finding.code(), "配置审计: {}", finding);
            counter!(AUDIT_FINDINGS_TOTAL, "code" => finding.code()).increment(1);
        }

        findings
    }

    fn check_rules(&self, findings: &mut Vec<AuditFinding>) {
        // 冲突检测基于单独编译的结果，全量编译时冲突规则已被降级
        let standalone: Vec<CompiledRule> =
            self.config.rules.iter().map(RuleCompiler::compile).collect();
        let conflicts = RuleCompiler::cap_mode_conflicts(&standalone);
        let conflicted: BTreeSet<&String> = conflicts.values().flatten().collect();

        for (key, rule_ids) in &conflicts {
            findings.push(AuditFinding::SharedCapKey {
                key: key.clone(),
                rule_ids: rule_ids.iter().cloned().collect(),
            });
        }

        for def in &self.config.rules {
            let Some(rule) = self.rules.get(&def.id) else {
                continue;
            };

            if let Some(reason) = rule.unsupported_reason() {
                if !conflicted.contains(&def.id) {
                    findings.push(AuditFinding::UnsupportedRule {
                        rule_id: def.id.clone(),
                        reason: reason.to_string(),
                    });
                }
                continue;
            }

            if rule
                .cap()
                .is_some_and(|cap| cap.mode == CapMode::Spending && cap.secondary.is_some())
            {
                findings.push(AuditFinding::IgnoredSecondaryCap {
                    rule_id: def.id.clone(),
                });
            }

            let observed = match &rule.body {
                RuleBody::MissionObserver { mission_id } => Some(mission_id.as_str()),
                _ => None,
            };
            let required = def.req_mission_id.as_deref().filter(|id| !id.is_empty());
            for mission_id in observed.into_iter().chain(required) {
                if self.config.mission(mission_id).is_none() {
                    findings.push(AuditFinding::UndefinedMission {
                        rule_id: def.id.clone(),
                        mission_id: mission_id.to_string(),
                    });
                }
            }
        }
    }

    fn check_categories(&self, findings: &mut Vec<AuditFinding>) {
        if self.config.categories.is_empty() {
            return;
        }

        let mut known = self.resolver.known_categories();
        known.extend(self.config.categories.iter().cloned());
        for categories in self.config.allocation.buckets.values() {
            known.extend(categories.iter().cloned());
        }
        if let Some(program) = &self.config.tier_program {
            known.insert(program.privileged_category.clone());
        }

        for def in &self.config.rules {
            for category in &def.categories {
                if !known.contains(category) {
                    findings.push(AuditFinding::UnknownCategory {
                        rule_id: def.id.clone(),
                        category: category.clone(),
                    });
                }
            }
        }
    }

    fn check_cards(&self, findings: &mut Vec<AuditFinding>) {
        for card in &self.config.cards {
            for rule_id in &card.rules {
                if !self.rules.contains_key(rule_id) {
                    findings.push(AuditFinding::DanglingRuleRef {
                        card_id: card.id.clone(),
                        rule_id: rule_id.clone(),
                    });
                }
            }

            if !self.config.conversions.contains_key(&card.currency) {
                findings.push(AuditFinding::MissingConversion {
                    card_id: card.id.clone(),
                    currency: card.currency.clone(),
                });
            }
        }
    }

    fn check_campaigns(&self, findings: &mut Vec<AuditFinding>) {
        for campaign in &self.config.campaigns {
            for rule_id in &campaign.rule_ids {
                if !self.rules.contains_key(rule_id) {
                    findings.push(AuditFinding::DanglingCampaignRule {
                        campaign_id: campaign.id.clone(),
                        rule_id: rule_id.clone(),
                    });
                }
            }
        }
    }

    fn check_tier_program(&self, findings: &mut Vec<AuditFinding>) {
        let Some(program) = &self.config.tier_program else {
            return;
        };

        for level in 1..=program.max_level {
            if program.level(level).is_none() {
                findings.push(AuditFinding::TierLevelGap {
                    program_id: program.id.clone(),
                    level,
                });
            }
        }
    }
}
