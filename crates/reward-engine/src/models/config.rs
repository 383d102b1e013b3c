//! 奖励配置
//!
//! 卡片、规则、类别层级、换算、任务、推广、等级计划等静态配置，启动时加载一次。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::card::{CardProfile, ConversionEntry};
use super::period::PeriodSpec;
use super::rule::RuleDefinition;
use super::settings::AllocationBucket;

/// 类别层级：具体类别 -> 同时满足的父类别
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryHierarchy {
    pub parents: BTreeMap<String, Vec<String>>,
    /// 为 true 时沿祖先链逐级回溯，默认只看直接父类别
    pub transitive: bool,
}

impl CategoryHierarchy {
    pub fn with_parent(mut self, category: &str, parent: &str) -> Self {
        self.parents
            .entry(category.to_string())
            .or_default()
            .push(parent.to_string());
        self
    }

    pub fn parents_of(&self, category: &str) -> &[String] {
        self.parents.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// 产品线偏好选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceOption {
    /// 该选项捕获的原始类别（按层级匹配）
    pub categories: Vec<String>,
    /// 捕获后的有效类别
    pub effective: String,
}

/// 产品线偏好组：同一产品线的卡共享用户的偏好选择
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceGroup {
    pub product_line: String,
    pub card_ids: Vec<String>,
    pub options: BTreeMap<String, PreferenceOption>,
}

/// 类别解析配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 卡片专属映射：card_id -> (原始类别 -> 有效类别)
    pub card_overrides: BTreeMap<String, BTreeMap<String, String>>,
    /// 产品线偏好，先于通用别名检查
    pub preferences: Vec<PreferenceGroup>,
    /// 通用别名（如海外细分类别归并为 overseas）
    pub aliases: BTreeMap<String, String>,
}

/// 自选类别分配配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// 权重总额度
    pub budget: u32,
    pub buckets: BTreeMap<AllocationBucket, Vec<String>>,
}

/// 任务定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDefinition {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub target_spend: Option<f64>,
    #[serde(default)]
    pub period: Option<PeriodSpec>,
}

/// 推广活动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub period: PeriodSpec,
    #[serde(default)]
    pub starts_on: Option<NaiveDate>,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    /// 属于该活动的规则，其封顶键继承活动周期
    #[serde(default)]
    pub rule_ids: Vec<String>,
    /// 额外登记的用量键
    #[serde(default)]
    pub keys: Vec<String>,
}

/// 等级档位
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierLevel {
    pub level: u8,
    pub rate: f64,
    /// 该档位可发放的奖励上限
    pub cap: f64,
}

/// 等级计划
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProgram {
    pub id: String,
    pub max_level: u8,
    pub levels: Vec<TierLevel>,
    /// 计入等级合资格消费的类别
    pub privileged_category: String,
    /// 奖励单位（与卡片结算币种不同）
    #[serde(default)]
    pub reward_unit: Option<String>,
    #[serde(default)]
    pub period: Option<PeriodSpec>,
}

impl TierProgram {
    pub fn level(&self, level: u8) -> Option<&TierLevel> {
        self.levels.iter().find(|l| l.level == level)
    }
}

/// 完整奖励配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub cards: Vec<CardProfile>,
    pub rules: Vec<RuleDefinition>,
    /// 已知类别清单，非空时用于审计规则引用
    pub categories: Vec<String>,
    pub hierarchy: CategoryHierarchy,
    pub resolver: ResolverConfig,
    pub conversions: BTreeMap<String, ConversionEntry>,
    pub allocation: AllocationConfig,
    pub missions: Vec<MissionDefinition>,
    pub campaigns: Vec<Campaign>,
    pub tier_program: Option<TierProgram>,
    /// 未显式配置周期的计数使用的默认周期
    pub default_period: PeriodSpec,
}

impl RewardConfig {
    pub fn card(&self, card_id: &str) -> Option<&CardProfile> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    pub fn mission(&self, mission_id: &str) -> Option<&MissionDefinition> {
        self.missions.iter().find(|m| m.id == mission_id)
    }
}
