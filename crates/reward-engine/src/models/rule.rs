//! 奖励规则定义
//!
//! `RuleDefinition` 是配置中的可序列化记录，字段保持扁平以便运营编辑；
//! 加载时由编译器转换为按类型区分的 `RuleBody`（见 `compiler` 模块）。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::period::PeriodSpec;

/// 规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// 指定类别固定回赠率，可带封顶
    FlatCategory,
    /// 基础回赠，被 replace 规则完全取代
    AlwaysBase,
    /// 按用户等级查表的封顶回赠
    TieredCapped,
    /// 按用户自选权重计算的回赠
    FlexibleAllocation,
    /// 命中任一自选类别即给固定倍数
    FixedBonusAllocation,
    /// 只记录任务进度，不产生回赠
    MissionObserver,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatCategory => "flat_category",
            Self::AlwaysBase => "always_base",
            Self::TieredCapped => "tiered_capped",
            Self::FlexibleAllocation => "flexible_allocation",
            Self::FixedBonusAllocation => "fixed_bonus_allocation",
            Self::MissionObserver => "mission_observer",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    /// 同时接受 `flat-category` 与 `flat_category` 两种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "flat_category" => Ok(Self::FlatCategory),
            "always_base" => Ok(Self::AlwaysBase),
            "tiered_capped" => Ok(Self::TieredCapped),
            "flexible_allocation" => Ok(Self::FlexibleAllocation),
            "fixed_bonus_allocation" => Ok(Self::FixedBonusAllocation),
            "mission_observer" => Ok(Self::MissionObserver),
            _ => Err(s.to_string()),
        }
    }
}

/// 组合模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositionMode {
    /// 命中时完全取代基础回赠
    Replace,
    /// 与其他规则叠加
    #[default]
    Add,
}

/// 封顶口径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapMode {
    /// 限制合资格消费
    #[default]
    Spending,
    /// 限制已发放奖励
    Reward,
}

impl CompositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Add => "add",
        }
    }
}

impl FromStr for CompositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "add" => Ok(Self::Add),
            _ => Err(s.to_string()),
        }
    }
}

impl CapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spending => "spending",
            Self::Reward => "reward",
        }
    }
}

impl fmt::Display for CapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spending" => Ok(Self::Spending),
            "reward" => Ok(Self::Reward),
            _ => Err(s.to_string()),
        }
    }
}

/// 规则配置记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// 原始类型字符串，未知类型在编译阶段降级为不支持
    pub kind: String,
    /// 类别匹配集合
    #[serde(default)]
    pub categories: Vec<String>,
    /// 组合模式原始值（replace | add，缺省 add），拼写错误在编译阶段降级为不支持
    pub mode: Option<String>,

    pub rate: Option<f64>,
    pub rate_per_unit: Option<f64>,
    pub units: Option<f64>,

    pub cap_limit: Option<f64>,
    pub cap_key: Option<String>,
    /// 封顶口径原始值（spending | reward，缺省 spending）
    pub cap_mode: Option<String>,
    pub secondary_cap_key: Option<String>,
    pub secondary_cap_limit: Option<f64>,

    pub min_spend: Option<f64>,
    pub min_single_spend: Option<f64>,
    pub req_mission_key: Option<String>,
    /// 任务门槛按任务 ID 配置时，读取该任务的合资格进度
    pub req_mission_id: Option<String>,
    pub req_mission_spend: Option<f64>,

    /// 推广开关键，设置中关闭时整条规则跳过
    pub setting_key: Option<String>,
    /// 显式的计数重置周期
    pub period: Option<PeriodSpec>,
    /// 任务观察规则对应的任务 ID
    pub mission_id: Option<String>,
}

impl RuleDefinition {
    pub fn new(id: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            kind: kind.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn flat(id: impl Into<String>, rate: f64, categories: &[&str]) -> Self {
        Self::new(id, RuleKind::FlatCategory)
            .with_rate(rate)
            .with_categories(categories)
    }

    pub fn base(id: impl Into<String>, rate: f64) -> Self {
        Self::new(id, RuleKind::AlwaysBase).with_rate(rate)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_unit_rate(mut self, rate_per_unit: f64, units: Option<f64>) -> Self {
        self.rate_per_unit = Some(rate_per_unit);
        self.units = units;
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn replace(mut self) -> Self {
        self.mode = Some(CompositionMode::Replace.as_str().to_string());
        self
    }

    pub fn with_spending_cap(mut self, key: impl Into<String>, limit: f64) -> Self {
        self.cap_key = Some(key.into());
        self.cap_limit = Some(limit);
        self.cap_mode = Some(CapMode::Spending.as_str().to_string());
        self
    }

    pub fn with_reward_cap(mut self, key: impl Into<String>, limit: f64) -> Self {
        self.cap_key = Some(key.into());
        self.cap_limit = Some(limit);
        self.cap_mode = Some(CapMode::Reward.as_str().to_string());
        self
    }

    pub fn with_secondary_cap(mut self, key: impl Into<String>, limit: f64) -> Self {
        self.secondary_cap_key = Some(key.into());
        self.secondary_cap_limit = Some(limit);
        self
    }

    pub fn with_min_spend(mut self, min_spend: f64) -> Self {
        self.min_spend = Some(min_spend);
        self
    }

    pub fn with_min_single_spend(mut self, min_single_spend: f64) -> Self {
        self.min_single_spend = Some(min_single_spend);
        self
    }

    pub fn with_mission_gate(mut self, key: impl Into<String>, required: f64) -> Self {
        self.req_mission_key = Some(key.into());
        self.req_mission_spend = Some(required);
        self
    }

    /// 门槛要求指定任务的合资格消费达到 `required`
    pub fn with_mission_requirement(mut self, mission_id: impl Into<String>, required: f64) -> Self {
        self.req_mission_id = Some(mission_id.into());
        self.req_mission_spend = Some(required);
        self
    }

    pub fn with_toggle(mut self, setting_key: impl Into<String>) -> Self {
        self.setting_key = Some(setting_key.into());
        self
    }

    pub fn with_period(mut self, period: PeriodSpec) -> Self {
        self.period = Some(period);
        self
    }

    pub fn observing(mut self, mission_id: impl Into<String>) -> Self {
        self.mission_id = Some(mission_id.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_accepts_both_spellings() {
        assert_eq!("flat-category".parse::<RuleKind>(), Ok(RuleKind::FlatCategory));
        assert_eq!("always_base".parse::<RuleKind>(), Ok(RuleKind::AlwaysBase));
        assert_eq!(
            "Fixed-Bonus-Allocation".parse::<RuleKind>(),
            Ok(RuleKind::FixedBonusAllocation)
        );
        assert!("lottery".parse::<RuleKind>().is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(" Replace ".parse::<CompositionMode>(), Ok(CompositionMode::Replace));
        assert_eq!("reward".parse::<CapMode>(), Ok(CapMode::Reward));
        assert_eq!("rewards".parse::<CapMode>(), Err("rewards".to_string()));
    }

    #[test]
    fn test_misspelled_modes_still_deserialize() {
        let rule: RuleDefinition = serde_json::from_str(
            r#"{"id": "x", "kind": "flat-category", "mode": "replce", "cap_mode": "rewards"}"#,
        )
        .unwrap();
        assert_eq!(rule.mode.as_deref(), Some("replce"));
        assert_eq!(rule.cap_mode.as_deref(), Some("rewards"));
    }

    #[test]
    fn test_rule_deserialization() {
        let json = r#"
        {
            "id": "dining-bonus",
            "kind": "flat-category",
            "categories": ["dining"],
            "mode": "replace",
            "rate": 0.05,
            "cap_limit": 300,
            "cap_key": "dining_cap",
            "cap_mode": "reward"
        }
        "#;

        let rule: RuleDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "dining-bonus");
        assert_eq!(rule.mode.as_deref(), Some("replace"));
        assert_eq!(rule.cap_mode.as_deref(), Some("reward"));
        assert_eq!(rule.cap_limit, Some(300.0));
        assert!(rule.min_spend.is_none());
    }

    #[test]
    fn test_unknown_kind_still_deserializes() {
        let rule: RuleDefinition =
            serde_json::from_str(r#"{"id": "x", "kind": "lucky-draw"}"#).unwrap();
        assert_eq!(rule.kind, "lucky-draw");
        assert!(rule.mode.is_none());
        assert!(rule.cap_mode.is_none());
    }

    #[test]
    fn test_builder() {
        let rule = RuleDefinition::flat("online", 0.04, &["online"])
            .with_spending_cap("online_cap", 10_000.0)
            .with_label("网购 4%");
        assert_eq!(rule.kind, "flat_category");
        assert_eq!(rule.display_label(), "网购 4%");
        assert_eq!(rule.cap_key.as_deref(), Some("online_cap"));
    }
}
