//! 卡片与兑换口径

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RewardError;

/// 兑换信息（仅用于展示）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedemptionInfo {
    /// 原生奖励单位名称，如 "RC"、"Asia Miles"
    pub unit_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 卡片定义，加载后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardProfile {
    pub id: String,
    pub name: String,
    /// 原生奖励币种，对应 `conversions` 中的条目
    pub currency: String,
    /// 按声明顺序排列的规则 ID
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub redemption: RedemptionInfo,
    #[serde(default)]
    pub owned: bool,
}

impl CardProfile {
    pub fn new(id: impl Into<String>, currency: impl Into<String>, rules: &[&str]) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            currency: currency.into(),
            rules: rules.iter().map(|r| r.to_string()).collect(),
            redemption: RedemptionInfo::default(),
            owned: true,
        }
    }
}

/// 原生奖励到现金/里数的换算
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionEntry {
    /// 每单位原生奖励折合现金
    #[serde(default)]
    pub cash_per_unit: f64,
    /// 每单位原生奖励折合里数
    #[serde(default)]
    pub miles_per_unit: f64,
}

impl ConversionEntry {
    pub fn new(cash_per_unit: f64, miles_per_unit: f64) -> Self {
        Self {
            cash_per_unit,
            miles_per_unit,
        }
    }

    pub fn factor(&self, mode: DisplayMode) -> f64 {
        match mode {
            DisplayMode::Cash => self.cash_per_unit,
            DisplayMode::Miles => self.miles_per_unit,
        }
    }
}

/// 展示口径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Cash,
    Miles,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Miles => write!(f, "miles"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "miles" => Ok(Self::Miles),
            other => Err(RewardError::InvalidDisplayMode(other.to_string())),
        }
    }
}
