//! 评估结果
//!
//! 每次评估新建，不持久化。提交时由展示层原样传回，
//! 账本只按结果中携带的追踪信息更新，不重新推导。

use serde::{Deserialize, Serialize};

use super::card::{ConversionEntry, DisplayMode};
use super::ledger::UsageKey;

/// 明细条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// 全额生效
    Active,
    /// 部分封顶，回赠率已按剩余额度折算
    Partial,
    /// 额度用尽，展示为删除线
    Capped,
    /// 任务门槛未达成
    Locked,
    /// 规则无法评估（未知类型或配置错误），按零处理
    Unsupported,
}

/// 单条规则的评估明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub rule_id: String,
    pub label: String,
    pub status: EntryStatus,
    /// 该规则贡献的回赠率
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BreakdownEntry {
    pub fn new(rule_id: &str, label: &str, status: EntryStatus, rate: f64) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            label: label.to_string(),
            status,
            rate,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// 封顶追踪
///
/// 同一结果只能走一种封顶记账路径：按消费累计或按奖励累计，二者单位不同。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapTracking {
    #[default]
    None,
    /// 提交时把交易金额累加到该键
    SpendingCap { key: UsageKey },
    /// 提交时把本次实际发放的奖励累加到该键（及次级键）
    RewardCap {
        key: UsageKey,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary: Option<UsageKey>,
        amount: f64,
    },
}

impl CapTracking {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Self::RewardCap { .. })
    }
}

/// 等级追踪
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTracking {
    pub program_id: String,
    /// 本次产生的等级奖励（单位为等级计划的奖励单位）
    pub generated_reward: f64,
    /// 等级已启用且类别为等级优先类别
    pub qualifying_spend: bool,
}

/// 任务进度标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionTag {
    pub mission_id: String,
    pub eligible: bool,
}

/// 卡片对当前展示口径不可用的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// 缺少该币种的换算条目
    MissingConversion { currency: String },
    /// 换算条目对该口径为 0
    ZeroConversion { mode: DisplayMode },
}

/// 单卡评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardResult {
    pub card_id: String,
    pub card_name: String,
    pub amount: f64,
    pub raw_category: String,
    /// 解析后的有效类别
    pub category: String,
    pub currency: String,

    pub total_rate: f64,
    /// 原生奖励值 = total_rate × amount
    pub native_value: f64,
    pub cash_value: f64,
    pub miles_value: f64,
    pub display_mode: DisplayMode,
    pub display_value: f64,

    pub breakdown: Vec<BreakdownEntry>,
    #[serde(default)]
    pub cap_tracking: CapTracking,
    #[serde(default)]
    pub tier_tracking: Option<TierTracking>,
    #[serde(default)]
    pub mission_tags: Vec<MissionTag>,
    /// 生效的 replace 规则
    #[serde(default)]
    pub replacer: Option<String>,
    #[serde(default)]
    pub unsupported: Option<UnsupportedReason>,
    /// 评估时使用的换算条目，缺失时为 None
    #[serde(default)]
    pub conversion: Option<ConversionEntry>,
}

impl CardResult {
    pub fn is_supported(&self) -> bool {
        self.unsupported.is_none()
    }

    /// 指定口径下不支持的原因
    pub fn unsupported_for(&self, mode: DisplayMode) -> Option<UnsupportedReason> {
        match &self.conversion {
            None => Some(UnsupportedReason::MissingConversion {
                currency: self.currency.clone(),
            }),
            Some(conversion) if conversion.factor(mode) == 0.0 => {
                Some(UnsupportedReason::ZeroConversion { mode })
            }
            Some(_) => None,
        }
    }

    pub fn is_supported_for(&self, mode: DisplayMode) -> bool {
        self.unsupported_for(mode).is_none()
    }

    /// 切换展示口径：重算展示值与支持标记
    pub fn project(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        self.display_value = self.estimate(mode);
        self.unsupported = self.unsupported_for(mode);
    }

    pub fn estimate(&self, mode: DisplayMode) -> f64 {
        match mode {
            DisplayMode::Cash => self.cash_value,
            DisplayMode::Miles => self.miles_value,
        }
    }

    pub fn entry(&self, rule_id: &str) -> Option<&BreakdownEntry> {
        self.breakdown.iter().find(|e| e.rule_id == rule_id)
    }

    /// 提交时会改动的用量键（不含汇总统计）
    pub fn touched_keys(&self) -> Vec<UsageKey> {
        let mut keys = vec![UsageKey::card_spend(&self.card_id)];

        match &self.cap_tracking {
            CapTracking::None => {}
            CapTracking::SpendingCap { key } => keys.push(key.clone()),
            CapTracking::RewardCap { key, secondary, .. } => {
                keys.push(key.clone());
                keys.extend(secondary.iter().cloned());
            }
        }

        if let Some(tier) = &self.tier_tracking {
            if tier.generated_reward > 0.0 {
                keys.push(UsageKey::tier_reward(&tier.program_id));
            }
            if tier.qualifying_spend {
                keys.push(UsageKey::tier_spend(&tier.program_id));
            }
        }

        for tag in &self.mission_tags {
            keys.push(UsageKey::mission_total(&tag.mission_id));
            if tag.eligible {
                keys.push(UsageKey::mission_eligible(&tag.mission_id));
            }
        }

        keys
    }
}
