//! 用户设置
//!
//! 推广开关、自选类别额度分配、等级、产品线类别偏好。评估时只读。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{RewardError, Result};

/// 自选类别分配桶
///
/// 固定的小集合，每个桶对应一组类别（见 `AllocationConfig`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationBucket {
    Dining,
    Online,
    Travel,
    Overseas,
    Entertainment,
}

impl fmt::Display for AllocationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dining => "dining",
            Self::Online => "online",
            Self::Travel => "travel",
            Self::Overseas => "overseas",
            Self::Entertainment => "entertainment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 推广开关（需要登记的推广默认为关闭）
    pub toggles: BTreeMap<String, bool>,
    /// 自选类别权重分配，总和不得超过配置的额度
    pub allocation: BTreeMap<AllocationBucket, u32>,
    /// 等级，0 表示未启用
    pub tier_level: u8,
    /// 产品线 -> 用户选择的偏好选项
    pub preferences: BTreeMap<String, String>,
}

impl Settings {
    pub fn is_enabled(&self, toggle: &str) -> bool {
        self.toggles.get(toggle).copied().unwrap_or(false)
    }

    pub fn allocation_weight(&self, bucket: AllocationBucket) -> u32 {
        self.allocation.get(&bucket).copied().unwrap_or(0)
    }

    /// 权重总和，按 u64 累加，档案中的异常权重不会溢出
    pub fn allocated_total(&self) -> u64 {
        self.allocation.values().map(|&w| u64::from(w)).sum()
    }

    pub fn preference_for(&self, product_line: &str) -> Option<&str> {
        self.preferences.get(product_line).map(String::as_str)
    }

    /// 校验分配总和不超过额度
    pub fn validate_allocation(&self, budget: u32) -> Result<()> {
        let allocated = self.allocated_total();
        if allocated > u64::from(budget) {
            return Err(RewardError::InvalidAllocation { allocated, budget });
        }
        Ok(())
    }

    pub fn with_toggle(mut self, toggle: impl Into<String>, enabled: bool) -> Self {
        self.toggles.insert(toggle.into(), enabled);
        self
    }

    pub fn with_allocation(mut self, bucket: AllocationBucket, weight: u32) -> Self {
        self.allocation.insert(bucket, weight);
        self
    }

    pub fn with_tier_level(mut self, level: u8) -> Self {
        self.tier_level = level;
        self
    }

    pub fn with_preference(
        mut self,
        product_line: impl Into<String>,
        option: impl Into<String>,
    ) -> Self {
        self.preferences.insert(product_line.into(), option.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_defaults_off() {
        let settings = Settings::default().with_toggle("winter_promo", true);
        assert!(settings.is_enabled("winter_promo"));
        assert!(!settings.is_enabled("unknown"));
    }

    #[test]
    fn test_validate_allocation() {
        let settings = Settings::default()
            .with_allocation(AllocationBucket::Dining, 3)
            .with_allocation(AllocationBucket::Online, 2);
        assert_eq!(settings.allocated_total(), 5);
        assert!(settings.validate_allocation(5).is_ok());

        let err = settings.validate_allocation(4).unwrap_err();
        assert_eq!(err.code(), "INVALID_ALLOCATION");
    }

    #[test]
    fn test_oversized_weights_rejected_without_overflow() {
        let settings = Settings::default()
            .with_allocation(AllocationBucket::Dining, u32::MAX)
            .with_allocation(AllocationBucket::Online, 2);
        assert_eq!(settings.allocated_total(), u64::from(u32::MAX) + 2);

        match settings.validate_allocation(5).unwrap_err() {
            RewardError::InvalidAllocation { allocated, budget } => {
                assert_eq!(allocated, u64::from(u32::MAX) + 2);
                assert_eq!(budget, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"allocation": {"dining": 2}, "tier_level": 1}"#).unwrap();
        assert_eq!(settings.allocation_weight(AllocationBucket::Dining), 2);
        assert_eq!(settings.allocation_weight(AllocationBucket::Travel), 0);
        assert_eq!(settings.tier_level, 1);
        assert!(settings.toggles.is_empty());
    }
}
