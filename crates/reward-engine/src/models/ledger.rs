//! 用量账本
//!
//! 账本是引擎中唯一既被读取又被写入的可变状态：用量键 -> 累计数值。
//! 数值单位（累计消费或累计已发放奖励）由拥有该键的规则决定，账本本身不区分。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 用量键
///
/// 只能通过具名构造函数创建，避免封顶键、任务键、等级键在拼接时混用。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageKey(String);

impl UsageKey {
    /// 配置中直接书写的键（封顶键、任务门槛键）
    pub fn configured(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 单卡累计消费
    pub fn card_spend(card_id: &str) -> Self {
        Self(format!("card_spend:{}", card_id))
    }

    /// 任务累计消费（不区分是否合资格）
    pub fn mission_total(mission_id: &str) -> Self {
        Self(format!("mission:{}:total", mission_id))
    }

    /// 任务合资格消费
    pub fn mission_eligible(mission_id: &str) -> Self {
        Self(format!("mission:{}:eligible", mission_id))
    }

    /// 等级计划已发放奖励
    pub fn tier_reward(program_id: &str) -> Self {
        Self(format!("tier:{}:reward", program_id))
    }

    /// 等级计划合资格消费
    pub fn tier_spend(program_id: &str) -> Self {
        Self(format!("tier:{}:spend", program_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 用量账本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageLedger {
    counters: BTreeMap<UsageKey, f64>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有计数初始化（档案加载、测试构造）
    pub fn seeded<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (UsageKey, f64)>,
    {
        Self {
            counters: entries.into_iter().collect(),
        }
    }

    /// 读取计数，未出现过的键视为 0
    pub fn get(&self, key: &UsageKey) -> f64 {
        self.counters.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &UsageKey) -> bool {
        self.counters.contains_key(key)
    }

    /// 累加计数，返回累加后的值
    pub(crate) fn add(&mut self, key: &UsageKey, delta: f64) -> f64 {
        let value = self.counters.entry(key.clone()).or_insert(0.0);
        *value += delta;
        *value
    }

    /// 归零计数
    ///
    /// 供等级晋升和外部周期重置调度使用。
    pub fn reset(&mut self, key: &UsageKey) {
        self.counters.insert(key.clone(), 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UsageKey, f64)> {
        self.counters.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
