//! 测试工具模块
//!
//! 提供测试与基准共用的示例配置。

use std::collections::BTreeMap;

use crate::models::{
    AllocationBucket, AllocationConfig, CardProfile, CategoryHierarchy, ConversionEntry,
    MissionDefinition, PeriodSpec, PeriodType, AnchorRef, RewardConfig, RuleDefinition, RuleKind,
    Settings, TierLevel, TierProgram,
};

/// 构造一张持有中的卡片
pub fn card(id: &str, currency: &str, rules: &[&str]) -> CardProfile {
    CardProfile::new(id, currency, rules)
}

/// 只有单张卡的最小配置，现金换算 1:1
pub fn single_card_config(rules: Vec<RuleDefinition>) -> RewardConfig {
    let ids: Vec<String> = rules.iter().map(|r| r.id.clone()).collect();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

    RewardConfig {
        cards: vec![card("card", "cash", &ids)],
        rules,
        conversions: BTreeMap::from([("cash".to_string(), ConversionEntry::new(1.0, 0.0))]),
        ..Default::default()
    }
}

/// 等级计划：两档，旅游类别合资格
pub fn sample_tier_program() -> TierProgram {
    TierProgram {
        id: "voyage".to_string(),
        max_level: 2,
        levels: vec![
            TierLevel {
                level: 1,
                rate: 0.02,
                cap: 500.0,
            },
            TierLevel {
                level: 2,
                rate: 0.04,
                cap: 1000.0,
            },
        ],
        privileged_category: "travel".to_string(),
        reward_unit: Some("voyage_points".to_string()),
        period: None,
    }
}

/// 四张卡的示例组合
///
/// - `everyday`: 基础 0.4%，餐饮 5% 取代基础
/// - `online_plus`: 基础 0.4%，网购 4%（消费封顶 10000）
/// - `dining_reward`: 餐饮 10%（奖励封顶 300）
/// - `voyage`: 里数卡，等级回赠、自选类别与任务观察
pub fn sample_config() -> RewardConfig {
    let rules = vec![
        RuleDefinition::base("base", 0.004).with_label("基础回赠"),
        RuleDefinition::flat("everyday_dining", 0.05, &["dining"])
            .replace()
            .with_label("餐饮 5%"),
        RuleDefinition::flat("online_bonus", 0.04, &["online"])
            .with_spending_cap("online_plus_online", 10_000.0)
            .with_label("网购 4%"),
        RuleDefinition::flat("dining_reward", 0.1, &["dining"])
            .with_reward_cap("k", 300.0)
            .with_period(PeriodSpec::new(
                PeriodType::Quarterly,
                AnchorRef::StatementDay { day: 15 },
            )),
        RuleDefinition::new("voyage_tier", RuleKind::TieredCapped),
        RuleDefinition::new("voyage_flex", RuleKind::FlexibleAllocation).with_unit_rate(0.01, None),
        RuleDefinition::new("voyage_mission", RuleKind::MissionObserver)
            .observing("spend_8000")
            .with_categories(&["dining", "online", "travel"]),
        RuleDefinition::flat("voyage_bonus", 0.03, &["travel"])
            .with_mission_requirement("spend_8000", 8000.0),
    ];

    RewardConfig {
        cards: vec![
            card("everyday", "cash", &["base", "everyday_dining"]),
            card("online_plus", "cash", &["base", "online_bonus"]),
            card("dining_reward", "cash", &["dining_reward"]),
            card(
                "voyage",
                "miles",
                &["base", "voyage_tier", "voyage_flex", "voyage_mission", "voyage_bonus"],
            ),
        ],
        rules,
        categories: ["dining", "online", "travel", "overseas", "online_travel"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        hierarchy: CategoryHierarchy::default()
            .with_parent("online_travel", "online")
            .with_parent("online_travel", "travel"),
        conversions: BTreeMap::from([
            ("cash".to_string(), ConversionEntry::new(1.0, 0.0)),
            ("miles".to_string(), ConversionEntry::new(0.0, 1.0)),
        ]),
        allocation: AllocationConfig {
            budget: 5,
            buckets: BTreeMap::from([
                (AllocationBucket::Dining, vec!["dining".to_string()]),
                (AllocationBucket::Online, vec!["online".to_string()]),
                (AllocationBucket::Travel, vec!["travel".to_string()]),
            ]),
        },
        missions: vec![MissionDefinition {
            id: "spend_8000".to_string(),
            label: Some("累计消费 8000".to_string()),
            target_spend: Some(8000.0),
            period: None,
        }],
        tier_program: Some(sample_tier_program()),
        ..Default::default()
    }
}

/// 启用等级与自选类别的示例设置
pub fn sample_settings() -> Settings {
    Settings::default()
        .with_tier_level(1)
        .with_allocation(AllocationBucket::Travel, 3)
        .with_allocation(AllocationBucket::Dining, 2)
}
