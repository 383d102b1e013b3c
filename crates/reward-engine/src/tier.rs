//! 等级晋升

use serde::Serialize;

use crate::models::{Settings, TierProgram, UsageKey, UsageLedger};

/// 晋升结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierAdvance {
    pub previous_level: u8,
    pub level: u8,
    /// 晋升前已在最高级
    pub at_max: bool,
}

pub struct TierProgression;

impl TierProgression {
    /// 等级加一（不超过最高级），并清零等级消费与等级奖励计数
    ///
    /// 已在最高级时等级不变，计数同样清零。
    pub fn advance(
        ledger: &mut UsageLedger,
        settings: &mut Settings,
        program: &TierProgram,
    ) -> TierAdvance {
        let previous_level = settings.tier_level;
        let at_max = previous_level >= program.max_level;

        settings.tier_level = previous_level.saturating_add(1).min(program.max_level);
        ledger.reset(&UsageKey::tier_spend(&program.id));
        ledger.reset(&UsageKey::tier_reward(&program.id));

        TierAdvance {
            previous_level,
            level: settings.tier_level,
            at_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TierLevel;

    fn program() -> TierProgram {
        TierProgram {
            id: "gold".to_string(),
            max_level: 3,
            levels: (1..=3)
                .map(|level| TierLevel {
                    level,
                    rate: 0.01 * f64::from(level),
                    cap: 100.0,
                })
                .collect(),
            privileged_category: "travel".to_string(),
            reward_unit: None,
            period: None,
        }
    }

    fn used_ledger() -> UsageLedger {
        UsageLedger::seeded([
            (UsageKey::tier_spend("gold"), 5000.0),
            (UsageKey::tier_reward("gold"), 80.0),
            (UsageKey::configured("other"), 1.0),
        ])
    }

    #[test]
    fn test_advance_increments_and_resets() {
        let mut ledger = used_ledger();
        let mut settings = Settings::default().with_tier_level(1);

        let advance = TierProgression::advance(&mut ledger, &mut settings, &program());

        assert_eq!(
            advance,
            TierAdvance {
                previous_level: 1,
                level: 2,
                at_max: false
            }
        );
        assert_eq!(ledger.get(&UsageKey::tier_spend("gold")), 0.0);
        assert_eq!(ledger.get(&UsageKey::tier_reward("gold")), 0.0);
        assert_eq!(ledger.get(&UsageKey::configured("other")), 1.0);
    }

    #[test]
    fn test_advance_at_max_keeps_level_and_resets() {
        let mut ledger = used_ledger();
        let mut settings = Settings::default().with_tier_level(3);

        let advance = TierProgression::advance(&mut ledger, &mut settings, &program());

        assert!(advance.at_max);
        assert_eq!(settings.tier_level, 3);
        assert_eq!(ledger.get(&UsageKey::tier_spend("gold")), 0.0);
        assert_eq!(ledger.get(&UsageKey::tier_reward("gold")), 0.0);
    }

    #[test]
    fn test_advance_from_disabled() {
        let mut ledger = UsageLedger::new();
        let mut settings = Settings::default();
        let advance = TierProgression::advance(&mut ledger, &mut settings, &program());
        assert_eq!(advance.level, 1);
    }
}
