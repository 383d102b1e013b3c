//! 账本提交
//!
//! 把用户选定卡片的评估结果写入账本。只改动评估时依赖的计数，
//! 封顶记账按结果中的 `CapTracking` 二选一，不会同时写入消费口径与奖励口径。

use metrics::counter;
use reward_shared::observability::metrics::{COMMITS_TOTAL, COMMIT_FAILURES_TOTAL};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::models::{CapTracking, CardResult, Profile, UsageKey};
use crate::store::ProfileStore;

/// 提交回执：本次提交改动的计数及改动后的值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReceipt {
    pub card_id: String,
    pub amount: f64,
    pub value: f64,
    pub updated: Vec<(UsageKey, f64)>,
}

impl CommitReceipt {
    pub fn value_of(&self, key: &UsageKey) -> Option<f64> {
        self.updated
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }
}

pub struct LedgerCommitter;

impl LedgerCommitter {
    /// 在档案上应用评估结果（不落盘）
    pub fn apply(result: &CardResult, profile: &mut Profile) -> CommitReceipt {
        let amount = result.amount;
        let mut updated = Vec::new();
        let mut add = |key: UsageKey, delta: f64| {
            let value = profile.ledger.add(&key, delta);
            updated.push((key, value));
        };

        add(UsageKey::card_spend(&result.card_id), amount);

        match &result.cap_tracking {
            CapTracking::RewardCap {
                key,
                secondary,
                amount: reward,
            } if *reward > 0.0 => {
                add(key.clone(), *reward);
                if let Some(secondary) = secondary {
                    add(secondary.clone(), *reward);
                }
            }
            CapTracking::SpendingCap { key } => add(key.clone(), amount),
            _ => {}
        }

        if let Some(tier) = &result.tier_tracking {
            if tier.generated_reward > 0.0 {
                add(UsageKey::tier_reward(&tier.program_id), tier.generated_reward);
            }
            if tier.qualifying_spend {
                add(UsageKey::tier_spend(&tier.program_id), amount);
            }
        }

        for tag in &result.mission_tags {
            add(UsageKey::mission_total(&tag.mission_id), amount);
            if tag.eligible {
                add(UsageKey::mission_eligible(&tag.mission_id), amount);
            }
        }

        profile.stats.total_spend += amount;
        profile.stats.total_value += result.display_value;
        profile.stats.transaction_count += 1;

        CommitReceipt {
            card_id: result.card_id.clone(),
            amount,
            value: result.display_value,
            updated,
        }
    }

    /// 原子提交：在副本上应用并落盘，成功后才替换调用方的档案
    #[instrument(skip(result, profile, store), fields(card_id = %result.card_id, amount = result.amount))]
    pub fn commit(
        result: &CardResult,
        profile: &mut Profile,
        store: &dyn ProfileStore,
    ) -> Result<CommitReceipt> {
        let mut staged = profile.clone();
        let receipt = Self::apply(result, &mut staged);

        if let Err(e) = store.save(&staged) {
            warn!(error = %e, "档案写入失败，账本未变更");
            counter!(COMMIT_FAILURES_TOTAL).increment(1);
            return Err(e);
        }

        *profile = staged;
        counter!(COMMITS_TOTAL).increment(1);
        info!(
            keys = receipt.updated.len(),
            value = receipt.value,
            "交易已记账"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RewardError;
    use crate::models::{ConversionEntry, DisplayMode, MissionTag, TierTracking, UsageLedger};
    use crate::store::MockProfileStore;

    fn result(cap_tracking: CapTracking) -> CardResult {
        CardResult {
            card_id: "red".to_string(),
            card_name: "Red".to_string(),
            amount: 1000.0,
            raw_category: "dining".to_string(),
            category: "dining".to_string(),
            currency: "rc".to_string(),
            total_rate: 0.02,
            native_value: 20.0,
            cash_value: 20.0,
            miles_value: 0.0,
            display_mode: DisplayMode::Cash,
            display_value: 20.0,
            breakdown: vec![],
            cap_tracking,
            tier_tracking: None,
            mission_tags: vec![],
            replacer: None,
            unsupported: None,
            conversion: Some(ConversionEntry::new(1.0, 0.0)),
        }
    }

    #[test]
    fn test_reward_cap_adds_generated_reward() {
        let key = UsageKey::configured("k");
        let mut profile =
            Profile::default().with_ledger(UsageLedger::seeded([(key.clone(), 280.0)]));

        let receipt = LedgerCommitter::apply(
            &result(CapTracking::RewardCap {
                key: key.clone(),
                secondary: Some(UsageKey::configured("shared")),
                amount: 20.0,
            }),
            &mut profile,
        );

        assert_eq!(profile.ledger.get(&key), 300.0);
        assert_eq!(profile.ledger.get(&UsageKey::configured("shared")), 20.0);
        assert_eq!(profile.ledger.get(&UsageKey::card_spend("red")), 1000.0);
        assert_eq!(receipt.value_of(&key), Some(300.0));
        assert_eq!(profile.stats.transaction_count, 1);
        assert_eq!(profile.stats.total_value, 20.0);
    }

    #[test]
    fn test_spending_cap_adds_amount() {
        let key = UsageKey::configured("online_cap");
        let mut profile = Profile::default();
        LedgerCommitter::apply(
            &result(CapTracking::SpendingCap { key: key.clone() }),
            &mut profile,
        );
        assert_eq!(profile.ledger.get(&key), 1000.0);
    }

    #[test]
    fn test_zero_reward_cap_writes_nothing() {
        let key = UsageKey::configured("k");
        let mut profile = Profile::default();
        LedgerCommitter::apply(
            &result(CapTracking::RewardCap {
                key: key.clone(),
                secondary: None,
                amount: 0.0,
            }),
            &mut profile,
        );
        assert!(!profile.ledger.contains(&key));
    }

    #[test]
    fn test_tier_and_missions() {
        let mut chosen = result(CapTracking::None);
        chosen.tier_tracking = Some(TierTracking {
            program_id: "gold".to_string(),
            generated_reward: 15.0,
            qualifying_spend: true,
        });
        chosen.mission_tags = vec![
            MissionTag {
                mission_id: "m1".to_string(),
                eligible: true,
            },
            MissionTag {
                mission_id: "m2".to_string(),
                eligible: false,
            },
        ];

        let mut profile = Profile::default();
        let receipt = LedgerCommitter::apply(&chosen, &mut profile);

        let ledger = &profile.ledger;
        assert_eq!(ledger.get(&UsageKey::tier_reward("gold")), 15.0);
        assert_eq!(ledger.get(&UsageKey::tier_spend("gold")), 1000.0);
        assert_eq!(ledger.get(&UsageKey::mission_total("m1")), 1000.0);
        assert_eq!(ledger.get(&UsageKey::mission_eligible("m1")), 1000.0);
        assert_eq!(ledger.get(&UsageKey::mission_total("m2")), 1000.0);
        assert!(!ledger.contains(&UsageKey::mission_eligible("m2")));

        let mut keys: Vec<_> = receipt.updated.iter().map(|(k, _)| k.clone()).collect();
        let mut touched = chosen.touched_keys();
        keys.sort();
        touched.sort();
        assert_eq!(keys, touched);
    }

    #[test]
    fn test_commit_persists_then_swaps() {
        let mut store = MockProfileStore::new();
        store
            .expect_save()
            .withf(|p| p.stats.transaction_count == 1)
            .times(1)
            .returning(|_| Ok(()));

        let mut profile = Profile::default();
        LedgerCommitter::commit(&result(CapTracking::None), &mut profile, &store).unwrap();
        assert_eq!(profile.stats.transaction_count, 1);
    }

    #[test]
    fn test_failed_save_leaves_profile_untouched() {
        let mut store = MockProfileStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(RewardError::Store("disk full".to_string())));

        let key = UsageKey::configured("online_cap");
        let mut profile = Profile::default();
        let before = profile.clone();

        let err = LedgerCommitter::commit(
            &result(CapTracking::SpendingCap { key }),
            &mut profile,
            &store,
        )
        .unwrap_err();

        assert_eq!(err.code(), "STORE_ERROR");
        assert_eq!(profile, before);
    }
}
