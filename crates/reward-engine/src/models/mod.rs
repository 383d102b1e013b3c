//! 奖励引擎领域模型

pub mod card;
pub mod config;
pub mod ledger;
pub mod period;
pub mod profile;
pub mod result;
pub mod rule;
pub mod settings;

pub use card::{CardProfile, ConversionEntry, DisplayMode, RedemptionInfo};
pub use config::{
    AllocationConfig, Campaign, CategoryHierarchy, MissionDefinition, PreferenceGroup,
    PreferenceOption, ResolverConfig, RewardConfig, TierLevel, TierProgram,
};
pub use ledger::{UsageKey, UsageLedger};
pub use period::{AnchorRef, PeriodSpec, PeriodType};
pub use profile::{Profile, Stats};
pub use result::{
    BreakdownEntry, CapTracking, CardResult, EntryStatus, MissionTag, TierTracking,
    UnsupportedReason,
};
pub use rule::{CapMode, CompositionMode, RuleDefinition, RuleKind};
pub use settings::{AllocationBucket, Settings};
