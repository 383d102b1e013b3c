//! 规则编译器
//!
//! 把扁平的 `RuleDefinition` 编译成按类型区分的 `RuleBody`，
//! 评估时只需对封闭枚举做一次穷尽匹配。配置错误不会中断加载：
//! 出错的规则编译为 `RuleBody::Unsupported`，评估时贡献为零。

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::models::{CapMode, CompositionMode, RuleDefinition, RuleKind, UsageKey};

/// 次级封顶
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryCap {
    pub key: UsageKey,
    pub limit: f64,
}

/// 封顶配置
#[derive(Debug, Clone, PartialEq)]
pub struct CapRule {
    pub key: UsageKey,
    pub limit: f64,
    pub mode: CapMode,
    /// 仅在奖励口径下参与计算
    pub secondary: Option<SecondaryCap>,
}

/// 任务门槛
#[derive(Debug, Clone, PartialEq)]
pub struct MissionGate {
    pub key: UsageKey,
    pub required: f64,
}

/// 通用门槛
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gates {
    pub toggle: Option<String>,
    pub min_spend: Option<f64>,
    pub min_single_spend: Option<f64>,
    pub mission: Option<MissionGate>,
}

/// 按类型区分的规则体
#[derive(Debug, Clone, PartialEq)]
pub enum RuleBody {
    FlatCategory {
        mode: CompositionMode,
        rate: f64,
        cap: Option<CapRule>,
    },
    AlwaysBase {
        rate: f64,
    },
    TieredCapped,
    FlexibleAllocation {
        rate_per_unit: f64,
    },
    FixedBonusAllocation {
        rate_per_unit: f64,
        units: f64,
    },
    MissionObserver {
        mission_id: String,
    },
    Unsupported {
        reason: String,
    },
}

/// 编译后的规则
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: String,
    pub label: String,
    pub categories: Vec<String>,
    pub gates: Gates,
    pub body: RuleBody,
}

impl CompiledRule {
    pub fn is_supported(&self) -> bool {
        !matches!(self.body, RuleBody::Unsupported { .. })
    }

    /// 是否为 replace 模式的类别规则
    pub fn is_replacer(&self) -> bool {
        matches!(
            self.body,
            RuleBody::FlatCategory {
                mode: CompositionMode::Replace,
                ..
            }
        )
    }

    pub fn cap(&self) -> Option<&CapRule> {
        match &self.body {
            RuleBody::FlatCategory { cap, .. } => cap.as_ref(),
            _ => None,
        }
    }

    pub fn unsupported_reason(&self) -> Option<&str> {
        match &self.body {
            RuleBody::Unsupported { reason } => Some(reason),
            _ => None,
        }
    }
}

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译全部规则，并把跨规则冲突（同一封顶键被不同口径使用）的规则降级
    pub fn compile_all(definitions: &[RuleDefinition]) -> BTreeMap<String, CompiledRule> {
        let mut compiled: BTreeMap<String, CompiledRule> = definitions
            .iter()
            .map(|def| (def.id.clone(), Self::compile(def)))
            .collect();

        for (key, rule_ids) in Self::cap_mode_conflicts(compiled.values()) {
            for rule_id in rule_ids {
                if let Some(rule) = compiled.get_mut(&rule_id) {
                    rule.body = RuleBody::Unsupported {
                        reason: format!("封顶键 '{}' 被多种封顶口径共用", key),
                    };
                }
            }
        }

        compiled
    }

    /// 编译单条规则
    pub fn compile(def: &RuleDefinition) -> CompiledRule {
        let (gates, body) = match Self::compile_gates(def) {
            Ok(gates) => {
                let body = Self::compile_body(def)
                    .unwrap_or_else(|reason| RuleBody::Unsupported { reason });
                (gates, body)
            }
            Err(reason) => (Gates::default(), RuleBody::Unsupported { reason }),
        };

        CompiledRule {
            id: def.id.clone(),
            label: def.display_label().to_string(),
            categories: def.categories.clone(),
            gates,
            body,
        }
    }

    fn compile_body(def: &RuleDefinition) -> Result<RuleBody, String> {
        let kind: RuleKind = def
            .kind
            .parse()
            .map_err(|kind| format!("未知的规则类型: {}", kind))?;

        let body = match kind {
            RuleKind::FlatCategory => RuleBody::FlatCategory {
                mode: Self::parse_mode(def.mode.as_deref(), "mode")?,
                rate: Self::required_amount(def.rate, "rate")?,
                cap: Self::compile_cap(def)?,
            },
            RuleKind::AlwaysBase => RuleBody::AlwaysBase {
                rate: Self::required_amount(def.rate, "rate")?,
            },
            RuleKind::TieredCapped => RuleBody::TieredCapped,
            RuleKind::FlexibleAllocation => RuleBody::FlexibleAllocation {
                rate_per_unit: Self::required_amount(def.rate_per_unit, "rate_per_unit")?,
            },
            RuleKind::FixedBonusAllocation => RuleBody::FixedBonusAllocation {
                rate_per_unit: Self::required_amount(def.rate_per_unit, "rate_per_unit")?,
                units: Self::optional_amount(def.units, "units")?.unwrap_or(1.0),
            },
            RuleKind::MissionObserver => RuleBody::MissionObserver {
                mission_id: def
                    .mission_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| "任务观察规则缺少 mission_id".to_string())?,
            },
        };

        Ok(body)
    }

    fn compile_cap(def: &RuleDefinition) -> Result<Option<CapRule>, String> {
        let limit = Self::optional_amount(def.cap_limit, "cap_limit")?;
        let key = def.cap_key.as_deref().filter(|k| !k.is_empty());

        let (limit, key) = match (limit, key) {
            (None, None) => return Ok(None),
            (Some(limit), Some(key)) => (limit, key),
            _ => return Err("cap_limit 与 cap_key 必须同时配置".to_string()),
        };

        let secondary_limit = Self::optional_amount(def.secondary_cap_limit, "secondary_cap_limit")?;
        let secondary_key = def.secondary_cap_key.as_deref().filter(|k| !k.is_empty());
        let secondary = match (secondary_limit, secondary_key) {
            (None, None) => None,
            (Some(limit), Some(key)) => Some(SecondaryCap {
                key: UsageKey::configured(key),
                limit,
            }),
            _ => {
                return Err(
                    "secondary_cap_limit 与 secondary_cap_key 必须同时配置".to_string(),
                );
            }
        };

        Ok(Some(CapRule {
            key: UsageKey::configured(key),
            limit,
            mode: Self::parse_mode(def.cap_mode.as_deref(), "cap_mode")?,
            secondary,
        }))
    }

    /// 缺省取默认值，无法识别的取值使整条规则不支持
    fn parse_mode<T>(value: Option<&str>, field: &str) -> Result<T, String>
    where
        T: FromStr<Err = String> + Default,
    {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(T::default()),
            Some(raw) => raw
                .parse()
                .map_err(|raw| format!("字段 {} 取值无效: {}", field, raw)),
        }
    }

    fn compile_gates(def: &RuleDefinition) -> Result<Gates, String> {
        let key = match (
            def.req_mission_id.as_deref().filter(|id| !id.is_empty()),
            def.req_mission_key.as_deref().filter(|k| !k.is_empty()),
        ) {
            (Some(_), Some(_)) => {
                return Err("req_mission_id 与 req_mission_key 只能配置其一".to_string());
            }
            (Some(mission_id), None) => Some(UsageKey::mission_eligible(mission_id)),
            (None, Some(key)) => Some(UsageKey::configured(key)),
            (None, None) => None,
        };

        let mission = match (
            key,
            Self::optional_amount(def.req_mission_spend, "req_mission_spend")?,
        ) {
            (None, None) => None,
            (Some(key), Some(required)) => Some(MissionGate { key, required }),
            _ => {
                return Err(
                    "任务门槛需同时配置 req_mission_spend 与 req_mission_id/req_mission_key"
                        .to_string(),
                );
            }
        };

        Ok(Gates {
            toggle: def.setting_key.clone().filter(|k| !k.is_empty()),
            min_spend: Self::optional_amount(def.min_spend, "min_spend")?,
            min_single_spend: Self::optional_amount(def.min_single_spend, "min_single_spend")?,
            mission,
        })
    }

    fn required_amount(value: Option<f64>, field: &str) -> Result<f64, String> {
        Self::optional_amount(value, field)?.ok_or_else(|| format!("缺少字段 {}", field))
    }

    fn optional_amount(value: Option<f64>, field: &str) -> Result<Option<f64>, String> {
        match value {
            Some(v) if !v.is_finite() || v < 0.0 => {
                Err(format!("字段 {} 必须为非负有限数值，当前为 {}", field, v))
            }
            other => Ok(other),
        }
    }

    /// 找出被多种封顶口径共用的键，返回 键 -> 涉及的规则 ID
    ///
    /// 次级封顶键只在奖励口径下生效，按奖励口径计入。
    pub fn cap_mode_conflicts<'a, I>(rules: I) -> BTreeMap<String, BTreeSet<String>>
    where
        I: IntoIterator<Item = &'a CompiledRule>,
    {
        let mut usage: BTreeMap<String, (BTreeSet<CapMode>, BTreeSet<String>)> = BTreeMap::new();

        for rule in rules {
            let Some(cap) = rule.cap() else { continue };

            let entry = usage.entry(cap.key.to_string()).or_default();
            entry.0.insert(cap.mode);
            entry.1.insert(rule.id.clone());

            if let (CapMode::Reward, Some(secondary)) = (cap.mode, &cap.secondary) {
                let entry = usage.entry(secondary.key.to_string()).or_default();
                entry.0.insert(CapMode::Reward);
                entry.1.insert(rule.id.clone());
            }
        }

        usage
            .into_iter()
            .filter(|(_, (modes, _))| modes.len() > 1)
            .map(|(key, (_, rule_ids))| (key, rule_ids))
            .collect()
    }
}
