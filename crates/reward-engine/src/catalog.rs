//! 规则目录
//!
//! 持有加载后的配置、编译后的规则和类别解析器。构建时编译全部规则并执行审计，
//! 之后只读，可在多次评估之间共享。

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::audit::{AuditFinding, ConfigAuditor};
use crate::category::CategoryResolver;
use crate::compiler::{CompiledRule, RuleCompiler};
use crate::models::{CardProfile, RewardConfig};

#[derive(Debug, Clone)]
pub struct RewardCatalog {
    config: RewardConfig,
    rules: BTreeMap<String, CompiledRule>,
    resolver: CategoryResolver,
    findings: Vec<AuditFinding>,
}

impl RewardCatalog {
    /// 编译规则并审计配置
    #[instrument(skip(config), fields(cards = config.cards.len(), rules = config.rules.len()))]
    pub fn build(config: RewardConfig) -> Self {
        let rules = RuleCompiler::compile_all(&config.rules);
        let resolver = CategoryResolver::new(config.hierarchy.clone(), config.resolver.clone());
        let findings = ConfigAuditor::new(&config, &rules, &resolver).audit();

        let unsupported = rules.values().filter(|r| !r.is_supported()).count();
        info!(
            compiled = rules.len(),
            unsupported,
            findings = findings.len(),
            "规则目录已构建"
        );

        Self {
            config,
            rules,
            resolver,
            findings,
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    pub fn rule(&self, rule_id: &str) -> Option<&CompiledRule> {
        self.rules.get(rule_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&CardProfile> {
        self.config.card(card_id)
    }

    /// 用户持有的卡片，按配置顺序
    pub fn owned_cards(&self) -> impl Iterator<Item = &CardProfile> {
        self.config.cards.iter().filter(|card| card.owned)
    }

    /// 卡片的规则，按声明顺序；不存在的规则 ID 返回 None
    pub fn card_rules<'a>(
        &'a self,
        card: &'a CardProfile,
    ) -> impl Iterator<Item = (&'a str, Option<&'a CompiledRule>)> + 'a {
        card.rules
            .iter()
            .map(move |rule_id| (rule_id.as_str(), self.rules.get(rule_id)))
    }

    pub fn findings(&self) -> &[AuditFinding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleDefinition;

    #[test]
    fn test_build_compiles_and_audits() {
        let mut unowned = CardProfile::new("blue", "rc", &[]);
        unowned.owned = false;

        let catalog = RewardCatalog::build(RewardConfig {
            cards: vec![CardProfile::new("red", "rc", &["base", "ghost"]), unowned],
            rules: vec![RuleDefinition::base("base", 0.004)],
            ..Default::default()
        });

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.owned_cards().count(), 1);

        let card = catalog.card("red").unwrap();
        let rules: Vec<_> = catalog
            .card_rules(card)
            .map(|(id, rule)| (id, rule.is_some()))
            .collect();
        assert_eq!(rules, vec![("base", true), ("ghost", false)]);

        // 悬空引用 + 两张卡缺少换算
        assert_eq!(catalog.findings().len(), 3);
    }
}
