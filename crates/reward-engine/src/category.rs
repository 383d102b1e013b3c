//! 类别解析
//!
//! 把原始交易类别解析为某张卡的有效类别，并提供按层级回退的匹配判断。
//! 解析顺序：卡片专属映射 -> 产品线偏好 -> 通用别名 -> 原始类别。
//! 偏好必须先于通用别名检查，因为它可能把海外交易归入偏好专属的类别。

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::models::{AllocationBucket, AllocationConfig, CategoryHierarchy, ResolverConfig, Settings};

#[derive(Debug, Clone, Default)]
pub struct CategoryResolver {
    hierarchy: CategoryHierarchy,
    config: ResolverConfig,
}

impl CategoryResolver {
    pub fn new(hierarchy: CategoryHierarchy, config: ResolverConfig) -> Self {
        Self { hierarchy, config }
    }

    /// 解析有效类别
    pub fn resolve(&self, card_id: &str, raw_category: &str, settings: &Settings) -> String {
        if let Some(effective) = self
            .config
            .card_overrides
            .get(card_id)
            .and_then(|overrides| overrides.get(raw_category))
        {
            return effective.clone();
        }

        if let Some(effective) = self.resolve_preference(card_id, raw_category, settings) {
            return effective;
        }

        if let Some(alias) = self.config.aliases.get(raw_category) {
            return alias.clone();
        }

        raw_category.to_string()
    }

    fn resolve_preference(
        &self,
        card_id: &str,
        raw_category: &str,
        settings: &Settings,
    ) -> Option<String> {
        let group = self
            .config
            .preferences
            .iter()
            .find(|g| g.card_ids.iter().any(|id| id == card_id))?;
        let choice = settings.preference_for(&group.product_line)?;
        let option = group.options.get(choice)?;

        self.is_match(&option.categories, raw_category)
            .then(|| option.effective.clone())
    }

    /// 类别是否命中匹配集合：直接命中，或任一祖先命中
    pub fn is_match<S: AsRef<str>>(&self, match_set: &[S], category: &str) -> bool {
        if match_set.iter().any(|c| c.as_ref() == category) {
            return true;
        }
        self.ancestors(category)
            .iter()
            .any(|ancestor| match_set.iter().any(|c| c.as_ref() == ancestor))
    }

    /// 祖先类别
    ///
    /// 默认只返回直接父类别；层级配置为 transitive 时沿祖先链回溯，遇环即止。
    pub fn ancestors(&self, category: &str) -> Vec<String> {
        if !self.hierarchy.transitive {
            return self.hierarchy.parents_of(category).to_vec();
        }

        let mut seen: HashSet<&str> = HashSet::from([category]);
        let mut queue: VecDeque<&str> = VecDeque::from([category]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for parent in self.hierarchy.parents_of(current) {
                if seen.insert(parent.as_str()) {
                    result.push(parent.clone());
                    queue.push_back(parent.as_str());
                }
            }
        }

        result
    }

    /// 有效类别所属的自选分配桶
    pub fn bucket_of(
        &self,
        allocation: &AllocationConfig,
        category: &str,
    ) -> Option<AllocationBucket> {
        allocation
            .buckets
            .iter()
            .find(|(_, categories)| self.is_match(categories, category))
            .map(|(bucket, _)| *bucket)
    }

    /// 配置中出现过的全部类别（层级、映射、别名、偏好），用于审计
    pub fn known_categories(&self) -> BTreeSet<String> {
        let mut known = BTreeSet::new();

        for (category, parents) in &self.hierarchy.parents {
            known.insert(category.clone());
            known.extend(parents.iter().cloned());
        }
        for overrides in self.config.card_overrides.values() {
            for (raw, effective) in overrides {
                known.insert(raw.clone());
                known.insert(effective.clone());
            }
        }
        for (raw, alias) in &self.config.aliases {
            known.insert(raw.clone());
            known.insert(alias.clone());
        }
        for group in &self.config.preferences {
            for option in group.options.values() {
                known.extend(option.categories.iter().cloned());
                known.insert(option.effective.clone());
            }
        }

        known
    }
}
