//! Theme-aware category grouping
//!
//! Presentation themes list the same taxonomy in different orders. Bucketing
//! only yields a sort key; the stored category is never changed.

use crate::error::{EngineError, EngineResult};
use crate::models::{Category, MergedClassification};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Theme used when a requested theme is unknown
pub const DEFAULT_THEME: &str = "portfolio";

use Category::*;

const BUILTIN_THEMES: &[(&str, &[Category])] = &[
    (
        "portfolio",
        &[Desktop, Web, Library, LearningResource, Cli, DataMl, Infrastructure, Documentation, Other],
    ),
    (
        "research",
        &[Library, DataMl, Web, Cli, Documentation, LearningResource, Infrastructure, Desktop, Other],
    ),
    (
        "educational",
        &[LearningResource, Documentation, Web, Library, Cli, DataMl, Desktop, Infrastructure, Other],
    ),
    (
        "resume",
        &[Web, Desktop, Cli, Library, DataMl, Infrastructure, LearningResource, Documentation, Other],
    ),
];

/// Group heading for a category
pub fn heading(category: Category) -> &'static str {
    match category {
        Web => "Web Applications",
        Desktop => "Desktop Applications",
        Cli => "CLI Tools",
        Library => "Libraries",
        DataMl => "Data & Analysis",
        Infrastructure => "Infrastructure",
        LearningResource => "Learning Resources",
        Documentation => "Documentation",
        Other => "Other Projects",
    }
}

/// A complete display ordering of the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeOrder {
    pub name: String,
    categories: Vec<Category>,
}

impl ThemeOrder {
    /// Build an ordering; categories the theme leaves out follow in taxonomy order
    pub fn new(name: impl Into<String>, listed: &[Category]) -> EngineResult<Self> {
        let name = name.into();
        let mut categories = Vec::with_capacity(Category::ALL.len());
        for category in listed {
            if categories.contains(category) {
                return Err(EngineError::Config(format!(
                    "theme '{}' lists {} twice",
                    name, category
                )));
            }
            categories.push(*category);
        }
        for category in Category::ALL {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        Ok(Self { name, categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Position of `category` in this theme
    pub fn sort_key(&self, category: Category) -> usize {
        self.categories
            .iter()
            .position(|c| *c == category)
            .unwrap_or(self.categories.len())
    }
}

/// Registered themes
#[derive(Debug, Clone)]
pub struct ThemeOrders {
    themes: BTreeMap<String, ThemeOrder>,
}

impl ThemeOrders {
    pub fn builtin() -> Self {
        let themes = BUILTIN_THEMES
            .iter()
            .map(|(name, order)| {
                let categories = order.to_vec();
                (
                    name.to_string(),
                    ThemeOrder {
                        name: name.to_string(),
                        categories,
                    },
                )
            })
            .collect();
        Self { themes }
    }

    /// Add or replace a theme
    pub fn insert(&mut self, name: &str, listed: &[Category]) -> EngineResult<()> {
        let order = ThemeOrder::new(name, listed)?;
        self.themes.insert(name.to_string(), order);
        Ok(())
    }

    /// The named theme, or `portfolio` when unknown
    pub fn get(&self, name: &str) -> &ThemeOrder {
        if let Some(order) = self.themes.get(name) {
            return order;
        }
        debug!("unknown theme '{}', using '{}'", name, DEFAULT_THEME);
        self.themes
            .get(DEFAULT_THEME)
            .or_else(|| self.themes.values().next())
            .unwrap_or(&FALLBACK_ORDER)
    }

    pub fn names(&self) -> Vec<&str> {
        self.themes.keys().map(String::as_str).collect()
    }
}

impl Default for ThemeOrders {
    fn default() -> Self {
        Self::builtin()
    }
}

static FALLBACK_ORDER: ThemeOrder = ThemeOrder {
    name: String::new(),
    categories: Vec::new(),
};

/// Where a repository lands in a themed presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub sort_key: usize,
    pub theme: String,
    pub heading: String,
}

/// Look up the display position of a merged classification's category
pub fn bucket(merged: &MergedClassification, order: &ThemeOrder) -> CategoryBucket {
    CategoryBucket {
        category: merged.category,
        sort_key: order.sort_key(merged.category),
        theme: order.name.clone(),
        heading: heading(merged.category).to_string(),
    }
}

/// One repository to be grouped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub identifier: String,
    pub category: Category,
    pub stars: u64,
}

/// Repositories sharing a category, in theme order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub heading: String,
    pub sort_key: usize,
    pub members: Vec<GroupMember>,
}

/// Group members by category. Groups follow the theme order and empty groups
/// are omitted; members are sorted by stars (descending), then identifier.
pub fn group(members: &[GroupMember], order: &ThemeOrder) -> Vec<CategoryGroup> {
    let mut by_category: BTreeMap<(usize, Category), Vec<GroupMember>> = BTreeMap::new();
    for member in members {
        by_category
            .entry((order.sort_key(member.category), member.category))
            .or_default()
            .push(member.clone());
    }

    by_category
        .into_iter()
        .map(|((sort_key, category), mut members)| {
            members.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| a.identifier.cmp(&b.identifier)));
            CategoryGroup {
                category,
                heading: heading(category).to_string(),
                sort_key,
                members,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateSource;

    fn merged(category: Category) -> MergedClassification {
        MergedClassification {
            category,
            category_source: CandidateSource::Rule,
            topics: vec![],
            confidence: 0.5,
            llm_used: false,
        }
    }

    fn member(id: &str, category: Category, stars: u64) -> GroupMember {
        GroupMember {
            identifier: id.into(),
            category,
            stars,
        }
    }

    #[test]
    fn test_builtin_themes_are_complete() {
        let themes = ThemeOrders::builtin();
        for name in themes.names() {
            let order = themes.get(name);
            assert_eq!(order.categories().len(), Category::ALL.len());
            for category in Category::ALL {
                assert!(order.categories().contains(&category));
            }
        }
    }

    #[test]
    fn test_themes_order_differently() {
        let themes = ThemeOrders::builtin();
        let m = merged(Category::Library);
        assert_eq!(bucket(&m, themes.get("portfolio")).sort_key, 2);
        assert_eq!(bucket(&m, themes.get("research")).sort_key, 0);
    }

    #[test]
    fn test_bucket_never_changes_category() {
        let themes = ThemeOrders::builtin();
        for category in Category::ALL {
            let m = merged(category);
            for name in themes.names() {
                assert_eq!(bucket(&m, themes.get(name)).category, category);
            }
        }
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let themes = ThemeOrders::builtin();
        assert_eq!(themes.get("glitter").name, "portfolio");
    }

    #[test]
    fn test_partial_theme_appends_missing() {
        let order = ThemeOrder::new("mine", &[Category::Other, Category::Web]).unwrap();
        assert_eq!(order.categories()[0], Category::Other);
        assert_eq!(order.categories()[1], Category::Web);
        assert_eq!(order.categories()[2], Category::Desktop);
        assert_eq!(order.categories().len(), Category::ALL.len());
        assert!(ThemeOrder::new("dup", &[Category::Web, Category::Web]).is_err());
    }

    #[test]
    fn test_group_orders_groups_and_members() {
        let themes = ThemeOrders::builtin();
        let members = vec![
            member("a/lib", Category::Library, 5),
            member("a/site", Category::Web, 1),
            member("a/app", Category::Desktop, 2),
            member("b/lib", Category::Library, 50),
            member("a/lib2", Category::Library, 5),
        ];
        let groups = group(&members, themes.get("portfolio"));
        let order: Vec<Category> = groups.iter().map(|g| g.category).collect();
        assert_eq!(order, vec![Category::Desktop, Category::Web, Category::Library]);
        let libs: Vec<&str> = groups[2].members.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(libs, vec!["b/lib", "a/lib", "a/lib2"]);
        assert_eq!(groups[2].heading, "Libraries");
    }
}
