//! Presentation views and the container backing each of them.

use crate::item::{AppCategory, ItemInfo};
use std::collections::BTreeMap;

/// A view the presentation layer can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// Default view, usage ordered. Also the "everything changed" sentinel
    /// in change notifications.
    All,
    /// User arranged view; shares the usage ordered list.
    Custom,
    Search,
    /// One header per category.
    CategoryList,
    Category(AppCategory),
}

/// Which container answers a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewSource {
    UsageOrdered,
    SearchResults,
    CategoryHeaders,
    CategoryBucket(AppCategory),
}

impl View {
    pub fn source(&self) -> ViewSource {
        match *self {
            View::All | View::Custom => ViewSource::UsageOrdered,
            View::Search => ViewSource::SearchResults,
            View::CategoryList => ViewSource::CategoryHeaders,
            View::Category(category) => ViewSource::CategoryBucket(category),
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::All => write!(f, "All"),
            View::Custom => write!(f, "Custom"),
            View::Search => write!(f, "Search"),
            View::CategoryList => write!(f, "Categories"),
            View::Category(category) => write!(f, "{}", category),
        }
    }
}

/// Category -> items, in the order of the list it was built from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryIndex {
    buckets: BTreeMap<AppCategory, Vec<ItemInfo>>,
}

impl CategoryIndex {
    /// Build from an already preset-ordered list. Always a full rebuild.
    pub fn build(items: &[ItemInfo]) -> Self {
        let mut buckets: BTreeMap<AppCategory, Vec<ItemInfo>> = BTreeMap::new();
        for item in items {
            buckets.entry(item.category).or_default().push(item.clone());
        }
        Self { buckets }
    }

    pub fn get(&self, category: AppCategory) -> &[ItemInfo] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = AppCategory> + '_ {
        self.buckets.keys().copied()
    }

    /// Total number of indexed items.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemInfo> {
        self.buckets.values().flatten()
    }
}

/// Header records for the category list view.
pub fn category_headers() -> Vec<ItemInfo> {
    AppCategory::ALL
        .iter()
        .map(|category| ItemInfo::category_header(*category))
        .collect()
}
