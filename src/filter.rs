//! Class list filtering
//!
//! Pure functions turning the full class list, the saved list and the
//! current criteria into the list shown to the user.

use crate::models::ClassRecord;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    pub query: String,
    pub category: String,
    pub on_site_only: bool,
}

impl ClassFilter {
    pub fn keeps(&self, item: &ClassRecord) -> bool {
        if self.on_site_only && !item.is_on_site() {
            return false;
        }

        let category = self.category.trim();
        if !category.is_empty()
            && !item
                .category
                .to_lowercase()
                .contains(&category.to_lowercase())
        {
            return false;
        }

        item.matches(&self.query)
    }
}

/// Visible classes for `filter`, sorted by title.
///
/// With no classes loaded at all the saved list is searched instead, so
/// bookmarked classes stay reachable offline.
pub fn apply_filters(
    classes: &[ClassRecord],
    saved: &[ClassRecord],
    filter: &ClassFilter,
) -> Vec<ClassRecord> {
    let source = if classes.is_empty() { saved } else { classes };

    let mut visible: Vec<ClassRecord> = source
        .iter()
        .filter(|item| filter.keeps(item))
        .cloned()
        .collect();
    visible.sort_by(|a, b| a.title.cmp(&b.title));
    visible
}

/// Distinct non-blank categories, sorted.
pub fn categories(classes: &[ClassRecord]) -> Vec<String> {
    classes
        .iter()
        .map(|item| item.category.trim())
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Saved classes in schedule order: by time, then title.
pub fn schedule_order(saved: &[ClassRecord]) -> Vec<ClassRecord> {
    let mut ordered = saved.to_vec();
    ordered.sort_by(|a, b| (&a.time, &a.title).cmp(&(&b.time, &b.title)));
    ordered
}
