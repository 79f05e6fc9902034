/// Per-source acceptance rules, applied in a fixed order with the first
/// failing rule rejecting the listing: category whitelist, recruitment
/// keyword blacklist, sentinel titles.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    /// Empty means the source has no category filter. When non-empty, a
    /// listing with no category at all is rejected.
    pub category_whitelist: Vec<String>,
    pub recruitment_keywords: Vec<String>,
    /// Exact titles of non-content entries ("see more" links).
    pub sentinel_titles: Vec<String>,
}

impl FilterRules {
    pub fn accepts(&self, title: &str, category: Option<&str>) -> bool {
        if !self.category_whitelist.is_empty() {
            match category {
                Some(c) if self.category_whitelist.iter().any(|w| w == c) => {}
                _ => return false,
            }
        }
        if self.recruitment_keywords.iter().any(|k| title.contains(k.as_str())) {
            return false;
        }
        if self.sentinel_titles.iter().any(|s| s == title) {
            return false;
        }
        true
    }
}

/// Pull the category out of a labelled text node, e.g.
/// `分類：校內活動` with label `分類：` yields `校內活動`.
pub fn category_from_label(text: &str, label: &str) -> Option<String> {
    text.trim()
        .strip_prefix(label)
        .map(|rest| rest.trim().to_string())
}
