//! Tag filter controls and per-card visibility.

use crate::render::GalleryCard;
use std::fmt;

/// Value carried by a filter control.
pub const ALL_FILTER: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    All,
    Tag(String),
}

impl FilterValue {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == ALL_FILTER {
            FilterValue::All
        } else {
            FilterValue::Tag(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FilterValue::All => ALL_FILTER,
            FilterValue::Tag(tag) => tag,
        }
    }

    /// Exact tag membership; `all` matches everything.
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Tag(tag) => tags.iter().any(|t| t == tag),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn visibility(cards: &[GalleryCard], filter: &FilterValue) -> Vec<bool> {
    cards.iter().map(|c| filter.matches(&c.tags)).collect()
}

/// The row of filter controls. Exactly one control is active.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBar {
    controls: Vec<FilterValue>,
    active: usize,
}

impl Default for FilterBar {
    fn default() -> Self {
        FilterBar::new(Vec::new())
    }
}

impl FilterBar {
    pub fn new(mut controls: Vec<FilterValue>) -> Self {
        controls.retain(|c| *c != FilterValue::All);
        controls.insert(0, FilterValue::All);
        FilterBar { controls, active: 0 }
    }

    pub fn controls(&self) -> &[FilterValue] {
        &self.controls
    }

    pub fn active(&self) -> &FilterValue {
        &self.controls[self.active]
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == index
    }

    /// Mark `value` active. Returns false, leaving the bar untouched, when no
    /// control carries that value.
    pub fn select(&mut self, value: &FilterValue) -> bool {
        match self.controls.iter().position(|c| c == value) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    /// Swap the control set, keeping the active value when it still exists.
    pub fn replace_controls(&mut self, controls: Vec<FilterValue>) {
        let current = self.active().clone();
        *self = FilterBar::new(controls);
        self.select(&current);
    }
}
