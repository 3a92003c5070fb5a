//! Filtering, sorting and pagination shared by every list surface.
//!
//! Predicates are combined conjunctively and are independent of each other,
//! so the order they are added in does not matter. The sort is stable and
//! applied after filtering; pagination is a plain 1-based slice that is never
//! clamped to the last page.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// A record that can appear in a listing.
pub trait Listable {
    /// Records failing their required-field check are dropped from results.
    fn is_listable(&self) -> bool {
        true
    }

    /// Numeric weight used by the popular / most-viewed orders.
    fn popularity(&self) -> u64 {
        0
    }

    /// Text used by the alphabetical order.
    fn label(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageView<T> {
    pub visible: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Core of the engine: filter, sort, slice.
pub fn paginate<T: Clone>(
    records: &[T],
    predicates: &[Predicate<'_, T>],
    comparator: Option<&dyn Fn(&T, &T) -> Ordering>,
    page: usize,
    page_size: usize,
) -> PageView<T> {
    let mut filtered: Vec<T> = records
        .iter()
        .filter(|r| predicates.iter().all(|p| p(r)))
        .cloned()
        .collect();
    if let Some(cmp) = comparator {
        filtered.sort_by(|a, b| cmp(a, b));
    }

    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = filtered.len();
    let total_pages = total.div_ceil(page_size).max(1);
    let start = (page - 1).saturating_mul(page_size);
    let visible = filtered.into_iter().skip(start).take(page_size).collect();
    PageView { visible, page, total_pages, total }
}

/// Categorical filter value; `"all"` (or no value) disables the predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    All,
    Exactly(String),
}

impl Choice {
    pub const SENTINEL: &'static str = "all";

    pub fn admits(&self, value: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Exactly(want) => want == value,
        }
    }
}

impl From<Option<&str>> for Choice {
    fn from(v: Option<&str>) -> Self {
        match v.map(str::trim) {
            None | Some("") | Some(Choice::SENTINEL) => Choice::All,
            Some(s) => Choice::Exactly(s.to_string()),
        }
    }
}

/// Upload-age bucket used by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    pub fn admits(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = (now - at).num_days();
        match self {
            DateRange::Last7Days => age <= 7,
            DateRange::Last30Days => age <= 30,
            DateRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Input is already newest-first; leaves order untouched.
    #[default]
    Recent,
    #[serde(alias = "views")]
    Popular,
    Alphabetical,
}

/// Case-folded comparison with a byte-order tie-break, so "apple" and
/// "Apple" sort together but deterministically.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Builder over [`paginate`] used by the HTTP surfaces.
pub struct Listing<'a, T> {
    records: &'a [T],
    predicates: Vec<Predicate<'a, T>>,
    order: SortOrder,
}

impl<'a, T: Listable + Clone> Listing<'a, T> {
    pub fn new(records: &'a [T]) -> Self {
        let listable: Predicate<'a, T> = Box::new(|r: &T| r.is_listable());
        Self {
            records,
            predicates: vec![listable],
            order: SortOrder::Recent,
        }
    }

    pub fn matching(mut self, predicate: impl Fn(&T) -> bool + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Case-insensitive substring match over the fields `fields` returns.
    /// A blank query adds no predicate.
    pub fn search<F>(self, query: Option<&str>, fields: F) -> Self
    where
        F: Fn(&T) -> Vec<&str> + 'a,
    {
        let needle = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return self,
        };
        self.matching(move |r| fields(r).into_iter().any(|f| contains_ci(f, &needle)))
    }

    pub fn category<F>(self, choice: Choice, field: F) -> Self
    where
        F: Fn(&T) -> &str + 'a,
    {
        if choice == Choice::All {
            return self;
        }
        self.matching(move |r| choice.admits(field(r)))
    }

    pub fn within<F>(self, range: DateRange, now: DateTime<Utc>, field: F) -> Self
    where
        F: Fn(&T) -> DateTime<Utc> + 'a,
    {
        if range == DateRange::All {
            return self;
        }
        self.matching(move |r| range.admits(field(r), now))
    }

    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(self, page: usize, page_size: usize) -> PageView<T> {
        let by_popularity = |a: &T, b: &T| b.popularity().cmp(&a.popularity());
        let by_label = |a: &T, b: &T| collate(a.label(), b.label());
        let cmp: Option<&dyn Fn(&T, &T) -> Ordering> = match self.order {
            SortOrder::Recent => None,
            SortOrder::Popular => Some(&by_popularity),
            SortOrder::Alphabetical => Some(&by_label),
        };
        paginate(self.records, &self.predicates, cmp, page, page_size)
    }
}
