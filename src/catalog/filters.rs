/// Filtering and ordering utilities shared by every marketplace collection
///
/// All functions are pure. Filters consume their input and return a new
/// vector; `sort_items` sorts a copy. Only `sort_listings` sorts in place and
/// is meant for freshly filtered vectors owned by the caller.

use crate::catalog::types::{non_empty, AgentTemplate, Template};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Sort keys that order by publish date instead of by name
const DATE_SORT_KEYS: [&str; 2] = ["popular", "recent"];

/// Read access to the fields filters and comparators look at
pub trait Listing {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
    fn tags(&self) -> &[String];
    fn is_official(&self) -> bool;

    /// ISO-8601 publish timestamp, if the collection tracks one
    fn published_at(&self) -> Option<&str> {
        None
    }
}

impl Listing for Template {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
    fn is_official(&self) -> bool {
        self.is_official
    }
}

impl Listing for AgentTemplate {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
    fn is_official(&self) -> bool {
        self.is_official
    }
    fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }
}

/// Keep only items whose category equals `category` exactly
///
/// An empty category disables the filter and returns the input unchanged.
pub fn filter_by_category<T: Listing>(items: Vec<T>, category: &str) -> Vec<T> {
    if category.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.category() == category)
        .collect()
}

/// Case-insensitive substring search across name, description and tags
///
/// An empty query disables the filter and returns the input unchanged.
pub fn filter_by_search_query<T: Listing>(items: Vec<T>, query: &str) -> Vec<T> {
    if query.is_empty() {
        return items;
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| matches_query(item, &needle))
        .collect()
}

fn matches_query<T: Listing>(item: &T, needle: &str) -> bool {
    item.name().to_lowercase().contains(needle)
        || item.description().to_lowercase().contains(needle)
        || item
            .tags()
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Category filter followed by search filter
pub fn apply_filters<T: Listing>(items: Vec<T>, category: &str, query: &str) -> Vec<T> {
    filter_by_search_query(filter_by_category(items, category), query)
}

/// Most recent first; a missing date counts as the epoch
///
/// Dates that cannot be parsed sort after every parseable one and tie with
/// each other, so the stable sort keeps their relative order.
pub fn compare_by_date<T: Listing>(a: &T, b: &T) -> Ordering {
    match (published_timestamp(a), published_timestamp(b)) {
        (Some(date_a), Some(date_b)) => date_b.cmp(&date_a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Alphabetical by name, case-insensitive first, lowercase before uppercase
pub fn compare_by_name<T: Listing>(a: &T, b: &T) -> Ordering {
    let (name_a, name_b) = (a.name(), b.name());
    name_a
        .to_lowercase()
        .cmp(&name_b.to_lowercase())
        .then_with(|| name_b.cmp(name_a))
}

/// Official items before non-official ones
pub fn compare_official_status<T: Listing>(a: &T, b: &T) -> Ordering {
    b.is_official().cmp(&a.is_official())
}

/// Return a sorted copy of `items`
pub fn sort_items<T: Listing + Clone>(items: &[T], sort_by: &str, prioritize_official: bool) -> Vec<T> {
    let mut sorted = items.to_vec();
    sort_listings(&mut sorted, sort_by, prioritize_official);
    sorted
}

/// Stable in-place sort with the composite marketplace comparator
pub fn sort_listings<T: Listing>(items: &mut [T], sort_by: &str, prioritize_official: bool) {
    let by_date = DATE_SORT_KEYS.contains(&sort_by);
    items.sort_by(|a, b| {
        if prioritize_official {
            let official = compare_official_status(a, b);
            if official != Ordering::Equal {
                return official;
            }
        }
        if by_date {
            compare_by_date(a, b)
        } else {
            compare_by_name(a, b)
        }
    });
}

/// Milliseconds since the epoch; `None` when the date is unparseable
fn published_timestamp<T: Listing>(item: &T) -> Option<i64> {
    match non_empty(item.published_at()) {
        None => Some(0),
        Some(raw) => parse_timestamp(raw),
    }
}

/// Accepts RFC 3339, naive date-times (read as UTC) and plain dates
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}
