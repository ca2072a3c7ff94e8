use crate::query::{SortDirection, SortSpec, View, ViewQuery};
use std::cmp::Ordering;
use std::num::NonZeroUsize;

/// Comparable value of a record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => collate(a, b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// A record type the engine can search, filter and sort.
pub trait Viewable {
    type Filters;
    type SortField: Copy;

    /// Fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    fn matches_filters(&self, filters: &Self::Filters) -> bool;

    fn sort_key(&self, field: Self::SortField) -> SortKey<'_>;
}

/// Locale-style string ordering: case-insensitive first, lowercase before
/// uppercase when the letters agree.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| b.cmp(a))
}

/// Computes one page of `records` for `query`.
///
/// Pages past the end come back empty; the engine never clamps `page`.
pub fn compute_view<T>(records: &[T], query: &ViewQuery<T::Filters, T::SortField>) -> View<T>
where
    T: Viewable + Clone,
{
    let needle = query.search.trim().to_lowercase();
    let mut visible: Vec<&T> = records
        .iter()
        .filter(|record| matches_search(*record, &needle))
        .filter(|record| record.matches_filters(&query.filters))
        .collect();

    if let Some(sort) = query.sort {
        sort_records(&mut visible, sort);
    }

    let total_count = visible.len();
    let page_size = query.page_size.get();
    let total_pages = total_count.div_ceil(page_size);
    let start = (query.page.get() - 1).saturating_mul(page_size);
    let page_items = visible
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    View {
        page_items,
        total_pages,
        total_count,
        page: query.page.get(),
        page_size,
    }
}

fn matches_search<T: Viewable>(record: &T, needle: &str) -> bool {
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

fn sort_records<T: Viewable>(records: &mut [&T], sort: SortSpec<T::SortField>) {
    // `sort_by` is stable, so equal keys keep their source order either way.
    records.sort_by(|a, b| {
        let ordering = a.sort_key(sort.field).compare(&b.sort_key(sort.field));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Brings a requested page into `1..=total_pages` (page 1 when empty).
#[must_use]
pub fn clamp_page(page: usize, total_pages: usize) -> NonZeroUsize {
    let clamped = page.clamp(1, total_pages.max(1));
    NonZeroUsize::new(clamped).unwrap_or(NonZeroUsize::MIN)
}
