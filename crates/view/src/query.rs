use crate::listing::{RouteFilters, RouteSortField, SolicitationFilters, SolicitationSortField};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<S> {
    pub field: S,
    pub direction: SortDirection,
}

impl<S> SortSpec<S> {
    pub fn ascending(field: S) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: S) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort field '{0}'")]
pub struct ParseSortError(pub String);

/// Accepts `field`, `field-asc` and `field-desc` (e.g. `length-desc`).
impl<S> FromStr for SortSpec<S>
where
    S: FromStr<Err = ParseSortError>,
{
    type Err = ParseSortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (field, direction) = match raw.rsplit_once('-') {
            Some((field, suffix)) if suffix.eq_ignore_ascii_case("desc") => {
                (field, SortDirection::Descending)
            }
            Some((field, suffix)) if suffix.eq_ignore_ascii_case("asc") => {
                (field, SortDirection::Ascending)
            }
            _ => (raw, SortDirection::Ascending),
        };
        Ok(Self {
            field: field.parse()?,
            direction,
        })
    }
}

/// Every user-controlled input of a view, passed whole on each recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery<F, S> {
    pub search: String,
    pub filters: F,
    /// `None` keeps source order.
    pub sort: Option<SortSpec<S>>,
    /// 1-based.
    pub page: NonZeroUsize,
    pub page_size: NonZeroUsize,
}

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

impl<F: Default, S> Default for ViewQuery<F, S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: F::default(),
            sort: None,
            page: NonZeroUsize::MIN,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<F, S> ViewQuery<F, S> {
    #[must_use]
    pub fn with_page(mut self, page: NonZeroUsize) -> Self {
        self.page = page;
        self
    }
}

pub type RouteQuery = ViewQuery<RouteFilters, RouteSortField>;
pub type SolicitationQuery = ViewQuery<SolicitationFilters, SolicitationSortField>;

/// The visible page of a filtered, sorted record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View<T> {
    pub page_items: Vec<T>,
    /// `0` when nothing matched.
    pub total_pages: usize,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}
