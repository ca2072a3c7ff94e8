//! # Pocket View
//!
//! Filter, sort and paginate listing records.
//!
//! [`compute_view`] is a pure function of `(records, query)`: the base record
//! set is only borrowed and every call returns fresh copies of the visible
//! page.

mod engine;
mod listing;
mod query;

pub use engine::{clamp_page, collate, compute_view, SortKey, Viewable};
pub use listing::{RouteFilters, RouteSortField, SolicitationFilters, SolicitationSortField};
pub use query::{
    ParseSortError, RouteQuery, SolicitationQuery, SortDirection, SortSpec, View, ViewQuery,
    DEFAULT_PAGE_SIZE,
};
