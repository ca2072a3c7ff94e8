//! Bid and application submissions for route and solicitation listings.
//!
//! Forms are validated locally; delivery goes through [`SubmissionService`].
//! The only implementation shipped is [`SimulatedSubmissionService`], which
//! accepts valid forms after a short delay and stores nothing.

mod form;
mod service;

pub use form::{ApplyForm, BidForm, FieldError, ValidationErrors, MIN_BID_AMOUNT};
pub use service::{
    Receipt, SimulatedSubmissionService, SubmissionError, SubmissionKind, SubmissionService,
};
