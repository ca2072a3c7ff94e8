use crate::form::{ApplyForm, BidForm, ValidationErrors};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error("submission rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Bid,
    Application,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bid => "bid",
            Self::Application => "application",
        })
    }
}

/// Acknowledgement for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub reference: String,
    pub target_id: String,
    pub kind: SubmissionKind,
}

#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit_bid(&self, route_id: &str, form: &BidForm) -> Result<Receipt, SubmissionError>;

    async fn submit_application(
        &self,
        solicitation_id: &str,
        form: &ApplyForm,
    ) -> Result<Receipt, SubmissionError>;
}

/// Accepts every valid form after `delay`. Nothing leaves the process.
pub struct SimulatedSubmissionService {
    delay: Duration,
    counter: AtomicU64,
}

impl Default for SimulatedSubmissionService {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl SimulatedSubmissionService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            counter: AtomicU64::new(0),
        }
    }

    async fn accept(
        &self,
        kind: SubmissionKind,
        target_id: &str,
    ) -> Result<Receipt, SubmissionError> {
        let target_id = target_id.trim();
        if target_id.is_empty() {
            return Err(SubmissionError::Rejected(format!(
                "{kind} has no listing to attach to"
            )));
        }
        tokio::time::sleep(self.delay).await;
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let receipt = Receipt {
            reference: format!("{kind}-{seq:06}"),
            target_id: target_id.to_string(),
            kind,
        };
        log::info!(
            "Accepted {} {} for {} (simulated, not stored)",
            kind,
            receipt.reference,
            receipt.target_id
        );
        Ok(receipt)
    }
}

#[async_trait]
impl SubmissionService for SimulatedSubmissionService {
    async fn submit_bid(&self, route_id: &str, form: &BidForm) -> Result<Receipt, SubmissionError> {
        form.validate()?;
        self.accept(SubmissionKind::Bid, route_id).await
    }

    async fn submit_application(
        &self,
        solicitation_id: &str,
        form: &ApplyForm,
    ) -> Result<Receipt, SubmissionError> {
        form.validate()?;
        self.accept(SubmissionKind::Application, solicitation_id).await
    }
}
