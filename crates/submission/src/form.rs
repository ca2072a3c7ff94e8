use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_BID_AMOUNT: f64 = 15.0;
const MAX_EXPERIENCE_YEARS: u32 = 50;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$").expect("valid phone regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid submission ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    fn check(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            self.errors.push(FieldError { field, message });
        }
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn check_contact(errors: &mut ValidationErrors, name: &str, email: &str, phone: &str) {
    errors.check(
        name.trim().chars().count() >= 2,
        "name",
        "Name must be at least 2 characters",
    );
    errors.check(
        EMAIL_RE.is_match(email.trim()),
        "email",
        "Invalid email address",
    );
    errors.check(
        PHONE_RE.is_match(phone.trim()),
        "phone",
        "Invalid phone number format",
    );
}

fn check_experience(errors: &mut ValidationErrors, experience: u32) {
    errors.check(
        experience <= MAX_EXPERIENCE_YEARS,
        "experience",
        "Years of experience cannot exceed 50",
    );
}

/// A bid on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Dollars.
    pub amount: f64,
    pub experience: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BidForm {
    /// Reports every failing field, not just the first.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_contact(&mut errors, &self.name, &self.email, &self.phone);
        errors.check(
            self.amount.is_finite() && self.amount >= MIN_BID_AMOUNT,
            "amount",
            "Bid amount must be at least $15.00",
        );
        check_experience(&mut errors, self.experience);
        errors.into_result()
    }
}

/// An application to drive a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience: u32,
    pub license: String,
    pub vehicle: String,
    pub terms: bool,
}

impl ApplyForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_contact(&mut errors, &self.name, &self.email, &self.phone);
        check_experience(&mut errors, self.experience);
        errors.check(
            self.license.trim().chars().count() >= 5,
            "license",
            "Driver's license number is required",
        );
        errors.check(
            !self.vehicle.trim().is_empty(),
            "vehicle",
            "Please select a vehicle type",
        );
        errors.check(
            self.terms,
            "terms",
            "You must agree to the terms and conditions",
        );
        errors.into_result()
    }
}
