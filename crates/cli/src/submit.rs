use crate::{print_stdout, ApplyArgs, BidArgs};
use anyhow::Result;
use pocket_protocol::serialize_json;
use pocket_submission::{
    ApplyForm, BidForm, Receipt, SimulatedSubmissionService, SubmissionError, SubmissionService,
};
use std::process::ExitCode;
use std::time::Duration;

pub(crate) async fn run_bid(args: BidArgs) -> Result<ExitCode> {
    let service = SimulatedSubmissionService::new(Duration::from_millis(args.delay_ms));
    let form = BidForm {
        name: args.contact.name,
        email: args.contact.email,
        phone: args.contact.phone,
        amount: args.amount,
        experience: args.contact.experience,
        message: args.message,
    };
    let outcome = service.submit_bid(&args.route, &form).await;
    report(outcome, args.json)
}

pub(crate) async fn run_apply(args: ApplyArgs) -> Result<ExitCode> {
    let service = SimulatedSubmissionService::new(Duration::from_millis(args.delay_ms));
    let form = ApplyForm {
        name: args.contact.name,
        email: args.contact.email,
        phone: args.contact.phone,
        experience: args.contact.experience,
        license: args.license,
        vehicle: args.vehicle,
        terms: args.agree_terms,
    };
    let outcome = service
        .submit_application(&args.solicitation, &form)
        .await;
    report(outcome, args.json)
}

fn report(outcome: Result<Receipt, SubmissionError>, json: bool) -> Result<ExitCode> {
    match outcome {
        Ok(receipt) => {
            if json {
                print_stdout(&serialize_json(&receipt)?)?;
            } else {
                print_stdout(&format!(
                    "Submitted {} {} for {} (simulated; nothing was stored)",
                    receipt.kind, receipt.reference, receipt.target_id
                ))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(SubmissionError::Invalid(errors)) => {
            if json {
                print_stdout(&serialize_json(&errors)?)?;
            } else {
                eprintln!("Submission is invalid:");
                for error in &errors.errors {
                    eprintln!("  {}: {}", error.field, error.message);
                }
            }
            Ok(ExitCode::FAILURE)
        }
        Err(err @ SubmissionError::Rejected(_)) => Err(err.into()),
    }
}
