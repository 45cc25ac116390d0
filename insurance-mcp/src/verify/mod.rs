//! End-to-end verification of a running insurance backend.
//!
//! A fixed, strictly sequential checklist: authentication, the policy and
//! claim lifecycles, risk assessment, validation errors, one smoke check per
//! secondary resource, cleanup and a summary. Identifiers created early are
//! reused by later checks through [`RunContext`].

mod backend;
pub mod checks;
mod context;
mod report;
mod runner;

pub use backend::{BackendClient, Response};
pub use context::{CreatedResources, ResourceKind, RunContext, TestResults};
pub use report::Reporter;
pub use runner::{run_all, Outcome, RunStatus};

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("could not connect to {base_url}")]
    Unreachable { base_url: String },
    #[error("request to backend failed")]
    Request(#[from] reqwest::Error),
    #[error("failed to write report")]
    Output(#[from] std::io::Error),
}
