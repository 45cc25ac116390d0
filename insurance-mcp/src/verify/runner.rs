use super::backend::BackendClient;
use super::checks::run_steps;
use super::context::{RunContext, TestResults};
use super::report::Reporter;
use super::VerifyError;
use std::io::Write;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step ran; individual checks may still have failed.
    Completed,
    /// The backend refused the connection.
    Unreachable,
    /// Any other error stopped the run.
    Aborted(String),
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: RunStatus,
    pub context: RunContext,
}

impl Outcome {
    pub fn results(&self) -> &TestResults {
        &self.context.results
    }

    pub fn success(&self) -> bool {
        self.status == RunStatus::Completed && self.results().all_passed()
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Run the whole checklist and print the summary.
///
/// Never returns an error: connection failures and other aborts are folded
/// into [`RunStatus`] after being reported.
pub async fn run_all<W: Write>(client: &BackendClient, out: &mut Reporter<W>) -> Outcome {
    let mut ctx = RunContext::new();
    let result = match out.banner(client.base_url()) {
        Ok(()) => run_steps(client, &mut ctx, out).await,
        Err(e) => Err(VerifyError::Output(e)),
    };

    let status = match result {
        Ok(()) => {
            if let Err(e) = out.summary(&ctx.results) {
                tracing::error!(error = %e, "failed to write summary");
            }
            RunStatus::Completed
        }
        Err(VerifyError::Unreachable { base_url }) => {
            tracing::error!(%base_url, "backend unreachable");
            let _ = out.unreachable(&base_url);
            RunStatus::Unreachable
        }
        Err(err) => {
            let err = anyhow::Error::from(err);
            let message = format!("{err:#}");
            tracing::error!(error = %message, "verification aborted");
            let _ = out.error(&err);
            RunStatus::Aborted(message)
        }
    };

    Outcome {
        status,
        context: ctx,
    }
}
