//! Trigger a Janky build and wait for it to finish.
//!
//! A run has two phases. The build is submitted once with `POST /api/builds`,
//! then `GET /api/{id}/status` is polled until the build completes or the
//! poll budget runs out. Both phases share one [`JankyClient`], which retries
//! transient failures.
//!
//! ```no_run
//! use janky_core::{JankyConfig, TriggerParams, trigger_and_wait};
//!
//! # async fn example() -> janky_core::Result<()> {
//! let params = TriggerParams {
//!     job: "my-job".into(),
//!     branch: "main".into(),
//!     token: std::env::var("JANKY_TOKEN").unwrap_or_default(),
//!     force: "false".into(),
//!     env_vars: "DEBUG=1".into(),
//! };
//! let status = trigger_and_wait(&JankyConfig::from_env(), &params).await?;
//! println!("{} is green at {}", status.buildable_name, status.sha);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod retry;
pub mod submit;
pub mod types;

use tracing::info;

pub use auth::Credential;
pub use client::JankyClient;
pub use config::{JankyConfig, PollSettings};
pub use error::{Error, Result};
pub use poll::{PollState, wait_for_build};
pub use retry::RetryPolicy;
pub use submit::{extract_build_id, submit_build};
pub use types::{BuildId, BuildRequest, BuildStatus, BuildSubmission, EnvVars, ForceFlag};

/// Raw inputs for a run, as supplied on the command line.
#[derive(Clone, Default)]
pub struct TriggerParams {
    pub job: String,
    pub branch: String,
    pub token: String,
    pub force: String,
    pub env_vars: String,
}

impl std::fmt::Debug for TriggerParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerParams")
            .field("job", &self.job)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("force", &self.force)
            .field("env_vars", &self.env_vars)
            .finish()
    }
}

impl TriggerParams {
    /// Validates the inputs and builds the request body.
    ///
    /// Nothing is sent over the network before this succeeds.
    pub fn build_request(&self) -> Result<BuildRequest> {
        if self.token.trim().is_empty() {
            return Err(Error::Usage(
                "job, token and branch flags must be specified".to_string(),
            ));
        }
        let env_vars: EnvVars = self.env_vars.parse()?;
        BuildRequest::new(
            &self.job,
            &self.branch,
            ForceFlag::new(self.force.clone()),
            env_vars,
        )
    }
}

/// Submits a build and blocks until it is green.
///
/// # Errors
///
/// Any failure ends the run: bad inputs, a rejected submission, a response
/// without a build id, a failed build or an exhausted poll budget.
pub async fn trigger_and_wait(
    config: &JankyConfig,
    params: &TriggerParams,
) -> Result<BuildStatus> {
    let request = params.build_request()?;
    let client = JankyClient::new(config, Credential::from_token(&params.token))?;

    let submission = submit_build(&client, &request).await?;
    let build_id = extract_build_id(&submission.result)?;
    info!(build_id = %build_id, url = %submission.url, "Tracking Janky build");

    wait_for_build(&client, &build_id, &submission, &config.poll).await
}
