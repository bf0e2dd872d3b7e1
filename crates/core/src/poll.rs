//! Waits for a submitted build to reach a terminal state.

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info};

use crate::{
    client::JankyClient,
    config::PollSettings,
    error::{Error, Result},
    types::{BuildId, BuildStatus, BuildSubmission},
};

/// Where a build stands after a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Succeeded,
    Failed,
}

impl From<&BuildStatus> for PollState {
    fn from(status: &BuildStatus) -> Self {
        match (status.completed, status.green) {
            (true, true) => PollState::Succeeded,
            (true, false) => PollState::Failed,
            (false, _) => PollState::Waiting,
        }
    }
}

/// Polls the status endpoint once per interval until the build completes.
///
/// The first poll happens one interval after the call. The overall timeout is
/// a hard limit: a status request still in flight when it fires is dropped.
///
/// Returns the final status of a green build.
///
/// # Errors
///
/// - [`Error::BuildFailed`] if the build completes without going green
/// - [`Error::Timeout`] if the build does not complete in time
/// - [`Error::Rejected`] / [`Error::Decode`] if a status response is unusable
/// - [`Error::InvalidPollSettings`] if the interval is zero or too large
pub async fn wait_for_build(
    client: &JankyClient,
    build_id: &BuildId,
    submission: &BuildSubmission,
    settings: &PollSettings,
) -> Result<BuildStatus> {
    let started = Instant::now();
    let first_tick = first_tick(settings, started)?;
    let deadline = sleep(settings.timeout);
    tokio::pin!(deadline);

    let mut ticker = interval_at(first_tick, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(build_id = %build_id, "Waiting for Janky build to complete");
    let mut polls = 0u32;

    loop {
        let status = tokio::select! {
            biased;
            _ = &mut deadline => {
                return Err(Error::Timeout { elapsed: started.elapsed() });
            }
            status = next_status(&mut ticker, client, build_id) => status?,
        };
        polls += 1;

        match PollState::from(&status) {
            PollState::Succeeded => {
                info!(build_id = %build_id, sha = %status.sha, polls, "Janky build succeeded");
                return Ok(status);
            }
            PollState::Failed => {
                return Err(Error::BuildFailed {
                    url: submission.url.clone(),
                });
            }
            PollState::Waiting => {
                info!(
                    build_id = %build_id,
                    "Build still in progress, will poll for status again in [{:?}]",
                    settings.interval
                );
            }
        }
    }
}

fn first_tick(settings: &PollSettings, started: Instant) -> Result<Instant> {
    if settings.interval.is_zero() {
        return Err(Error::InvalidPollSettings(
            "poll interval must be greater than zero".to_string(),
        ));
    }

    // The ticker adds the interval again after every tick.
    started
        .checked_add(settings.interval)
        .filter(|first| first.checked_add(settings.interval).is_some())
        .ok_or_else(|| {
            Error::InvalidPollSettings(format!(
                "poll interval {:?} is too large",
                settings.interval
            ))
        })
}

async fn next_status(
    ticker: &mut Interval,
    client: &JankyClient,
    build_id: &BuildId,
) -> Result<BuildStatus> {
    ticker.tick().await;
    fetch_status(client, build_id).await
}

/// Fetches the current status of a build.
pub async fn fetch_status(client: &JankyClient, build_id: &BuildId) -> Result<BuildStatus> {
    let response = client.get(&format!("{build_id}/status")).await?;

    if !response.status.is_success() {
        return Err(Error::Rejected {
            what: "status request",
            status: response.status.as_u16(),
            body: response.body,
        });
    }

    let status: BuildStatus = response.json("build status")?;
    debug!(
        build_id = %build_id,
        completed = status.completed,
        green = status.green,
        started_at = %status.started_at,
        "Received build status"
    );
    Ok(status)
}
