use std::sync::OnceLock;

use regex::Regex;
use reqwest::StatusCode;
use tracing::info;

use crate::{
    client::JankyClient,
    error::{Error, Result},
    types::{BuildId, BuildRequest, BuildSubmission},
};

/// Asks Janky to start a build.
///
/// # Errors
///
/// - [`Error::NotFound`] if Janky answers 404 (unknown job or foreign branch)
/// - [`Error::Rejected`] for any other status than 201
/// - [`Error::Decode`] if the 201 body is not a build submission
pub async fn submit_build(
    client: &JankyClient,
    request: &BuildRequest,
) -> Result<BuildSubmission> {
    info!(
        job = request.job(),
        branch = request.branch(),
        force = %request.force(),
        env_vars = request.env_vars().len(),
        "Triggering Janky build"
    );

    let response = client.post_json("builds", request).await?;

    match response.status {
        StatusCode::CREATED => {
            let submission: BuildSubmission = response.json("build response")?;
            info!(
                result = %submission.result,
                url = %submission.url,
                "Successfully triggered Janky"
            );
            Ok(submission)
        }
        StatusCode::NOT_FOUND => Err(Error::NotFound {
            job: request.job().to_string(),
            branch: request.branch().to_string(),
        }),
        status => Err(Error::Rejected {
            what: "build request",
            status: status.as_u16(),
            body: response.body,
        }),
    }
}

/// Pulls the build number out of a result message such as
/// `"Build #1234 (/1234/) of my-job/main queued"`.
///
/// The first run of digits wrapped in slashes wins.
pub fn extract_build_id(result: &str) -> Result<BuildId> {
    static BUILD_ID: OnceLock<Regex> = OnceLock::new();
    let pattern = BUILD_ID.get_or_init(|| Regex::new("/([0-9]+)/").expect("valid build id regex"));

    pattern
        .captures(result)
        .and_then(|captures| captures.get(1))
        .map(|digits| BuildId::from_digits(digits.as_str()))
        .ok_or_else(|| Error::MissingBuildId {
            result: result.to_string(),
        })
}
