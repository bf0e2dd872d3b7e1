use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// The `force` value sent to Janky.
///
/// Janky accepts loosely typed values here, so the caller's string is passed
/// through untouched and never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ForceFlag(String);

impl ForceFlag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Default for ForceFlag {
    fn default() -> Self {
        Self("false".to_string())
    }
}

impl fmt::Display for ForceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Environment variables forwarded to the build, parsed from `k1=v1,k2=v2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl FromStr for EnvVars {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut vars = BTreeMap::new();
        if s.trim().is_empty() {
            return Ok(Self(vars));
        }

        for pair in s.split(',') {
            let pair = pair.trim();
            let invalid = |reason| Error::InvalidEnvVar {
                pair: pair.to_string(),
                reason,
            };

            let (key, value) = pair.split_once('=').ok_or_else(|| invalid("missing '='"))?;
            if value.contains('=') {
                return Err(invalid("more than one '='"));
            }
            let key = key.trim();
            if key.is_empty() {
                return Err(invalid("empty key"));
            }
            if vars.insert(key.to_string(), value.trim().to_string()).is_some() {
                return Err(invalid("duplicate key"));
            }
        }

        Ok(Self(vars))
    }
}

/// Body of `POST /api/builds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    #[serde(rename = "buildable_name")]
    job: String,
    #[serde(rename = "branch_name")]
    branch: String,
    force: ForceFlag,
    #[serde(skip_serializing_if = "EnvVars::is_empty")]
    env_vars: EnvVars,
}

impl BuildRequest {
    /// Creates a build request, rejecting an empty job or branch.
    pub fn new(job: &str, branch: &str, force: ForceFlag, env_vars: EnvVars) -> Result<Self> {
        let job = job.trim();
        let branch = branch.trim();
        if job.is_empty() || branch.is_empty() {
            return Err(Error::Usage(
                "job, token and branch flags must be specified".to_string(),
            ));
        }

        Ok(Self {
            job: job.to_string(),
            branch: branch.to_string(),
            force,
            env_vars,
        })
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn force(&self) -> &ForceFlag {
        &self.force
    }

    pub fn env_vars(&self) -> &EnvVars {
        &self.env_vars
    }
}

/// Body of a successful (201) build submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildSubmission {
    #[serde(rename = "Result", alias = "result")]
    pub result: String,
    #[serde(rename = "Url", alias = "url", default)]
    pub url: String,
}

/// Numeric Janky build number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_digits(digits: &str) -> Self {
        Self(digits.to_string())
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `GET /api/{id}/status`.
///
/// Only `completed` and `green` drive the poll loop. The other fields are
/// informational, so `null` decodes to an empty string and scalars of another
/// type (a numeric `Id`) are kept as their text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildStatus {
    #[serde(rename = "Id", alias = "id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "Green", alias = "green", deserialize_with = "nullable_bool")]
    pub green: bool,
    #[serde(
        rename = "Completed",
        alias = "completed",
        deserialize_with = "nullable_bool"
    )]
    pub completed: bool,
    #[serde(
        rename = "StartedAt",
        alias = "started_at",
        deserialize_with = "lenient_string"
    )]
    pub started_at: String,
    #[serde(
        rename = "CompletedAt",
        alias = "completed_at",
        deserialize_with = "lenient_string"
    )]
    pub completed_at: String,
    #[serde(rename = "Sha", alias = "sha", deserialize_with = "lenient_string")]
    pub sha: String,
    #[serde(
        rename = "BuildableName",
        alias = "buildable_name",
        deserialize_with = "lenient_string"
    )]
    pub buildable_name: String,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn nullable_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
