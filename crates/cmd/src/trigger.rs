use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use janky_core::{JankyConfig, TriggerParams, trigger_and_wait};

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Name of the Janky job
    #[arg(long, default_value = "")]
    pub job: String,
    /// Janky API token
    #[arg(long, env = "JANKY_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,
    /// Name of the Git branch
    #[arg(long, default_value = "")]
    pub branch: String,
    /// Force a build even if one has already passed
    #[arg(long, default_value = "false")]
    pub force: String,
    /// Comma separated key=value pairs passed to Janky, e.g. key1=value1,key2=value2
    #[arg(long = "envVars", default_value = "")]
    pub env_vars: String,
    /// Janky base URL [default: JANKY_URL or https://janky.githubapp.com]
    #[arg(long)]
    pub url: Option<String>,
    /// Seconds between status polls [default: JANKY_POLL_INTERVAL or 10]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,
    /// Seconds to wait for the build before giving up [default: JANKY_POLL_TIMEOUT or 18000]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl TriggerArgs {
    fn config(&self) -> JankyConfig {
        let mut config = JankyConfig::from_env();
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.poll_interval {
            config.poll.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout {
            config.poll.timeout = Duration::from_secs(secs);
        }
        config
    }

    fn params(&self) -> TriggerParams {
        TriggerParams {
            job: self.job.clone(),
            branch: self.branch.clone(),
            token: self.token.clone(),
            force: self.force.clone(),
            env_vars: self.env_vars.clone(),
        }
    }
}

pub async fn execute(args: &TriggerArgs) -> Result<()> {
    let config = args.config();
    println!("Environment Variables:");
    println!("{}", args.env_vars);

    let status = trigger_and_wait(&config, &args.params())
        .await
        .with_context(|| {
            format!(
                "Janky build of {} on {} did not succeed",
                args.job, args.branch
            )
        })?;

    println!("Janky build Succeeded!");
    if !status.sha.is_empty() {
        println!("Commit: {}", status.sha);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: TriggerArgs,
    }

    #[test]
    fn parses_go_style_flag_names() {
        let cli = TestCli::parse_from([
            "janky-trigger",
            "--job",
            "my-job",
            "--token",
            "t",
            "--branch",
            "main",
            "--envVars",
            "A=1,B=2",
        ]);

        assert_eq!(cli.args.job, "my-job");
        assert_eq!(cli.args.force, "false");
        assert_eq!(cli.args.env_vars, "A=1,B=2");
    }

    #[test]
    fn flags_override_poll_settings() {
        let cli = TestCli::parse_from([
            "janky-trigger",
            "--url",
            "http://127.0.0.1:1234",
            "--poll-interval",
            "3",
            "--timeout",
            "30",
        ]);
        let config = cli.args.config();

        assert_eq!(config.base_url, "http://127.0.0.1:1234");
        assert_eq!(config.poll.interval, Duration::from_secs(3));
        assert_eq!(config.poll.timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_poll_values_are_rejected() {
        for flag in ["--poll-interval", "--timeout"] {
            let result = TestCli::try_parse_from(["janky-trigger", flag, "0"]);
            assert!(result.is_err(), "{flag} 0 should not parse");
        }
    }

    #[test]
    fn poll_flags_are_optional() {
        let cli = TestCli::parse_from(["janky-trigger"]);
        assert_eq!(cli.args.poll_interval, None);
        assert_eq!(cli.args.timeout, None);
        assert_eq!(cli.args.url, None);
    }
}
