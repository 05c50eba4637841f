use serde::Serialize;
use shellwire_endpoint::HostConfig;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let config = HostConfig::default();
    let checks = vec![
        platform_transport_check(),
        runtime_dir_check(),
        session_socket_check(&config),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("shellwire doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

fn platform_transport_check() -> CheckResult {
    if cfg!(unix) {
        CheckResult::new(
            "platform_transport",
            CheckStatus::Pass,
            "Unix domain sockets available",
        )
    } else {
        CheckResult::new(
            "platform_transport",
            CheckStatus::Fail,
            "content processes connect over Unix domain sockets only",
        )
    }
}

fn runtime_dir_check() -> CheckResult {
    match dirs::runtime_dir() {
        Some(dir) => CheckResult::new(
            "runtime_dir",
            CheckStatus::Pass,
            dir.display().to_string(),
        ),
        None => CheckResult::new(
            "runtime_dir",
            CheckStatus::Warn,
            format!(
                "no runtime directory, falling back to {}",
                std::env::temp_dir().display()
            ),
        ),
    }
}

fn session_socket_check(config: &HostConfig) -> CheckResult {
    #[cfg(unix)]
    {
        match config.bind(None) {
            Ok(socket) => CheckResult::new(
                "session_socket",
                CheckStatus::Pass,
                format!("bound and removed {}", socket.path().display()),
            ),
            Err(err) => CheckResult::new(
                "session_socket",
                CheckStatus::Fail,
                format!("bind in {} failed: {err}", config.socket_dir.display()),
            ),
        }
    }

    #[cfg(not(unix))]
    {
        CheckResult::new(
            "session_socket",
            CheckStatus::Info,
            format!("skipped for {}", config.socket_dir.display()),
        )
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "endpoint") {
        features.push("endpoint");
    }
    if cfg!(feature = "async") {
        features.push("async");
    }
    if cfg!(feature = "json") {
        features.push("json");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            checks: vec![CheckResult::new("x", CheckStatus::Pass, "ok")],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }
}
