//! The gate sequencer.
//!
//! Gates run in [`GATE_ORDER`] and every gate runs regardless of earlier
//! failures, so one report covers everything that is wrong with a
//! delivery. The aggregate verdict is "no gate failed"; skips don't block.

use std::path::Path;
use std::time::Duration;

use crate::gates::{GateContext, GateResult, GateStatus};

pub const GATE_ORDER: [&str; 4] = ["completeness", "tests", "deployment", "health"];

pub struct GateSequencer {
    client: reqwest::Client,
}

impl GateSequencer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Run all four gates against `ctx`, in order, without short-circuit.
    pub async fn validate_all(&self, ctx: &GateContext) -> Vec<GateResult> {
        let results = vec![
            self.check_completeness(ctx),
            self.check_tests(ctx).await,
            self.check_deployment(ctx),
            self.check_health(ctx).await,
        ];
        for result in &results {
            tracing::info!(gate = %result.gate, status = ?result.status, "{}", result.message);
        }
        results
    }

    pub fn all_passed(results: &[GateResult]) -> bool {
        results.iter().all(|r| r.status != GateStatus::Fail)
    }

    pub fn failed_gates(results: &[GateResult]) -> Vec<String> {
        results
            .iter()
            .filter(|r| r.status == GateStatus::Fail)
            .map(|r| r.gate.clone())
            .collect()
    }

    pub fn summary(results: &[GateResult]) -> serde_json::Value {
        serde_json::json!({
            "all_passed": Self::all_passed(results),
            "failed": Self::failed_gates(results),
            "gates": results,
        })
    }

    /// Gate 1: the build tree exists, contains the expected artifacts, and
    /// carries no blocking markers.
    fn check_completeness(&self, ctx: &GateContext) -> GateResult {
        let gate = "completeness";
        let dir = match &ctx.artifact_dir {
            Some(d) => Path::new(d),
            None => return GateResult::new(gate, GateStatus::Fail, "no artifact directory"),
        };
        if !dir.is_dir() {
            return GateResult::new(
                gate,
                GateStatus::Fail,
                format!("artifact directory missing: {}", dir.display()),
            );
        }

        let missing: Vec<&String> = ctx
            .expected_artifacts
            .iter()
            .filter(|rel| !dir.join(rel.as_str()).exists())
            .collect();
        if !missing.is_empty() {
            return GateResult::new(
                gate,
                GateStatus::Fail,
                format!(
                    "missing artifacts: {}",
                    missing
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
        }

        let pattern = format!("{}/**/*", dir.display());
        let mut scanned = 0usize;
        let mut flagged = Vec::new();
        if let Ok(paths) = glob::glob(&pattern) {
            for path in paths.flatten() {
                if !path.is_file() {
                    continue;
                }
                // Binary files fail the utf-8 read and are skipped.
                let Ok(content) = std::fs::read_to_string(&path) else {
                    continue;
                };
                scanned += 1;
                for marker in &ctx.blocking_markers {
                    if content.contains(marker.as_str()) {
                        flagged.push(format!("{}: {}", path.display(), marker));
                    }
                }
            }
        }
        if !flagged.is_empty() {
            return GateResult::new(
                gate,
                GateStatus::Fail,
                format!("blocking markers found ({})", flagged.len()),
            )
            .with_details(serde_json::json!({ "flagged": flagged }));
        }

        GateResult::new(
            gate,
            GateStatus::Pass,
            format!("{} files scanned, no blockers", scanned),
        )
    }

    /// Gate 2: the test command exits zero within the timeout, and any
    /// coverage figure it prints meets the minimum. A configured command
    /// always runs; with no command, the gate is SKIPPED only when the
    /// skip was explicitly requested and FAILS otherwise.
    async fn check_tests(&self, ctx: &GateContext) -> GateResult {
        let gate = "tests";
        let Some(command) = &ctx.test_command else {
            return if ctx.skip_tests {
                GateResult::new(gate, GateStatus::Skipped, "tests skipped by request")
            } else {
                GateResult::new(gate, GateStatus::Fail, "no test command configured")
            };
        };

        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = &ctx.artifact_dir {
            if Path::new(dir).is_dir() {
                cmd.current_dir(dir);
            }
        }

        let output = match tokio::time::timeout(
            Duration::from_secs(ctx.test_timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return GateResult::new(
                    gate,
                    GateStatus::Fail,
                    format!("test command failed to run: {}", e),
                )
            }
            Err(_) => {
                return GateResult::new(
                    gate,
                    GateStatus::Fail,
                    format!("test command timed out after {}s", ctx.test_timeout_secs),
                )
            }
        };

        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return GateResult::new(
                gate,
                GateStatus::Fail,
                format!("test command exited with {}", output.status),
            )
            .with_details(serde_json::json!({ "tail": tail(&combined, 20) }));
        }

        if let Some(coverage) = parse_coverage(&combined) {
            if coverage < ctx.min_coverage {
                return GateResult::new(
                    gate,
                    GateStatus::Fail,
                    format!(
                        "coverage {:.1}% below minimum {:.1}%",
                        coverage, ctx.min_coverage
                    ),
                );
            }
            return GateResult::new(
                gate,
                GateStatus::Pass,
                format!("tests passing, coverage {:.1}%", coverage),
            );
        }

        GateResult::new(gate, GateStatus::Pass, "tests passing, no coverage reported")
    }

    /// Gate 3: the delivery names a well-formed http(s) production URL.
    fn check_deployment(&self, ctx: &GateContext) -> GateResult {
        let gate = "deployment";
        let Some(url) = ctx.production_url.as_deref().filter(|u| !u.is_empty()) else {
            return GateResult::new(gate, GateStatus::Fail, "no production URL recorded");
        };
        match reqwest::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
                let mut result =
                    GateResult::new(gate, GateStatus::Pass, format!("deployed at {}", url));
                if let Some(id) = &ctx.deployment_id {
                    result = result.with_details(serde_json::json!({ "deployment_id": id }));
                }
                result
            }
            Ok(parsed) => GateResult::new(
                gate,
                GateStatus::Fail,
                format!("unsupported URL scheme '{}'", parsed.scheme()),
            ),
            Err(e) => GateResult::new(gate, GateStatus::Fail, format!("invalid URL: {}", e)),
        }
    }

    /// Gate 4: the deployed system answers over HTTP. The health endpoint
    /// is tried first, then the bare URL; the first 2xx/3xx wins and the
    /// answering URL is recorded.
    async fn check_health(&self, ctx: &GateContext) -> GateResult {
        let gate = "health";
        let Some(url) = ctx.production_url.as_deref().filter(|u| !u.is_empty()) else {
            return GateResult::new(gate, GateStatus::Fail, "no production URL to probe");
        };

        let base = url.trim_end_matches('/');
        let candidates = [format!("{}{}", base, ctx.health_path), base.to_string()];
        let mut attempts = Vec::new();

        for candidate in &candidates {
            let response = self
                .client
                .get(candidate)
                .timeout(Duration::from_secs(ctx.health_timeout_secs))
                .send()
                .await;
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if (200..400).contains(&status) {
                        return GateResult::new(
                            gate,
                            GateStatus::Pass,
                            format!("{} answered {}", candidate, status),
                        )
                        .with_details(serde_json::json!({ "url": candidate, "status": status }));
                    }
                    attempts.push(format!("{} -> {}", candidate, status));
                }
                Err(e) => attempts.push(format!("{} -> {}", candidate, e)),
            }
        }

        GateResult::new(gate, GateStatus::Fail, "no healthy endpoint")
            .with_details(serde_json::json!({ "attempts": attempts }))
    }
}

impl Default for GateSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a coverage percentage from test runner output. Recognizes the
/// common summary-line shapes across runners.
fn parse_coverage(output: &str) -> Option<f64> {
    let patterns = [
        r"(?i)TOTAL\s.*?(\d+(?:\.\d+)?)%",
        r"(?i)coverage[:\s]+(\d+(?:\.\d+)?)%",
        r"(?i)(\d+(?:\.\d+)?)%\s+coverage",
    ];
    for pattern in patterns {
        let re = regex::Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(output) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

fn tail(text: &str, lines: usize) -> Vec<String> {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].iter().map(|s| s.to_string()).collect()
}
