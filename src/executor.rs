//! Fork suite execution
//! Materializes the assembled suite inside a Foundry project and shells out
//! to `forge test` against forked chain state.
//!
//! The runner is an opaque oracle to the rest of the pipeline: only the
//! returned verdicts are interpreted, never how the run executed. Timeout
//! and cancellation are the caller's responsibility; there is no internal
//! retry.

use crate::config::ForkConfig;
use crate::errors::{AppError, AppResult};
use crate::types::{TestScenario, Verdict};
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Boundary to whatever runs an assembled suite against a fork.
pub trait SuiteRunner {
    /// Run the suite and return one verdict per scenario, or a single
    /// aggregate error when the run could not complete. Partial results
    /// must never be reported.
    fn run(
        &self,
        suite_source: &str,
        block_number: u64,
    ) -> impl std::future::Future<Output = AppResult<BTreeMap<TestScenario, Verdict>>> + Send;
}

/// Production runner backed by the `forge` binary.
///
/// The suite is written to one fixed location inside the Foundry project,
/// so two runs must never be in flight concurrently against it; the runner
/// serializes them with an internal lock. Independent workers with
/// independent project directories need no coordination.
pub struct ForgeRunner {
    config: ForkConfig,
    run_lock: Mutex<()>,
}

impl ForgeRunner {
    pub fn new(config: ForkConfig) -> Self {
        Self {
            config,
            run_lock: Mutex::new(()),
        }
    }
}

impl SuiteRunner for ForgeRunner {
    async fn run(
        &self,
        suite_source: &str,
        block_number: u64,
    ) -> AppResult<BTreeMap<TestScenario, Verdict>> {
        let _guard = self.run_lock.lock().await;

        let suite_path = self.config.suite_path();
        if let Some(parent) = suite_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&suite_path, suite_source).await?;
        debug!(path = %suite_path.display(), bytes = suite_source.len(), "suite materialized");

        let output = Command::new(&self.config.forge_bin)
            .arg("test")
            .arg("-f")
            .arg(&self.config.rpc_url)
            .arg("--fork-block-number")
            .arg(block_number.to_string())
            .arg("--json")
            .arg("--silent")
            .env("RUST_LOG", "off")
            .current_dir(&self.config.project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                AppError::exec_spawn_failed(format!(
                    "failed to spawn {}: {}",
                    self.config.forge_bin, e
                ))
            })?;

        // forge exits non-zero when any test fails but still prints the
        // JSON report; treat only unparsable output as a run failure.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let report: Value = serde_json::from_str(stdout.trim()).map_err(|_| {
            AppError::exec_unparsable(format!(
                "forge exited with {} and produced no JSON report",
                output.status
            ))
        })?;

        let verdicts = parse_verdicts(&report)?;
        info!(
            block = block_number,
            scenarios = verdicts.len(),
            "fork test run complete"
        );
        Ok(verdicts)
    }
}

/// Map a forge JSON report onto per-scenario verdicts.
///
/// Suite identifiers look like `test/test.sol:DynamicHoneypotTest`; entries
/// for contracts this crate did not generate are ignored. Any malformed
/// entry for a generated suite fails the whole parse so partial results
/// are never surfaced as authoritative.
pub fn parse_verdicts(report: &Value) -> AppResult<BTreeMap<TestScenario, Verdict>> {
    let suites = report
        .as_object()
        .ok_or_else(|| AppError::exec_unparsable("top-level report is not an object"))?;

    let mut verdicts = BTreeMap::new();
    for (suite_id, suite) in suites {
        let contract_name = suite_id.rsplit(':').next().unwrap_or(suite_id);
        let Some(scenario) = TestScenario::from_contract_name(contract_name) else {
            continue;
        };

        let results = suite
            .get("test_results")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                AppError::exec_malformed_suite(format!("{} has no test_results", suite_id))
            })?;

        for (test_name, outcome) in results {
            let status = outcome
                .get("status")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    AppError::exec_malformed_suite(format!(
                        "{}::{} has no status",
                        suite_id, test_name
                    ))
                })?;

            let verdict = match status {
                "Success" => Verdict::Pass,
                "Failure" => Verdict::Fail,
                "Skipped" => Verdict::Skip,
                other => {
                    return Err(AppError::exec_malformed_suite(format!(
                        "{}::{} has unknown status {}",
                        suite_id, test_name, other
                    )))
                }
            };
            verdicts.insert(scenario, verdict);
        }
    }

    Ok(verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_verdicts_happy_path() {
        let report = json!({
            "test/test.sol:DynamicHoneypotTest": {
                "test_results": {
                    "invariant_transfer()": { "status": "Failure", "reason": "assertion failed" }
                }
            },
            "test/test.sol:DynamicHiddenMintsTest": {
                "test_results": {
                    "invariant_totalsupply()": { "status": "Success" }
                }
            },
            "test/test.sol:DynamicHiddenTransferRevertsTest": {
                "test_results": {
                    "invariant_transfer_without_revert()": { "status": "Skipped" }
                }
            }
        });

        let verdicts = parse_verdicts(&report).unwrap();
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[&TestScenario::Honeypot], Verdict::Fail);
        assert_eq!(verdicts[&TestScenario::HiddenMint], Verdict::Pass);
        assert_eq!(
            verdicts[&TestScenario::HiddenTransferRevert],
            Verdict::Skip
        );
    }

    #[test]
    fn test_parse_verdicts_ignores_foreign_suites() {
        let report = json!({
            "test/Counter.t.sol:CounterTest": {
                "test_results": { "test_increment()": { "status": "Success" } }
            }
        });
        let verdicts = parse_verdicts(&report).unwrap();
        assert!(verdicts.is_empty());
    }

    #[test]
    fn test_parse_verdicts_rejects_unknown_status() {
        let report = json!({
            "test/test.sol:DynamicHoneypotTest": {
                "test_results": {
                    "invariant_transfer()": { "status": "Exploded" }
                }
            }
        });
        let err = parse_verdicts(&report).unwrap_err();
        assert_eq!(err.code_str(), "EXEC_MALFORMED_SUITE");
    }

    #[test]
    fn test_parse_verdicts_rejects_non_object_report() {
        let err = parse_verdicts(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.code_str(), "EXEC_UNPARSABLE_REPORT");
    }

    #[test]
    fn test_parse_verdicts_rejects_missing_results() {
        let report = json!({
            "test/test.sol:DynamicHiddenMintsTest": { "warnings": [] }
        });
        let err = parse_verdicts(&report).unwrap_err();
        assert_eq!(err.code_str(), "EXEC_MALFORMED_SUITE");
    }
}
