//! Analysis pipeline
//! One-way data flow: facts feed the injector, the decoder feeds the
//! synthesizer, and the assembled suite goes to the fork runner.
//!
//! The injection and synthesis paths are pure and synchronous; the only
//! suspension point is the call into the suite runner.

use crate::ast::{find_constructor, ContractFacts, Parameter};
use crate::decoder::{ArgumentDecoder, ConstructorArgs};
use crate::errors::AppResult;
use crate::executor::SuiteRunner;
use crate::injector::{ConstructorInjector, PassthroughFormatter, SourceFormatter};
use crate::synthesizer::{assemble_suite, InvariantTestSynthesizer};
use crate::types::TestReport;
use tracing::{debug, info};

/// Full per-contract analysis: inject, decode, synthesize, execute.
///
/// Created fresh or reused across contracts; the analyzer itself holds no
/// per-contract state.
pub struct ContractAnalyzer<R, F = PassthroughFormatter> {
    runner: R,
    injector: ConstructorInjector<F>,
}

impl<R: SuiteRunner> ContractAnalyzer<R, PassthroughFormatter> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            injector: ConstructorInjector::new(),
        }
    }
}

impl<R: SuiteRunner, F: SourceFormatter> ContractAnalyzer<R, F> {
    pub fn with_formatter(runner: R, formatter: F) -> Self {
        Self {
            runner,
            injector: ConstructorInjector::with_formatter(formatter),
        }
    }

    /// Produce only the injected-and-annotated source artifact.
    pub fn inject_only(&self, source: &str, facts: &ContractFacts) -> AppResult<String> {
        self.injector.inject(source, facts)
    }

    /// Run the whole pipeline for one contract.
    ///
    /// Returns an empty report without touching the runner when the
    /// contract is neither a token nor ownable. An empty report means
    /// "not tested", never "tested and safe".
    pub async fn analyze(
        &self,
        source: &str,
        facts: &ContractFacts,
        constructor_args_hex: Option<&str>,
        block_number: u64,
    ) -> AppResult<TestReport> {
        if !facts.is_applicable() {
            info!("tests skipped: not a standard ERC20 token contract");
            return Ok(TestReport::default());
        }

        let injected = self.injector.inject(source, facts)?;

        let parameters = constructor_parameters(facts)?;
        let args = match constructor_args_hex {
            Some(blob) if !blob.is_empty() && !parameters.is_empty() => {
                ArgumentDecoder::decode(parameters, blob)
            }
            _ => ConstructorArgs::Decoded(Vec::new()),
        };
        if !args.is_recovered() {
            debug!("constructor arguments unrecovered, deploying without arguments");
        }

        let scenarios = InvariantTestSynthesizer::synthesize(facts, &args)?;
        if scenarios.is_empty() {
            return Ok(TestReport::default());
        }

        let suite = assemble_suite(&injected, &scenarios);
        let verdicts = self.runner.run(&suite, block_number).await?;

        Ok(TestReport { verdicts })
    }
}

/// Declared constructor parameters of the entry contract, empty when no
/// unnamed constructor exists.
fn constructor_parameters(facts: &ContractFacts) -> AppResult<&[Parameter]> {
    let contract = facts.entry()?;
    Ok(find_constructor(contract)
        .map(|ctor| ctor.parameters.as_slice())
        .unwrap_or(&[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ContractDefinition, ContractPart, FunctionDefinition, Position, SourceSpan, TypeName,
    };
    use crate::errors::{AppError, AppResult};
    use crate::types::{TestScenario, Verdict};
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};

    const SOURCE: &str = "contract SampleToken {\n    uint256 supply;\n}\n";

    struct StaticRunner {
        invoked: AtomicBool,
        verdicts: BTreeMap<TestScenario, Verdict>,
    }

    impl StaticRunner {
        fn passing() -> Self {
            let mut verdicts = BTreeMap::new();
            for scenario in TestScenario::ALL {
                verdicts.insert(scenario, Verdict::Pass);
            }
            Self {
                invoked: AtomicBool::new(false),
                verdicts,
            }
        }
    }

    impl SuiteRunner for StaticRunner {
        async fn run(
            &self,
            _suite_source: &str,
            _block_number: u64,
        ) -> AppResult<BTreeMap<TestScenario, Verdict>> {
            self.invoked.store(true, Ordering::SeqCst);
            Ok(self.verdicts.clone())
        }
    }

    struct FailingRunner;

    impl SuiteRunner for FailingRunner {
        async fn run(
            &self,
            _suite_source: &str,
            _block_number: u64,
        ) -> AppResult<BTreeMap<TestScenario, Verdict>> {
            Err(AppError::exec_unparsable("forge produced no JSON report"))
        }
    }

    fn facts(token: bool, ownable: bool, with_ctor_param: bool) -> ContractFacts {
        let parts = if with_ctor_param {
            vec![ContractPart::Function(FunctionDefinition {
                name: None,
                is_constructor: true,
                parameters: vec![Parameter {
                    name: Some("supply_".to_string()),
                    type_name: TypeName::elementary("uint256"),
                }],
                span: SourceSpan {
                    start: Position { line: 2, column: 4 },
                    end: Position {
                        line: 2,
                        column: 18,
                    },
                },
            })]
        } else {
            Vec::new()
        };
        ContractFacts {
            entry_contract: Some(ContractDefinition {
                name: "SampleToken".to_string(),
                parts,
                span: SourceSpan {
                    start: Position { line: 1, column: 0 },
                    end: Position { line: 3, column: 0 },
                },
            }),
            is_token_contract: token,
            is_ownable_contract: ownable,
            has_balance_variable: token,
            internal_functions: HashSet::new(),
        }
    }

    #[tokio::test]
    async fn test_not_applicable_skips_runner() {
        let runner = StaticRunner::passing();
        let analyzer = ContractAnalyzer::new(runner);
        let report = analyzer
            .analyze(SOURCE, &facts(false, false, false), None, 19_000_000)
            .await
            .unwrap();

        assert!(report.is_empty());
        assert!(!analyzer.runner.invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_applicable_contract_gets_full_report() {
        let analyzer = ContractAnalyzer::new(StaticRunner::passing());
        let report = analyzer
            .analyze(SOURCE, &facts(true, true, false), None, 19_000_000)
            .await
            .unwrap();

        assert_eq!(report.verdicts.len(), 6);
        assert!(report.all_passed());
        assert!(analyzer.runner.invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_decode_failure_degrades_to_bare_deploy() {
        let source = "contract SampleToken {\n    constructor(uint256 supply_) public { }\n}\n";
        let mut target_facts = facts(true, false, true);
        if let Some(contract) = target_facts.entry_contract.as_mut() {
            if let ContractPart::Function(f) = &mut contract.parts[0] {
                // constructor body closes at the brace on line 2
                f.span.end = Position {
                    line: 2,
                    column: 42,
                };
            }
        }

        let analyzer = ContractAnalyzer::new(StaticRunner::passing());
        // truncated blob: decode degrades, analysis still completes
        let report = analyzer
            .analyze(source, &target_facts, Some("deadbeef"), 19_000_000)
            .await
            .unwrap();
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn test_runner_failure_is_aggregate() {
        let analyzer = ContractAnalyzer::new(FailingRunner);
        let err = analyzer
            .analyze(SOURCE, &facts(true, false, false), None, 19_000_000)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "EXEC_UNPARSABLE_REPORT");
    }

    #[tokio::test]
    async fn test_parse_error_propagates() {
        let mut bad = facts(true, false, false);
        bad.entry_contract = None;
        let analyzer = ContractAnalyzer::new(StaticRunner::passing());
        let err = analyzer
            .analyze(SOURCE, &bad, None, 19_000_000)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "PARSE_NO_ENTRY_CONTRACT");
    }
}
