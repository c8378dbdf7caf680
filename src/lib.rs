//! Forge Sentry Library
//!
//! Fork-based honeypot detector for ERC20-style token contracts:
//! - Injects constructor boilerplate into unknown Solidity source
//! - Recovers typed constructor arguments from the raw deployment blob
//! - Synthesizes Foundry invariant suites keyed to contract shape
//! - Executes the assembled suite via `forge test` against forked state

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod executor;
pub mod injector;
pub mod synthesizer;
pub mod types;

pub use analyzer::ContractAnalyzer;
pub use ast::{find_constructor, ContractDefinition, ContractFacts, Parameter, TypeName};
pub use config::ForkConfig;
pub use decoder::{ArgumentDecoder, ConstructorArgs};
pub use errors::{AppError, AppResult, ErrorCode};
pub use executor::{parse_verdicts, ForgeRunner, SuiteRunner};
pub use injector::{ConstructorInjector, PassthroughFormatter, SourceFormatter};
pub use synthesizer::{assemble_suite, InvariantTestSynthesizer, SynthesizedScenario};
pub use types::{InjectionPoint, TestReport, TestScenario, Verdict};
