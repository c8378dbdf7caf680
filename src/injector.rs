//! Constructor injection
//! Splices test boilerplate into unknown Solidity source at an AST-derived
//! point without touching any other line.
//!
//! Input source is expected to be pre-formatted by the same deterministic
//! formatter whose output the parser saw, so AST locations line up with the
//! text being spliced.

use crate::ast::{find_constructor, ContractFacts};
use crate::errors::{AppError, AppResult};
use crate::types::InjectionPoint;
use tracing::debug;

/// Appended once, only if an equivalent declaration is not already present.
pub const ABI_ENCODER_PRAGMA: &str = "pragma experimental ABIEncoderV2;";

/// Appended unconditionally; enables the downstream test framework.
pub const FORGE_STD_IMPORT: &str = "import \"forge-std/Test.sol\";";

/// Mint-style top-up for the caller, injected when the contract can
/// legitimately mint to anyone.
const SEED_MINT_CALL: &str = "_mint(msg.sender, 1e20); ";

/// External deterministic formatter boundary. The real implementation runs
/// out of process; injected output is always passed through it so the
/// returned artifact is syntactically valid and stably formatted.
pub trait SourceFormatter {
    fn format(&self, source: &str) -> AppResult<String>;
}

/// Identity formatter for contexts where formatting happens downstream
/// (and for tests, where exact text must be observable).
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughFormatter;

impl SourceFormatter for PassthroughFormatter {
    fn format(&self, source: &str) -> AppResult<String> {
        Ok(source.to_string())
    }
}

/// Computes an injection point from the entry contract's AST and splices
/// constructor boilerplate into the raw source text at that point.
pub struct ConstructorInjector<F = PassthroughFormatter> {
    formatter: F,
}

impl ConstructorInjector<PassthroughFormatter> {
    pub fn new() -> Self {
        Self {
            formatter: PassthroughFormatter,
        }
    }
}

impl Default for ConstructorInjector<PassthroughFormatter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SourceFormatter> ConstructorInjector<F> {
    pub fn with_formatter(formatter: F) -> Self {
        Self { formatter }
    }

    /// Decide where to inject and what.
    ///
    /// With an unnamed constructor present, the point is the end of its body
    /// (immediately before the closing brace) and only the optional seed
    /// call goes in. Without one, a full constructor declaration is
    /// synthesized at the end of the contract body.
    pub fn plan(&self, facts: &ContractFacts) -> AppResult<(InjectionPoint, String)> {
        let contract = facts.entry()?;

        match find_constructor(contract) {
            Some(ctor) => {
                let mut code = String::from("\n");
                if facts.can_seed_mint() {
                    code.push_str(SEED_MINT_CALL);
                }
                Ok((
                    InjectionPoint {
                        line: ctor.span.end.line,
                        column: ctor.span.end.column,
                    },
                    code,
                ))
            }
            None => {
                let mut code = String::from("\nconstructor() public { ");
                if facts.can_seed_mint() {
                    code.push_str(SEED_MINT_CALL);
                }
                code.push('}');
                Ok((
                    InjectionPoint {
                        line: contract.span.end.line,
                        column: contract.span.end.column,
                    },
                    code,
                ))
            }
        }
    }

    /// Full injection pass: splice the planned boilerplate, ensure the ABI
    /// encoder pragma (idempotent), append the forge-std import, then hand
    /// the result to the formatter.
    pub fn inject(&self, source: &str, facts: &ContractFacts) -> AppResult<String> {
        let (point, code) = self.plan(facts)?;
        debug!(
            line = point.line,
            column = point.column,
            "splicing constructor boilerplate"
        );

        let mut injected = splice(source, point, &code)?;

        if !injected.contains("pragma experimental ABIEncoderV2") {
            injected.push('\n');
            injected.push_str(ABI_ENCODER_PRAGMA);
            injected.push('\n');
        }
        injected.push('\n');
        injected.push_str(FORGE_STD_IMPORT);
        injected.push('\n');

        self.formatter.format(&injected)
    }
}

/// Pure text splice: partition the source at the injection line into
/// (lines before), (line prefix up to column), injected text, (line suffix
/// from column), (lines after), and rejoin with newlines. Every line other
/// than the injection line survives byte-for-byte.
pub fn splice(source: &str, point: InjectionPoint, text: &str) -> AppResult<String> {
    let lines: Vec<&str> = source.split('\n').collect();

    if point.line == 0 || point.line > lines.len() {
        return Err(AppError::parse_invalid_source(format!(
            "injection line {} out of range ({} lines)",
            point.line,
            lines.len()
        )));
    }

    let target = lines[point.line - 1];
    if point.column > target.len() {
        return Err(AppError::parse_invalid_source(format!(
            "injection column {} out of range on line {} ({} chars)",
            point.column,
            point.line,
            target.len()
        )));
    }
    if !target.is_char_boundary(point.column) {
        return Err(AppError::parse_invalid_source(format!(
            "injection column {} splits a multibyte character on line {}",
            point.column, point.line
        )));
    }
    let (prefix, suffix) = target.split_at(point.column);

    let mut out = String::with_capacity(source.len() + text.len());
    for line in &lines[..point.line - 1] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(prefix);
    out.push_str(text);
    out.push_str(suffix);
    for line in &lines[point.line..] {
        out.push('\n');
        out.push_str(line);
    }

    Ok(out)
}
