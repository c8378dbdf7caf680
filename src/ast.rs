//! Solidity AST surface consumed from the external parser
//! Only the node shapes the injection and decoding paths care about.
//!
//! The parser that produces these nodes lives out of process; facts arrive
//! serialized. Everything here is immutable for the lifetime of one analysis.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Position in source text. Lines are 1-indexed, columns are 0-indexed,
/// matching the parser's location convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Start/end positions of one AST node. `end` points at the node's final
/// character (the closing brace for definitions with a body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Position,
    pub end: Position,
}

/// Declared type of a constructor parameter. Recursion is finite and always
/// terminates at exactly one elementary leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeName {
    /// Terminal type: `uint256`, `address`, `bool`, `bytes`, `string`, ...
    Elementary { name: String },
    /// Array wrapper. `length` is present for statically-sized arrays.
    Array {
        length: Option<u64>,
        base: Box<TypeName>,
    },
}

impl TypeName {
    pub fn elementary(name: &str) -> Self {
        TypeName::Elementary {
            name: name.to_string(),
        }
    }

    pub fn array_of(base: TypeName, length: Option<u64>) -> Self {
        TypeName::Array {
            length,
            base: Box::new(base),
        }
    }
}

/// One declared function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub type_name: TypeName,
}

/// Function definition inside a contract body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// `None` for the unnamed `constructor(...)` form.
    pub name: Option<String>,
    pub is_constructor: bool,
    pub parameters: Vec<Parameter>,
    pub span: SourceSpan,
}

/// Top-level items inside a contract body, tagged by node kind so lookups
/// can match on the variant directly instead of registering visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractPart {
    Function(FunctionDefinition),
    StateVariable { name: String },
    Modifier { name: String },
    Other,
}

/// One contract definition with its body items and source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub name: String,
    pub parts: Vec<ContractPart>,
    pub span: SourceSpan,
}

/// Structural facts about one analyzed source file, produced once by the
/// external parser. Classification flags are consumed as-is; this crate
/// never re-derives them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFacts {
    /// The contract the deployment targets. `None` when the parser could
    /// not identify one; every downstream path treats that as fatal.
    pub entry_contract: Option<ContractDefinition>,
    pub is_token_contract: bool,
    pub is_ownable_contract: bool,
    pub has_balance_variable: bool,
    pub internal_functions: HashSet<String>,
}

impl ContractFacts {
    /// Entry contract or a ParseError when the parser found none.
    pub fn entry(&self) -> AppResult<&ContractDefinition> {
        self.entry_contract
            .as_ref()
            .ok_or_else(AppError::parse_no_entry_contract)
    }

    /// The contract can legitimately mint to anyone, so the injected
    /// constructor may force an initial balance for testing.
    pub fn can_seed_mint(&self) -> bool {
        self.is_token_contract && self.internal_functions.contains("_mint")
    }

    /// Whether any scenario family applies at all.
    pub fn is_applicable(&self) -> bool {
        self.is_token_contract || self.is_ownable_contract
    }
}

/// First unnamed function flagged as constructor, in declaration order.
///
/// A named function cannot serve as the entry point even if it is literally
/// called `constructor` in source; the parser only clears `name` for the
/// keyword form.
pub fn find_constructor(contract: &ContractDefinition) -> Option<&FunctionDefinition> {
    contract.parts.iter().find_map(|part| match part {
        ContractPart::Function(f) if f.is_constructor && f.name.is_none() => Some(f),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(end_line: usize, end_column: usize) -> SourceSpan {
        SourceSpan {
            start: Position { line: 1, column: 0 },
            end: Position {
                line: end_line,
                column: end_column,
            },
        }
    }

    fn function(name: Option<&str>, is_constructor: bool) -> ContractPart {
        ContractPart::Function(FunctionDefinition {
            name: name.map(str::to_string),
            is_constructor,
            parameters: Vec::new(),
            span: span(3, 4),
        })
    }

    #[test]
    fn test_find_constructor_unnamed_only() {
        let contract = ContractDefinition {
            name: "Token".to_string(),
            parts: vec![
                function(Some("transfer"), false),
                // legacy-named function is not an entry point
                function(Some("constructor"), true),
                function(None, true),
            ],
            span: span(10, 0),
        };

        let ctor = find_constructor(&contract).expect("constructor should be found");
        assert!(ctor.name.is_none());
    }

    #[test]
    fn test_find_constructor_absent() {
        let contract = ContractDefinition {
            name: "Token".to_string(),
            parts: vec![function(Some("transfer"), false), ContractPart::Other],
            span: span(10, 0),
        };

        assert!(find_constructor(&contract).is_none());
    }

    #[test]
    fn test_facts_seed_mint_gate() {
        let mut facts = ContractFacts {
            entry_contract: None,
            is_token_contract: true,
            is_ownable_contract: false,
            has_balance_variable: true,
            internal_functions: ["_transfer".to_string()].into_iter().collect(),
        };
        assert!(!facts.can_seed_mint());

        facts.internal_functions.insert("_mint".to_string());
        assert!(facts.can_seed_mint());

        facts.is_token_contract = false;
        assert!(!facts.can_seed_mint());
    }

    #[test]
    fn test_facts_entry_missing_is_parse_error() {
        let facts = ContractFacts {
            entry_contract: None,
            is_token_contract: true,
            is_ownable_contract: false,
            has_balance_variable: false,
            internal_functions: HashSet::new(),
        };

        let err = facts.entry().unwrap_err();
        assert_eq!(err.code_str(), "PARSE_NO_ENTRY_CONTRACT");
    }

    #[test]
    fn test_facts_round_trip_json() {
        let facts = ContractFacts {
            entry_contract: Some(ContractDefinition {
                name: "Token".to_string(),
                parts: vec![function(None, true)],
                span: span(12, 0),
            }),
            is_token_contract: true,
            is_ownable_contract: true,
            has_balance_variable: true,
            internal_functions: ["_mint".to_string()].into_iter().collect(),
        };

        let json = serde_json::to_string(&facts).unwrap();
        let back: ContractFacts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_contract, facts.entry_contract);
        assert!(back.can_seed_mint());
    }
}
