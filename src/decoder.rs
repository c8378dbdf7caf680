//! Constructor argument recovery
//! Rebuilds ABI type signatures from declared parameter types and decodes
//! the raw deployment blob back into Solidity source literals.

use crate::ast::{Parameter, TypeName};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use eyre::{bail, eyre, Result};
use tracing::debug;

/// Outcome of argument recovery.
///
/// `Unrecovered` behaves as an empty argument list downstream: the harness
/// deploys with no arguments and lets the fork run surface any constructor
/// mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArgs {
    /// Ordered source literals, one per declared parameter.
    Decoded(Vec<String>),
    /// The blob did not decode against the resolved signature list.
    Unrecovered,
}

impl ConstructorArgs {
    pub fn literals(&self) -> &[String] {
        match self {
            Self::Decoded(args) => args,
            Self::Unrecovered => &[],
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Comma-joined argument list for a `new Target(...)` call site.
    pub fn render_call_list(&self) -> String {
        self.literals().join(", ")
    }
}

/// Decodes a raw hex-encoded constructor argument blob against the
/// constructor's declared parameter types.
pub struct ArgumentDecoder;

impl ArgumentDecoder {
    /// ABI signature for one declared parameter type.
    ///
    /// Array wrappers are collected walking from the declared node down to
    /// the elementary leaf. The declared (outermost) node is the rightmost
    /// bracket group in standard ABI notation, so the collected groups are
    /// reversed before rendering: a dynamic array of `uint256[2]` renders
    /// as `uint256[2][]`.
    pub fn type_signature(type_name: &TypeName) -> String {
        let mut brackets = Vec::new();
        let mut current = type_name;

        let leaf = loop {
            match current {
                TypeName::Elementary { name } => break name.as_str(),
                TypeName::Array { length, base } => {
                    brackets.push(match length {
                        Some(n) => format!("[{}]", n),
                        None => "[]".to_string(),
                    });
                    current = base;
                }
            }
        };

        brackets.reverse();
        format!("{}{}", leaf, brackets.concat())
    }

    /// Resolved signatures for the whole parameter list, in ABI order.
    pub fn signature_list(parameters: &[Parameter]) -> Vec<String> {
        parameters
            .iter()
            .map(|p| Self::type_signature(&p.type_name))
            .collect()
    }

    /// Decode the blob into ordered source literals.
    ///
    /// Any failure (malformed hex, insufficient length, signature mismatch)
    /// degrades to `Unrecovered` instead of propagating.
    pub fn decode(parameters: &[Parameter], raw_hex: &str) -> ConstructorArgs {
        if parameters.is_empty() {
            return ConstructorArgs::Decoded(Vec::new());
        }

        match Self::try_decode(parameters, raw_hex) {
            Ok(literals) => ConstructorArgs::Decoded(literals),
            Err(e) => {
                debug!(error = %e, "constructor argument recovery failed, deploying bare");
                ConstructorArgs::Unrecovered
            }
        }
    }

    fn try_decode(parameters: &[Parameter], raw_hex: &str) -> Result<Vec<String>> {
        let stripped = raw_hex.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped)?;

        let types = Self::signature_list(parameters)
            .iter()
            .map(|sig| {
                sig.parse::<DynSolType>()
                    .map_err(|e| eyre!("unsupported type signature {sig}: {e}"))
            })
            .collect::<Result<Vec<_>>>()?;

        // constructor args are encoded as the parameter tuple
        let decoded = DynSolType::Tuple(types).abi_decode_params(&bytes)?;
        let DynSolValue::Tuple(values) = decoded else {
            bail!("decoded value is not a parameter tuple");
        };
        if values.len() != parameters.len() {
            bail!(
                "arity mismatch: {} declared, {} decoded",
                parameters.len(),
                values.len()
            );
        }

        Ok(values.iter().map(Self::render_literal).collect())
    }

    /// Type-faithful source literal for one decoded value.
    fn render_literal(value: &DynSolValue) -> String {
        match value {
            DynSolValue::Uint(v, _) => v.to_string(),
            DynSolValue::Int(v, _) => v.to_string(),
            DynSolValue::Bool(b) => b.to_string(),
            DynSolValue::Address(a) => a.to_string(),
            DynSolValue::String(s) => format!("\"{}\"", s),
            DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
            DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
            DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
                let inner: Vec<String> = items.iter().map(Self::render_literal).collect();
                format!("[{}]", inner.join(", "))
            }
            other => format!("{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn param(type_name: TypeName) -> Parameter {
        Parameter {
            name: None,
            type_name,
        }
    }

    #[test]
    fn test_elementary_signatures_unchanged() {
        let params = vec![
            param(TypeName::elementary("uint256")),
            param(TypeName::elementary("address")),
            param(TypeName::elementary("bool")),
            param(TypeName::elementary("string")),
        ];
        assert_eq!(
            ArgumentDecoder::signature_list(&params),
            vec!["uint256", "address", "bool", "string"]
        );
    }

    #[test]
    fn test_static_array_signature() {
        let ty = TypeName::array_of(TypeName::elementary("uint8"), Some(4));
        assert_eq!(ArgumentDecoder::type_signature(&ty), "uint8[4]");
    }

    #[test]
    fn test_nested_array_signature_matches_abi_grammar() {
        // declared: dynamic array of uint256[2]
        let inner = TypeName::array_of(TypeName::elementary("uint256"), Some(2));
        let ty = TypeName::array_of(inner, None);
        assert_eq!(ArgumentDecoder::type_signature(&ty), "uint256[2][]");
    }

    #[test]
    fn test_decode_single_uint256() {
        let params = vec![param(TypeName::elementary("uint256"))];
        let blob = format!("{:064x}", 1000u64);

        let args = ArgumentDecoder::decode(&params, &blob);
        assert_eq!(args, ConstructorArgs::Decoded(vec!["1000".to_string()]));
    }

    #[test]
    fn test_decode_accepts_0x_prefix() {
        let params = vec![param(TypeName::elementary("uint256"))];
        let blob = format!("0x{:064x}", 7u64);
        let args = ArgumentDecoder::decode(&params, &blob);
        assert_eq!(args.literals(), ["7"]);
    }

    #[test]
    fn test_decode_mixed_literals() {
        let params = vec![
            param(TypeName::elementary("uint256")),
            param(TypeName::elementary("address")),
            param(TypeName::elementary("bool")),
        ];
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(42u64), 256),
            DynSolValue::Address(Address::repeat_byte(0x11)),
            DynSolValue::Bool(true),
        ])
        .abi_encode_params();

        let args = ArgumentDecoder::decode(&params, &hex::encode(encoded));
        let literals = args.literals();
        assert_eq!(literals[0], "42");
        assert!(literals[1].starts_with("0x"));
        assert_eq!(literals[1].len(), 42);
        assert_eq!(literals[2], "true");
    }

    #[test]
    fn test_decode_string_is_quoted() {
        let params = vec![param(TypeName::elementary("string"))];
        let encoded = DynSolValue::Tuple(vec![DynSolValue::String("Shiba".to_string())])
            .abi_encode_params();

        let args = ArgumentDecoder::decode(&params, &hex::encode(encoded));
        assert_eq!(args.literals(), ["\"Shiba\""]);
    }

    #[test]
    fn test_decode_nested_array_round_trip() {
        let inner = TypeName::array_of(TypeName::elementary("uint256"), Some(2));
        let params = vec![param(TypeName::array_of(inner, None))];

        let pair = |a: u64, b: u64| {
            DynSolValue::FixedArray(vec![
                DynSolValue::Uint(U256::from(a), 256),
                DynSolValue::Uint(U256::from(b), 256),
            ])
        };
        let encoded =
            DynSolValue::Tuple(vec![DynSolValue::Array(vec![pair(1, 2), pair(3, 4)])])
                .abi_encode_params();

        let args = ArgumentDecoder::decode(&params, &hex::encode(encoded));
        assert_eq!(args.literals(), ["[[1, 2], [3, 4]]"]);
    }

    #[test]
    fn test_short_blob_degrades() {
        let params = vec![param(TypeName::elementary("uint256"))];
        let args = ArgumentDecoder::decode(&params, "deadbeef");
        assert_eq!(args, ConstructorArgs::Unrecovered);
        assert!(args.literals().is_empty());
        assert_eq!(args.render_call_list(), "");
    }

    #[test]
    fn test_malformed_hex_degrades() {
        let params = vec![param(TypeName::elementary("uint256"))];
        assert_eq!(
            ArgumentDecoder::decode(&params, "not hex at all"),
            ConstructorArgs::Unrecovered
        );
    }

    #[test]
    fn test_no_parameters_decodes_empty() {
        let args = ArgumentDecoder::decode(&[], "ffffffff");
        assert_eq!(args, ConstructorArgs::Decoded(Vec::new()));
        assert!(args.is_recovered());
    }
}
