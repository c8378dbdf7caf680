//! Core data types for the dynamic test pipeline
//! Scenario names, verdicts, and the per-contract report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One synthesized invariant-test family. Each variant maps to exactly one
/// generated Foundry test contract with a single invariant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TestScenario {
    /// Transfers that silently no-op for third parties
    Honeypot,
    /// Total supply grows after deployment
    HiddenMint,
    /// Ownership "renounced" without relinquishing privilege
    FakeOwnershipRenunciation,
    /// Holder balances drained by later activity
    HiddenTransfer,
    /// Transfer fee changes after the first observed transfer
    HiddenFeeModifier,
    /// Holder cannot transfer out its full balance
    HiddenTransferRevert,
}

impl TestScenario {
    /// Suite assembly order: token scenarios first, ownership last.
    pub const ALL: [TestScenario; 6] = [
        TestScenario::Honeypot,
        TestScenario::HiddenMint,
        TestScenario::HiddenTransfer,
        TestScenario::HiddenFeeModifier,
        TestScenario::HiddenTransferRevert,
        TestScenario::FakeOwnershipRenunciation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Honeypot => "Honeypot",
            Self::HiddenMint => "HiddenMint",
            Self::FakeOwnershipRenunciation => "FakeOwnershipRenunciation",
            Self::HiddenTransfer => "HiddenTransfer",
            Self::HiddenFeeModifier => "HiddenFeeModifier",
            Self::HiddenTransferRevert => "HiddenTransferRevert",
        }
    }

    /// Name of the generated Foundry test contract.
    pub fn contract_name(&self) -> &'static str {
        match self {
            Self::Honeypot => "DynamicHoneypotTest",
            Self::HiddenMint => "DynamicHiddenMintsTest",
            Self::FakeOwnershipRenunciation => "DynamicFakeOwnershipRenounciationTest",
            Self::HiddenTransfer => "DynamicHiddenTransfersTest",
            Self::HiddenFeeModifier => "DynamicHiddenFeeModifiersTest",
            Self::HiddenTransferRevert => "DynamicHiddenTransferRevertsTest",
        }
    }

    /// Name of the invariant function inside the generated contract.
    pub fn invariant_name(&self) -> &'static str {
        match self {
            Self::Honeypot => "invariant_transfer",
            Self::HiddenMint => "invariant_totalsupply",
            Self::FakeOwnershipRenunciation => "invariant_ownership",
            Self::HiddenTransfer => "invariant_balances",
            Self::HiddenFeeModifier => "invariant_fee",
            Self::HiddenTransferRevert => "invariant_transfer_without_revert",
        }
    }

    /// Reverse lookup from a forge suite identifier.
    pub fn from_contract_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.contract_name() == name)
    }
}

/// Verdict for one scenario after a fork run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }
}

/// Where injected text goes: insert immediately before the character at
/// (line, column). Lines are 1-indexed, columns 0-indexed, matching the
/// AST location convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPoint {
    pub line: usize,
    pub column: usize,
}

/// Outcome of one analyzed contract.
///
/// An empty verdict map means the contract was never tested (not a token
/// and not ownable, or nothing synthesized). It must never be read as
/// "all scenarios passed".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestReport {
    pub verdicts: BTreeMap<TestScenario, Verdict>,
}

impl TestReport {
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Tested and every non-skipped scenario passed. False for an empty
    /// report: "not tested" is not "tested and safe".
    pub fn all_passed(&self) -> bool {
        !self.is_empty() && self.verdicts.values().all(|v| *v != Verdict::Fail)
    }

    pub fn failed_scenarios(&self) -> Vec<TestScenario> {
        self.verdicts
            .iter()
            .filter(|(_, v)| **v == Verdict::Fail)
            .map(|(s, _)| *s)
            .collect()
    }

    /// Pretty print for console output
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No scenarios executed (contract not applicable)".to_string();
        }

        let mut output = String::from("Scenario verdicts:\n");
        for (scenario, verdict) in &self.verdicts {
            output.push_str(&format!(
                "   {:<28} {}\n",
                scenario.as_str(),
                verdict.as_str()
            ));
        }
        let failed = self.failed_scenarios();
        if failed.is_empty() {
            output.push_str("   No honeypot behavior detected\n");
        } else {
            output.push_str(&format!(
                "   🚨 {} honeypot indicator(s) detected\n",
                failed.len()
            ));
        }
        output
    }
}
