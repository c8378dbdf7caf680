//! Invariant test synthesis
//! Turns contract facts plus recovered constructor arguments into Foundry
//! invariant-test contracts appended after the injected source.
//!
//! Each scenario is built from an ordered list of named fragments (setup
//! steps and one invariant body) joined deterministically, so generation is
//! testable independent of exact textual formatting.

use crate::ast::ContractFacts;
use crate::decoder::ConstructorArgs;
use crate::errors::AppResult;
use crate::types::TestScenario;
use tracing::debug;

// Fixed actors shared by every scenario. 0x1 holds seeded transfers,
// 0x2 is the independent third-party recipient.
const HOLDER: &str = "address(0x1)";
const THIRD_PARTY: &str = "address(0x2)";

const SEED_TRANSFER_AMOUNT: &str = "100000000";
const PROBE_AMOUNT: &str = "100";
const FEE_SEED_AMOUNT: &str = "1e6";
const FEE_PROBE_AMOUNT: &str = "1e5";
const DEAL_AMOUNT: &str = "1e20";
const ONE_YEAR_SECS: &str = "60 * 60 * 24 * 365";

/// One named chunk of generated Solidity. The label identifies the setup
/// step or assertion for inspection; rendering only uses `code`.
#[derive(Debug, Clone)]
struct Fragment {
    #[allow(dead_code)]
    label: &'static str,
    code: String,
}

impl Fragment {
    fn new(label: &'static str, code: impl Into<String>) -> Self {
        Self {
            label,
            code: code.into(),
        }
    }
}

/// Builder for one generated test contract: state variable declarations,
/// setup fragments in order, and a single invariant body.
struct ModuleBuilder {
    scenario: TestScenario,
    state_vars: Vec<&'static str>,
    setup: Vec<Fragment>,
    invariant: Vec<Fragment>,
}

impl ModuleBuilder {
    fn new(scenario: TestScenario) -> Self {
        Self {
            scenario,
            state_vars: Vec::new(),
            setup: Vec::new(),
            invariant: Vec::new(),
        }
    }

    fn state_var(mut self, decl: &'static str) -> Self {
        self.state_vars.push(decl);
        self
    }

    fn setup(mut self, fragment: Fragment) -> Self {
        self.setup.push(fragment);
        self
    }

    fn setup_if(self, condition: bool, fragment: Fragment) -> Self {
        if condition {
            self.setup(fragment)
        } else {
            self
        }
    }

    fn invariant(mut self, fragment: Fragment) -> Self {
        self.invariant.push(fragment);
        self
    }

    fn render(&self, target_contract: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "contract {} is Test {{\n",
            self.scenario.contract_name()
        ));
        out.push_str(&format!("    {} target;\n", target_contract));
        for decl in &self.state_vars {
            out.push_str(&format!("    {}\n", decl));
        }
        out.push('\n');

        out.push_str("    function setUp() public {\n");
        for fragment in &self.setup {
            out.push_str(&indent(&fragment.code, 8));
        }
        out.push_str("    }\n\n");

        out.push_str(&format!(
            "    function {}() external {{\n",
            self.scenario.invariant_name()
        ));
        for fragment in &self.invariant {
            out.push_str(&indent(&fragment.code, 8));
        }
        out.push_str("    }\n}\n");

        out
    }

    #[cfg(test)]
    fn setup_labels(&self) -> Vec<&'static str> {
        self.setup.iter().map(|f| f.label).collect()
    }
}

fn indent(code: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut out = String::new();
    for line in code.trim_end().lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// One scenario module ready to append to the suite.
#[derive(Debug, Clone)]
pub struct SynthesizedScenario {
    pub scenario: TestScenario,
    pub source: String,
}

/// Emits zero or more independent scenario modules from contract shape.
pub struct InvariantTestSynthesizer;

impl InvariantTestSynthesizer {
    /// Scenario activation: token contracts get the five balance/supply
    /// scenarios, ownable contracts get the renunciation scenario, both
    /// classes may combine. Neither class yields an empty result.
    pub fn synthesize(
        facts: &ContractFacts,
        args: &ConstructorArgs,
    ) -> AppResult<Vec<SynthesizedScenario>> {
        if !facts.is_applicable() {
            return Ok(Vec::new());
        }

        let target = facts.entry()?.name.clone();
        let mut scenarios = Vec::new();

        for scenario in TestScenario::ALL {
            let active = match scenario {
                TestScenario::FakeOwnershipRenunciation => facts.is_ownable_contract,
                _ => facts.is_token_contract,
            };
            if !active {
                continue;
            }
            let module = Self::build_module(scenario, facts, args);
            scenarios.push(SynthesizedScenario {
                scenario,
                source: module.render(&target),
            });
        }

        debug!(count = scenarios.len(), "synthesized scenario modules");
        Ok(scenarios)
    }

    fn build_module(
        scenario: TestScenario,
        facts: &ContractFacts,
        args: &ConstructorArgs,
    ) -> ModuleBuilder {
        match scenario {
            TestScenario::Honeypot => Self::honeypot(facts, args),
            TestScenario::HiddenMint => Self::hidden_mint(facts, args),
            TestScenario::FakeOwnershipRenunciation => {
                Self::fake_ownership_renunciation(facts, args)
            }
            TestScenario::HiddenTransfer => Self::hidden_transfer(facts, args),
            TestScenario::HiddenFeeModifier => Self::hidden_fee_modifier(facts, args),
            TestScenario::HiddenTransferRevert => Self::hidden_transfer_revert(facts, args),
        }
    }

    // ============================================
    // Shared setup fragments
    // ============================================

    fn deploy(facts: &ContractFacts, args: &ConstructorArgs) -> Fragment {
        let name = facts
            .entry_contract
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        Fragment::new(
            "deploy",
            format!("target = new {}({});", name, args.render_call_list()),
        )
    }

    /// Seed the deployer with a large balance when the contract exposes a
    /// mutable native balance slot.
    fn deal_seed() -> Fragment {
        Fragment::new(
            "deal_seed",
            format!("deal(address(target), address(this), {});", DEAL_AMOUNT),
        )
    }

    /// Neutralize ownership: move any privileged balance and ownership to
    /// the harness so it can act as the privileged party.
    fn ownership_takeover() -> Fragment {
        Fragment::new(
            "ownership_takeover",
            "address testAddress = address(this);\n\
             vm.startPrank(address(target.owner()));\n\
             target.transfer(testAddress, target.balanceOf(target.owner()));\n\
             target.transferOwnership(testAddress);\n\
             vm.stopPrank();",
        )
    }

    /// Takeover variant tolerating a reverting or unsuccessful privileged
    /// transfer: the scenario still runs, only the seed may be missing.
    fn guarded_ownership_takeover() -> Fragment {
        Fragment::new(
            "guarded_ownership_takeover",
            "address testAddress = address(this);\n\
             vm.startPrank(address(target.owner()));\n\
             try target.transfer(testAddress, target.balanceOf(target.owner())) returns (bool success) {\n\
                 if (!success) {\n\
                     willSkip = false;\n\
                 }\n\
             } catch {\n\
                 willSkip = false;\n\
             }\n\
             target.transferOwnership(testAddress);\n\
             vm.stopPrank();",
        )
    }

    /// Takeover for the renunciation scenario: ownership only, no balance.
    fn ownership_transfer_only() -> Fragment {
        Fragment::new(
            "ownership_transfer_only",
            "address testAddress = address(this);\n\
             vm.startPrank(address(target.owner()));\n\
             target.transferOwnership(testAddress);\n\
             vm.stopPrank();",
        )
    }

    /// Transfer the seed amount to the fixed holder, or mark the whole
    /// scenario skip when the deployer's balance is zero.
    fn seed_holder_or_skip(record_balance: bool, tolerant: bool) -> Fragment {
        let mut code = String::from(
            "uint256 balanceInitial = target.balanceOf(address(this));\n\
             if (balanceInitial > 0) {\n",
        );
        if tolerant {
            // a failed takeover above may already have cleared the flag
            code.push_str("    willSkip = willSkip || false;\n");
        } else {
            code.push_str("    willSkip = false;\n");
        }
        code.push_str(&format!(
            "    target.transfer({}, {});\n",
            HOLDER, SEED_TRANSFER_AMOUNT
        ));
        if record_balance {
            code.push_str(&format!("    balance = target.balanceOf({});\n", HOLDER));
        }
        code.push_str(
            "} else {\n\
             \x20   willSkip = true;\n\
             }",
        );
        Fragment::new("seed_holder_or_skip", code)
    }

    fn target_sender() -> Fragment {
        Fragment::new("target_sender", "targetSender(address(this));")
    }

    fn exclude_holder() -> Fragment {
        Fragment::new(
            "exclude_holder",
            format!("excludeSender({});", HOLDER),
        )
    }

    /// Advance simulated time by one year to defeat time-locked triggers.
    fn advance_time() -> Fragment {
        Fragment::new("advance_time", format!("skip({});", ONE_YEAR_SECS))
    }

    // ============================================
    // Scenario modules
    // ============================================

    /// Seed and self-transfer to the fixed holder; once the holder has
    /// balance, a further transfer must strictly increase an independent
    /// recipient's balance.
    fn honeypot(facts: &ContractFacts, args: &ConstructorArgs) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::Honeypot)
            .state_var("bool willSkip;")
            .setup(Self::deploy(facts, args))
            .setup_if(facts.has_balance_variable, Self::deal_seed())
            .setup_if(facts.is_ownable_contract, Self::ownership_takeover())
            .setup(Self::seed_holder_or_skip(false, false))
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "third_party_receives",
                format!(
                    "vm.skip(willSkip);\n\
                     \n\
                     uint256 balanceInitial = target.balanceOf({holder});\n\
                     if (balanceInitial > 0) {{\n\
                     \x20   vm.startPrank({holder});\n\
                     \x20   uint256 balanceBefore = target.balanceOf({third});\n\
                     \x20   target.transfer({third}, {amount});\n\
                     \x20   uint256 balanceAfter = target.balanceOf({third});\n\
                     \x20   assertGt(balanceAfter, balanceBefore);\n\
                     \x20   vm.stopPrank();\n\
                     }}",
                    holder = HOLDER,
                    third = THIRD_PARTY,
                    amount = PROBE_AMOUNT,
                ),
            ))
    }

    /// Record total supply at setup; arbitrary later harness activity must
    /// never push it above the recorded value.
    fn hidden_mint(facts: &ContractFacts, args: &ConstructorArgs) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::HiddenMint)
            .state_var("uint256 totalSupply;")
            .setup(Self::deploy(facts, args))
            .setup_if(facts.is_ownable_contract, Self::ownership_takeover())
            .setup(Fragment::new(
                "record_supply",
                "totalSupply = target.totalSupply();",
            ))
            .setup(Self::target_sender())
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "supply_never_grows",
                "assertTrue(totalSupply >= target.totalSupply());",
            ))
    }

    /// Transfer ownership to the fixed holder and exclude it from further
    /// calls; the recorded owner must equal that address and not be null.
    fn fake_ownership_renunciation(
        facts: &ContractFacts,
        args: &ConstructorArgs,
    ) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::FakeOwnershipRenunciation)
            .setup(Self::deploy(facts, args))
            .setup_if(facts.is_ownable_contract, Self::ownership_transfer_only())
            .setup(Self::target_sender())
            .setup(Fragment::new(
                "hand_off_ownership",
                format!("target.transferOwnership({});", HOLDER),
            ))
            .setup(Self::exclude_holder())
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "owner_is_fixed_address",
                format!(
                    "assertTrue(target.owner() == {holder} && target.owner() != address(0x0));",
                    holder = HOLDER,
                ),
            ))
    }

    /// Seed the holder, record its balance, exclude it from harness calls;
    /// the balance must never fall below the recorded amount.
    fn hidden_transfer(facts: &ContractFacts, args: &ConstructorArgs) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::HiddenTransfer)
            .state_var("uint256 balance;")
            .state_var("bool willSkip;")
            .setup(Self::deploy(facts, args))
            .setup_if(facts.has_balance_variable, Self::deal_seed())
            .setup_if(facts.is_ownable_contract, Self::ownership_takeover())
            .setup(Self::seed_holder_or_skip(true, false))
            .setup(Self::target_sender())
            .setup(Self::exclude_holder())
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "holder_balance_floor",
                format!(
                    "vm.skip(willSkip);\n\
                     assertTrue(target.balanceOf({holder}) >= balance);",
                    holder = HOLDER,
                ),
            ))
    }

    /// Measure the realized transfer fee once at setup; every later
    /// identical transfer must realize the same fee. Reverting or
    /// unsuccessful probes skip that invocation only.
    fn hidden_fee_modifier(facts: &ContractFacts, args: &ConstructorArgs) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::HiddenFeeModifier)
            .state_var("uint256 fee;")
            .state_var("bool willSkip;")
            .setup(Self::deploy(facts, args))
            .setup_if(facts.has_balance_variable, Self::deal_seed())
            .setup_if(facts.is_ownable_contract, Self::guarded_ownership_takeover())
            .setup(Fragment::new(
                "measure_fee_or_skip",
                format!(
                    "uint256 balanceInitial = target.balanceOf(address(this));\n\
                     if (balanceInitial > 0) {{\n\
                     \x20   willSkip = willSkip || false;\n\
                     \x20   target.transfer({holder}, {seed});\n\
                     \x20   vm.startPrank({holder});\n\
                     \x20   uint256 balanceBefore = target.balanceOf({third});\n\
                     \x20   target.transfer({third}, {probe});\n\
                     \x20   uint256 balanceAfter = target.balanceOf({third});\n\
                     \x20   fee = {probe} - (balanceAfter - balanceBefore);\n\
                     \x20   vm.stopPrank();\n\
                     }} else {{\n\
                     \x20   willSkip = true;\n\
                     }}",
                    holder = HOLDER,
                    third = THIRD_PARTY,
                    seed = FEE_SEED_AMOUNT,
                    probe = FEE_PROBE_AMOUNT,
                ),
            ))
            .setup(Self::target_sender())
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "fee_is_stable",
                format!(
                    "vm.skip(willSkip);\n\
                     \n\
                     vm.startPrank({holder});\n\
                     uint256 balanceBefore = target.balanceOf({third});\n\
                     try target.transfer({third}, {probe}) returns (bool success) {{\n\
                     \x20   uint256 balanceAfter = target.balanceOf({third});\n\
                     \x20   if (success || balanceAfter > balanceBefore) {{\n\
                     \x20       uint256 currentFee = {probe} - (balanceAfter - balanceBefore);\n\
                     \x20       vm.stopPrank();\n\
                     \x20       assertEq(fee, currentFee);\n\
                     \x20   }}\n\
                     }} catch {{\n\
                     \x20   vm.stopPrank();\n\
                     }}",
                    holder = HOLDER,
                    third = THIRD_PARTY,
                    probe = FEE_PROBE_AMOUNT,
                ),
            ))
    }

    /// Seed the holder; it must always be able to transfer out its entire
    /// balance without the call reverting.
    fn hidden_transfer_revert(facts: &ContractFacts, args: &ConstructorArgs) -> ModuleBuilder {
        ModuleBuilder::new(TestScenario::HiddenTransferRevert)
            .state_var("bool willSkip;")
            .setup(Self::deploy(facts, args))
            .setup_if(facts.has_balance_variable, Self::deal_seed())
            .setup_if(facts.is_ownable_contract, Self::guarded_ownership_takeover())
            .setup(Self::seed_holder_or_skip(false, true))
            .setup(Self::target_sender())
            .setup(Self::advance_time())
            .invariant(Fragment::new(
                "full_exit_never_reverts",
                format!(
                    "vm.skip(willSkip);\n\
                     \n\
                     vm.startPrank({holder});\n\
                     uint256 selfBalance = target.balanceOf({holder});\n\
                     target.transfer({third}, selfBalance);\n\
                     vm.stopPrank();",
                    holder = HOLDER,
                    third = THIRD_PARTY,
                ),
            ))
    }
}

/// Append the synthesized modules after the injected source, in activation
/// order, to produce the suite handed to the execution step.
pub fn assemble_suite(injected_source: &str, scenarios: &[SynthesizedScenario]) -> String {
    let mut suite = injected_source.to_string();
    for scenario in scenarios {
        suite.push('\n');
        suite.push_str(&scenario.source);
    }
    suite
}
