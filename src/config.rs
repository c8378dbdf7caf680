//! Runtime configuration
//! Fork endpoint, forge binary, and the Foundry project hosting the suite.

use std::path::{Path, PathBuf};

/// Location of the suite file inside the project, relative to
/// `project_dir`. Fixed: one suite location means one run at a time.
const SUITE_RELATIVE_PATH: &str = "test/test.sol";

/// Configuration for one fork-test execution context.
#[derive(Debug, Clone)]
pub struct ForkConfig {
    /// HTTP RPC URL of the fork endpoint
    pub rpc_url: String,

    /// Name or path of the forge binary
    pub forge_bin: String,

    /// Foundry project directory (must contain forge-std)
    pub project_dir: PathBuf,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            rpc_url: std::env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "https://eth-mainnet.g.alchemy.com/v2/YOUR_API_KEY".to_string()),
            forge_bin: std::env::var("FORGE_BIN").unwrap_or_else(|_| "forge".to_string()),
            project_dir: std::env::var("SUITE_PROJECT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl ForkConfig {
    /// Config rooted at a specific Foundry project. Used by workers that
    /// need independent suite locations to run concurrently.
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Fixed on-disk location the assembled suite is materialized at
    /// before execution.
    pub fn suite_path(&self) -> PathBuf {
        self.project_dir.join(SUITE_RELATIVE_PATH)
    }
}
