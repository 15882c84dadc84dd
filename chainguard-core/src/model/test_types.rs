use serde::{Deserialize, Serialize};

/// What `run_tests` should execute (§4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// The latest parsed test run (§4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub passed: u32,
    pub failed: u32,
    pub framework: Option<String>,
    pub summary: String,
}
