// Lab service endpoints (relative to the base URL)
pub const TOPOLOGY_PATH: &str = "/api/insert/topology";
pub const FAULT_BATCH_PATH: &str = "/api/insert/fault";
pub const FAULT_FLAG_PATH: &str = "/api/measure/set_fault_flag";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Parameter defaults applied when a kind becomes selected
pub const DEFAULT_LATENCY_MS: u32 = 100;
pub const DEFAULT_BANDWIDTH_RATE_KBIT: u64 = 1000;
pub const DEFAULT_LOOP_DURATION_SEC: u32 = 10;

// Result reconciliation
pub const UNKNOWN_RESULT_MESSAGE: &str = "no result returned for this entry";

// Session file
pub const SESSION_FORMAT_VERSION: u32 = 1;
pub const SESSION_DIR_NAME: &str = "fault-console";
