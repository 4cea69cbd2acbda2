pub const METRICS_DIR: &str = "metrics";
pub const LOADGEN_DIR: &str = "loadgen";
pub const SERVER_DIR: &str = "server";
pub const PROCESSED_DIR: &str = "processed";
pub const DATA_DIR: &str = "data";
pub const PLOTS_DIR: &str = "plots";

pub const RESULTS_FILE: &str = "results.csv";
pub const LOADGEN_LOG_FILE: &str = "out.txt";
pub const PER_REQUEST_FILE: &str = "per_req_results.csv";
pub const MERGED_FILE: &str = "merged_results.csv";
pub const PER_REQUEST_AGG_FILE: &str = "per_req_agg.csv";

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const RESPONSE_TIME_COLUMN: &str = "response_time";

pub const LOADGEN_KEY_HEADER: &str = "Timestamp (s)";
pub const SERVER_KEY_HEADER: &str = "TIMESTAMP";

// Header strings written by the external collectors.
pub const LOADGEN_COLUMNS: &[(&str, &str)] = &[
    (LOADGEN_KEY_HEADER, "time_loadgen"),
    ("CPU (%)", "cpu_loadgen"),
    ("MEM (KB)", "mem_loadgen"),
    ("Bandwidth (KB/s)", "bandwidth_loadgen"),
    ("Bandwidth Utilization (%)", "bandwidth_utilization_loadgen"),
    ("Open Sockets", "open_sockets_loadgen"),
    ("VUS", "vus_loadgen"),
    ("RPS", "rps_loadgen"),
];

pub const SERVER_COLUMNS: &[(&str, &str)] = &[
    (SERVER_KEY_HEADER, "time_server"),
    ("CPU", "cpu_server"),
    ("MEM", "mem_server"),
];

pub const DEFAULT_PLOT_WIDTH: u32 = 640;
pub const DEFAULT_PLOT_HEIGHT: u32 = 480;
