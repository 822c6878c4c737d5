// Metric names. Recording is a no-op until the embedding application
// installs a `metrics` recorder.
pub const METRIC_COMMANDS_TOTAL: &str = "hexagon_cache_commands_total";
pub const METRIC_COMMAND_ERRORS_TOTAL: &str = "hexagon_cache_command_errors_total";
pub const METRIC_COMMAND_LATENCY: &str = "hexagon_cache_command_latency_seconds";
pub const METRIC_CONTAINED_FAILURES_TOTAL: &str = "hexagon_cache_contained_failures_total";
pub const METRIC_SEARCHES_TOTAL: &str = "hexagon_cache_searches_total";
