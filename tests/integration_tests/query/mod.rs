#[path = "benchmarks.rs"]
mod benchmarks_tests;
#[path = "telemetry_edges_tests.rs"]
mod telemetry_edges_tests;
#[path = "telemetry_tests.rs"]
mod telemetry_tests;
