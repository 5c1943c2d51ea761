#[path = "mod_concurrency.rs"]
mod concurrency_tests;
