#[path = "mod_recovery_manager.rs"]
mod recovery_manager_tests;
#[path = "wasp/mod_wasp.rs"]
mod wasp_tests;
