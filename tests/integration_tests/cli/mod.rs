#[path = "mod_cli.rs"]
mod cli_tests;
#[path = "mod_verify.rs"]
mod verify_tests;
