#[path = "prop_import.rs"]
mod import;
