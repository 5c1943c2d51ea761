// Mirror src/utils: group feature_flags, errors, types, fsutil, logger tests here
#[path = "mod_errors.rs"]
mod errors_tests;
#[path = "mod_feature_flags.rs"]
mod feature_flags_tests;
#[path = "mod_logger.rs"]
mod logger_tests;
