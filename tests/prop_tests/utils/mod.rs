#[path = "prop_feature_flags.rs"]
mod feature_flags;
#[path = "prop_fsutil.rs"]
mod fsutil;
#[path = "prop_logger.rs"]
mod logger;
