//! Structured logging setup via log4rs.
//!
//! Opens, checkpoints, recovery decisions, and commit conflicts are logged at `info`/`warn` so an
//! operator can tell an expected optimistic-conflict retry from a genuine integrity failure.

/// Initializes logging from `log4rs.yaml` in the current directory (legacy fallback).
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file("log4rs.yaml", Default::default())?;
    Ok(())
}

/// Initializes logging to a database-scoped folder: `{db_name}_logs`, in the current directory.
pub fn init_for_db(db_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_for_db_in(std::path::Path::new("."), db_name)
}

/// Initializes logging to `{base}/{db_name}_logs/{db_name}.log`, creating the folder if missing.
pub fn init_for_db_in(
    base: &std::path::Path,
    db_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use log::LevelFilter;
    use log4rs::append::file::FileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;
    use std::fs;

    let log_dir = base.join(format!("{db_name}_logs"));
    fs::create_dir_all(&log_dir)?;
    let logfile = log_dir.join(format!("{db_name}.log"));
    let encoder = Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}"));
    let file_appender = FileAppender::builder().encoder(encoder).build(logfile)?;
    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(Root::builder().appender("file").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}
