use tempfile::tempdir;

#[test]
fn init_for_db_in_creates_scoped_log_file() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let _ = galdrdb::logger::init_for_db_in(base, "proclogs");
    log::info!("hello app");
    assert!(base.join("proclogs_logs").join("proclogs.log").exists());
}
