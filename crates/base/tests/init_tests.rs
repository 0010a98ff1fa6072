use {
    base::init_stdout_logger,
    log::{Level, LevelFilter},
};

// the global logger can only be installed once per process, so this binary holds a single test
#[test]
fn test_first_global_logger_wins() {
    init_stdout_logger(LevelFilter::Info);
    assert_eq!(log::max_level(), LevelFilter::Info);

    init_stdout_logger(LevelFilter::Trace);
    assert_eq!(log::max_level(), LevelFilter::Info);

    let debug = log::MetadataBuilder::new().level(Level::Debug).build();
    let warn = log::MetadataBuilder::new().level(Level::Warn).build();
    assert!(!log::logger().enabled(&debug));
    assert!(log::logger().enabled(&warn));
    log::info!("logger installed");
}
