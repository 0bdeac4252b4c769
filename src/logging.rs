use log::LevelFilter;

/// Map the number of `-v` flags to a log level. Zero means "leave it to
/// `RUST_LOG`".
pub fn level_for(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

/// Initialize env_logger. Output goes to stderr so stdout only carries the
/// program's own messages.
pub fn init(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = level_for(verbose) {
        builder.filter_level(level);
    }
    builder.target(env_logger::Target::Stderr).init();
}
