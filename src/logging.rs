//! Diagnostic output through `env_logger`, controlled by `RUST_LOG`

/// Install the logger for the binary, defaulting to `info`
///
/// Does nothing if a logger is already installed.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Install a logger whose output the test harness captures
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
