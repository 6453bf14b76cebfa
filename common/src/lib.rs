use env_logger::{Builder, Env};
use std::io::Write;

/// Loads a `.env` file if present and initializes the logger.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
/// Lines are prefixed with the wall-clock time, which is what an operator
/// watching a polling loop cares about.
pub fn setup_env() {
    dotenvy::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
