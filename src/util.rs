use env_logger::{Env, Target};

/// Logging goes to stderr so it never interleaves with the board on stdout.
/// The default level is `warn`, override with `RUST_LOG`.
pub fn init_globals() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();
}
