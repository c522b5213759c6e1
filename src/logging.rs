//! Log output for the binary.
//!
//! Logs go to stderr so that command output on stdout stays clean. The
//! `-v`/`-q` flags pick the level of the workspace's own crates; `RUST_LOG`
//! replaces the whole filter when set.

use tracing_subscriber::EnvFilter;

const CRATES: [&str; 7] = [
    "mnemo",
    "mnemo_catalog",
    "mnemo_config",
    "mnemo_imagegen",
    "mnemo_library",
    "mnemo_records",
    "mnemo_storage",
];

fn level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    }
}

/// Dependencies only ever log warnings unless `RUST_LOG` says otherwise.
/// With `-q` they are held to errors like everything else.
fn directives(verbose: u8, quiet: bool) -> String {
    let level = level(verbose, quiet);
    let mut directives = vec![if quiet { "error" } else { "warn" }.to_string()];
    directives.extend(CRATES.iter().map(|name| format!("{name}={level}")));
    directives.join(",")
}

pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(verbose, quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 2)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level() {
        assert_eq!(level(0, false), "warn");
        assert_eq!(level(1, false), "info");
        assert_eq!(level(2, false), "debug");
        assert_eq!(level(4, false), "trace");
        assert_eq!(level(0, true), "error");
    }

    #[test]
    fn test_directives_parse() {
        let directives = directives(2, false);
        assert!(directives.starts_with("warn,mnemo=debug,"));
        assert!(directives.contains("mnemo_library=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
