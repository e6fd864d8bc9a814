use tracing_subscriber::EnvFilter;

/// Filter directive for the given verbosity flags. `--quiet` wins over `-v`.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "limeflow=debug,info",
        _ => "limeflow=trace,debug",
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the flags.
pub fn init(verbose: u8, quiet: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(verbose > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0, false), "warn");
        assert_eq!(default_directive(1, false), "limeflow=debug,info");
        assert_eq!(default_directive(5, false), "limeflow=trace,debug");
        assert_eq!(default_directive(2, true), "error");
    }
}
