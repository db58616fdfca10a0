//! Tracing subscriber initialisation.
//!
//! `dswift_core` only emits events; the binary decides where they go.
//!
//! | Flag(s)     | Filter level |
//! |-------------|--------------|
//! | (none)      | WARN         |
//! | `--verbose` | DEBUG        |
//! | `--quiet`   | ERROR        |
//!
//! `RUST_LOG` overrides all of the above if set.

use std::io::IsTerminal as _;

use dswift_core::AnyEmptyResult;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::DswiftCli;

/// Install the global subscriber, writing to stderr.
pub fn init_logging(args: &DswiftCli, use_color: bool) -> AnyEmptyResult {
	let level = derive_level(args.verbose, args.quiet);
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!(
			"dswift={level},dswift_cli={level},dswift_core={level}"
		))
	});

	let fmt_layer = tracing_subscriber::fmt::layer()
		.with_target(false)
		.with_ansi(use_color && std::io::stderr().is_terminal())
		.with_writer(std::io::stderr);

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt_layer)
		.try_init()
		.map_err(|e| format!("failed to initialise tracing: {e}"))?;

	Ok(())
}

fn derive_level(verbose: bool, quiet: bool) -> &'static str {
	if quiet {
		"error"
	} else if verbose {
		"debug"
	} else {
		"warn"
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::derive_level;

	#[rstest]
	#[case::default(false, false, "warn")]
	#[case::verbose(true, false, "debug")]
	#[case::quiet(false, true, "error")]
	#[case::quiet_wins(true, true, "error")]
	fn maps_flags_to_levels(#[case] verbose: bool, #[case] quiet: bool, #[case] expected: &str) {
		assert_eq!(derive_level(verbose, quiet), expected);
	}
}
