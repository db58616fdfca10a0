#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn dswift_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("dswift"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// Write `content` to `relative` below `root`, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

/// Point the project at a `swift` executable that does not exist.
pub fn without_swift(root: &Path) {
	write(
		root,
		"dswift.toml",
		"[swift]\npath = \"/nonexistent/dswift-test/swift\"\n",
	);
}
