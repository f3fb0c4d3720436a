// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=ASSET_CAPTURE_VERSION");

    // Packaged builds pin the version explicitly
    let version = std::env::var("ASSET_CAPTURE_VERSION")
        .ok()
        .or_else(describe_head)
        .unwrap_or_else(env_version);

    println!("cargo::rustc-env=BUILD_VERSION={}", version);
}

fn env_version() -> String {
    std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string())
}

/// `git describe` output with the leading `v` removed, e.g. "0.1.0-3-gabcdef1"
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if described.is_empty() {
        return None;
    }

    // A bare commit hash means no release tag exists yet
    if !described.starts_with('v') {
        return Some(format!("{}-{}", env_version(), described));
    }

    Some(described.trim_start_matches('v').to_string())
}
