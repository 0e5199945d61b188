// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Return the application data directory. It is not created here; only
/// saving the config needs it to exist.
pub fn data_dir() -> PathBuf {
    dirs_fallback().join("folio")
}

/// Default location of the persisted `AppConfig`.
pub fn config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
