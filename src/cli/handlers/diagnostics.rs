// src/cli/handlers/diagnostics.rs

//! `--debug` on its own: reports where muxdeck looks for its files.
use std::path::Path;

use crate::constants::RUN_WRAPPER_FILENAME;

pub fn handle(config_path: Option<&Path>, bin_dir: Option<&Path>) {
    for line in report(config_path, bin_dir) {
        println!("{}", line);
    }
}

pub fn report(config_path: Option<&Path>, bin_dir: Option<&Path>) -> Vec<String> {
    let shown = |p: Option<&Path>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string())
    };
    let wrapper_exists = bin_dir.is_some_and(|dir| dir.join(RUN_WRAPPER_FILENAME).is_file());
    vec![
        format!("Config: {}", shown(config_path)),
        format!("BinDir: {}", shown(bin_dir)),
        format!("{} exists: {}", RUN_WRAPPER_FILENAME, wrapper_exists),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_report_with_helper_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RUN_WRAPPER_FILENAME), "#!/bin/sh\n").unwrap();
        let config = dir.path().join("config");

        let lines = report(Some(&config), Some(dir.path()));
        assert_eq!(lines[0], format!("Config: {}", config.display()));
        assert_eq!(lines[1], format!("BinDir: {}", dir.path().display()));
        assert_eq!(lines[2], "muxdeck-run exists: true");
    }

    #[test]
    fn test_report_when_nothing_is_found() {
        assert_eq!(
            report(None, None),
            [
                "Config: (not found)",
                "BinDir: (not found)",
                "muxdeck-run exists: false"
            ]
        );
    }
}
