// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to find pod data files with globs.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem, sorted.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    entries.sort();
    Ok(entries)
}

/// Find the data files in `dir` referred to by a deployment log `file_name`.
/// The name may omit the ".csv" extension and may itself be a glob. Glob
/// characters in `dir` are escaped. At least one match is required.
pub(crate) fn find_data_files(dir: &Path, file_name: &str) -> Result<Vec<PathBuf>, GlobError> {
    let dir = Pattern::escape(&dir.display().to_string());
    let mut patterns = vec![format!("{dir}/{file_name}")];
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        patterns.push(format!("{dir}/{file_name}.csv"));
    }

    let mut entries = vec![];
    for pattern in &patterns {
        for entry in get_all_matches_from_glob(pattern)? {
            if entry.is_file() && !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }
    if entries.is_empty() {
        return Err(GlobError::NoMatches {
            glob: patterns.join(" or "),
        });
    }
    Ok(entries)
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error("No data files were found for {glob}")]
    NoMatches { glob: String },

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_cargo() {
        let result = get_all_matches_from_glob("./Cargo*");
        assert!(result.is_ok());
        let entries = result.unwrap();
        assert!(&entries.contains(&PathBuf::from("Cargo.toml")));
    }

    #[test]
    fn test_find_data_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["YPODD4_a.csv", "YPODD4_b.csv", "YPODL1.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "datetime\n").unwrap();
        }

        let entries = find_data_files(dir.path(), "YPODL1").unwrap();
        assert_eq!(entries, [dir.path().join("YPODL1.csv")]);

        let entries = find_data_files(dir.path(), "YPODL1.csv").unwrap();
        assert_eq!(entries.len(), 1);

        let entries = find_data_files(dir.path(), "YPODD4_*").unwrap();
        assert_eq!(
            entries,
            [dir.path().join("YPODD4_a.csv"), dir.path().join("YPODD4_b.csv")]
        );

        let result = find_data_files(dir.path(), "YPODQ9");
        assert!(matches!(result, Err(GlobError::NoMatches { .. })));
    }
}
