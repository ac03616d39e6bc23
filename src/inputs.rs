//! Facilities for turning command line inputs into a de-duplicated list of files.

use std::path::{Path, PathBuf};

use log::warn;
use rustc_hash::FxHashSet;
use walkdir::WalkDir;


/// Controls how directory inputs are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOptions {
    /// Descend into sub-directories of directory inputs.
    pub recursive: bool,
    /// Follow symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

/// Files to count plus the inputs that did not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    /// Existing regular files in first-seen order without duplicates.
    pub files: Vec<PathBuf>,
    /// Inputs that named nothing on disk.
    pub missing: Vec<PathBuf>,
    /// Directory entries that could not be read while expanding directories.
    pub unreadable: Vec<PathBuf>,
}

/// Expands `inputs` into regular files.
///
/// Directories contribute the files beneath them (only the first level when
/// [`InputOptions::recursive`] is `false`). Missing inputs and entries that fail during the walk
/// are logged and collected rather than treated as errors.
#[must_use]
pub fn resolve_inputs<P: AsRef<Path>>(inputs: &[P], opts: &InputOptions) -> ResolvedInputs {
    let mut resolved = ResolvedInputs::default();
    let mut seen = FxHashSet::default();
    let mut push = |path: PathBuf, files: &mut Vec<PathBuf>| {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    };

    for input in inputs {
        let path = input.as_ref();
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => {
                warn!("skipping missing input {}", path.display());
                resolved.missing.push(path.to_path_buf());
                continue;
            }
        };
        if metadata.is_file() {
            push(path.to_path_buf(), &mut resolved.files);
        } else if metadata.is_dir() {
            let depth = if opts.recursive { usize::MAX } else { 1 };
            let walker = WalkDir::new(path)
                .follow_links(opts.follow_symlinks)
                .max_depth(depth)
                .sort_by_file_name();
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        let unreadable = err.path().unwrap_or(path).to_path_buf();
                        warn!("skipping unreadable entry {}: {err}", unreadable.display());
                        resolved.unreadable.push(unreadable);
                        continue;
                    }
                };
                if entry.file_type().is_file()
                    || (opts.follow_symlinks && entry.path().is_file())
                {
                    push(entry.into_path(), &mut resolved.files);
                }
            }
        }
    }
    resolved
}
