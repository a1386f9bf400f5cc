// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The diagnostic directory receiving binary results of a build.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while managing the dump directory.
#[derive(Debug, Error)]
pub enum DumpError {
    /// A filesystem operation failed.
    #[error("dump I/O failed for {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A directory holding one build's binary results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDumpDirectory {
    root: PathBuf,
}

impl BinaryDumpDirectory {
    /// Points at `root`. Nothing is touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Removes everything from a previous build and recreates the directory.
    ///
    /// Returns the number of files removed.
    pub fn prepare_fresh(&self) -> Result<usize, DumpError> {
        let removed = self.file_count();
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root).map_err(|source| DumpError::Io {
                path: self.root.clone(),
                source,
            })?;
        }
        std::fs::create_dir_all(&self.root).map_err(|source| DumpError::Io {
            path: self.root.clone(),
            source,
        })?;
        log::info!(
            "BinaryDumpDirectory: Cleared {} files from {}",
            removed,
            self.root.display()
        );
        Ok(removed)
    }

    /// Writes `bytes` to `name` inside the directory.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, DumpError> {
        let path = self.root.join(name);
        std::fs::create_dir_all(&self.root).map_err(|source| DumpError::Io {
            path: self.root.clone(),
            source,
        })?;
        std::fs::write(&path, bytes).map_err(|source| DumpError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Number of regular files under the directory, zero if it does not exist.
    pub fn file_count(&self) -> usize {
        if !self.root.exists() {
            return 0;
        }
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count()
    }
}
