// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scoped stdio files for command-style modules
//!
//! Each invocation gets three uniquely named files. They are owned by
//! [`ScopedStdio`] and removed when it drops, on success, error, or unwind.

use crate::runtime::error::AdapterResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

pub struct ScopedStdio {
    stdin: NamedTempFile,
    stdout: NamedTempFile,
    stderr: NamedTempFile,
}

impl ScopedStdio {
    /// Creates the three files in `dir` and writes `input` to stdin.
    pub fn create(dir: &Path, target: &str, input: &[u8]) -> AdapterResult<Self> {
        let stdin = Self::named(dir, "stdin", target)?;
        let stdout = Self::named(dir, "stdout", target)?;
        let stderr = Self::named(dir, "stderr", target)?;

        stdin.as_file().write_all(input)?;
        stdin.as_file().flush()?;

        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }

    fn named(dir: &Path, stream: &str, target: &str) -> AdapterResult<NamedTempFile> {
        let prefix = format!("{}.{}.", stream, target);
        Ok(Builder::new().prefix(&prefix).suffix(".txt").tempfile_in(dir)?)
    }

    /// Fresh read handle positioned at the start of stdin.
    pub fn stdin_reader(&self) -> AdapterResult<File> {
        Ok(self.stdin.reopen()?)
    }

    pub fn stdout_writer(&self) -> AdapterResult<File> {
        Ok(self.stdout.reopen()?)
    }

    pub fn stderr_writer(&self) -> AdapterResult<File> {
        Ok(self.stderr.reopen()?)
    }

    pub fn read_stdout(&self) -> AdapterResult<Vec<u8>> {
        Ok(std::fs::read(self.stdout.path())?)
    }

    pub fn read_stderr(&self) -> AdapterResult<String> {
        let bytes = std::fs::read(self.stderr.path())?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn paths(stdio: &ScopedStdio) -> [PathBuf; 3] {
        [
            stdio.stdin.path().to_path_buf(),
            stdio.stdout.path().to_path_buf(),
            stdio.stderr.path().to_path_buf(),
        ]
    }

    #[test]
    fn test_files_are_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let stdio = ScopedStdio::create(dir.path(), "javy", b"{}").unwrap();
        let paths = paths(&stdio);
        assert!(paths.iter().all(|p| p.exists()));

        drop(stdio);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn test_stdin_holds_input_and_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let first = ScopedStdio::create(dir.path(), "javy", b"[1,2]").unwrap();
        let second = ScopedStdio::create(dir.path(), "javy", b"[3]").unwrap();

        let mut contents = String::new();
        first.stdin_reader().unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "[1,2]");

        let first_names = paths(&first);
        assert!(paths(&second).iter().all(|p| !first_names.contains(p)));
        assert!(first_names[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("stdin.javy."));
    }
}
