//! Recursive directory encryption and decryption.
//!
//! A directory job mirrors the input tree under the output root, runs the
//! single-file pipeline on every file, and keeps going when individual
//! files fail.  The job only fails as a whole when every file failed.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use crate::container::format::CONTAINER_SUFFIX;
use crate::core::file::{decrypt_file, seal_file, FileOptions};
use crate::core::progress::{emit, Outcome, ProgressEvent};
use crate::crypto::kdf::DerivedKey;
use crate::errors::{NokvaultError, Result};

/// Lifecycle of one file within a directory job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

/// A file that could not be processed, and why.
#[derive(Debug)]
pub struct FileFailure {
    /// Path relative to the job's input root.
    pub relative_path: PathBuf,
    pub error: NokvaultError,
}

/// Outcome of a directory job.
#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<FileFailure>,
}

impl DirectoryReport {
    /// Some files succeeded and some failed.
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && !self.failures.is_empty()
    }

    /// Every file failed (and there was at least one).
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }

    pub fn failed_paths(&self) -> impl Iterator<Item = &Path> {
        self.failures.iter().map(|f| f.relative_path.as_path())
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

struct JobEntry {
    source: PathBuf,
    relative: PathBuf,
    state: EntryState,
}

/// One pass over an input tree.  Exists only for the duration of a call.
struct DirectoryJob<'a> {
    output_root: &'a Path,
    direction: Direction,
    entries: Vec<JobEntry>,
    report: DirectoryReport,
}

impl<'a> DirectoryJob<'a> {
    fn plan(input_root: &Path, output_root: &'a Path, direction: Direction) -> Result<Self> {
        let mut report = DirectoryReport::default();
        let mut files = Vec::new();
        collect_files(input_root, input_root, &mut files, &mut report.failures)?;

        let entries: Vec<JobEntry> = files
            .into_iter()
            .filter(|relative| match direction {
                Direction::Encrypt => true,
                Direction::Decrypt => has_container_suffix(relative),
            })
            .map(|relative| JobEntry {
                source: input_root.join(&relative),
                relative,
                state: EntryState::Pending,
            })
            .collect();

        report.total = entries.len() + report.failures.len();
        Ok(Self {
            output_root,
            direction,
            entries,
            report,
        })
    }

    fn run(
        mut self,
        progress: Option<&Sender<ProgressEvent>>,
        mut process: impl FnMut(&Path, &Path, &Path) -> Result<()>,
    ) -> Result<DirectoryReport> {
        fs::create_dir_all(self.output_root)?;

        let total = self.report.total;
        let mut current = 0;

        // Unreadable subdirectories found while planning count as processed.
        for failure in &self.report.failures {
            current += 1;
            emit(
                progress,
                ProgressEvent {
                    current,
                    total,
                    relative_path: failure.relative_path.to_string_lossy().into_owned(),
                    outcome: Outcome::Failed(failure.error.to_string()),
                },
            );
        }

        for entry in &mut self.entries {
            entry.state = EntryState::InProgress;
            current += 1;

            let target_rel = target_relative(&entry.relative, self.direction);
            let target = self.output_root.join(&target_rel);
            let result = ensure_parent(&target)
                .and_then(|()| process(&entry.source, &target, &entry.relative));

            // Progress names the plaintext side of the pair.
            let label = match self.direction {
                Direction::Encrypt => entry.relative.to_string_lossy().into_owned(),
                Direction::Decrypt => target_rel.to_string_lossy().into_owned(),
            };
            let outcome = match result {
                Ok(()) => {
                    entry.state = EntryState::Succeeded;
                    self.report.succeeded += 1;
                    debug!(file = %label, "processed");
                    Outcome::Succeeded
                }
                Err(error) => {
                    entry.state = EntryState::Failed;
                    warn!(file = %label, "failed: {error}");
                    let message = error.to_string();
                    self.report.failures.push(FileFailure {
                        relative_path: entry.relative.clone(),
                        error,
                    });
                    Outcome::Failed(message)
                }
            };

            emit(
                progress,
                ProgressEvent {
                    current,
                    total,
                    relative_path: label,
                    outcome,
                },
            );
        }

        debug_assert!(self
            .entries
            .iter()
            .all(|e| matches!(e.state, EntryState::Succeeded | EntryState::Failed)));

        let report = self.report;
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "directory job finished"
        );
        if report.all_failed() {
            return Err(NokvaultError::BatchFailed { report });
        }
        Ok(report)
    }
}

/// Encrypt every file under `input_root` into `output_root`, appending
/// `.nokvault` to each mirrored path.
///
/// A missing or empty input directory yields an empty report.
pub fn encrypt_directory(
    input_root: &Path,
    output_root: &Path,
    key: &DerivedKey,
    salt: &[u8],
    options: &FileOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> Result<DirectoryReport> {
    DirectoryJob::plan(input_root, output_root, Direction::Encrypt)?.run(
        progress,
        |source, target, relative| {
            let rel = relative.to_string_lossy();
            seal_file(source, target, key, salt, Some(rel.as_ref()), options)
        },
    )
}

/// Decrypt every `.nokvault` file under `input_root` into `output_root`,
/// stripping the suffix from each mirrored path.
pub fn decrypt_directory(
    input_root: &Path,
    output_root: &Path,
    key: &DerivedKey,
    options: &FileOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> Result<DirectoryReport> {
    DirectoryJob::plan(input_root, output_root, Direction::Decrypt)?.run(
        progress,
        |source, target, _| decrypt_file(source, target, key, options),
    )
}

/// Find the first container under `root`, e.g. to read the salt a
/// directory was encrypted with.
pub fn find_first_container(root: &Path) -> Result<Option<PathBuf>> {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    collect_files(root, root, &mut files, &mut failures)?;
    Ok(files
        .into_iter()
        .find(|rel| has_container_suffix(rel))
        .map(|rel| root.join(rel)))
}

/// Walk `dir` recursively, pushing paths of non-directory entries
/// relative to `root`.
///
/// A missing root is treated as empty.  Unreadable subdirectories are
/// recorded as failures and skipped.
fn collect_files(
    root: &Path,
    dir: &Path,
    files: &mut Vec<PathBuf>,
    failures: &mut Vec<FileFailure>,
) -> Result<()> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if dir == root && e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) if dir == root => return Err(e.into()),
        Err(e) => {
            failures.push(FileFailure {
                relative_path: relative_to(root, dir),
                error: e.into(),
            });
            return Ok(());
        }
    };

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push(FileFailure {
                    relative_path: relative_to(root, dir),
                    error: e.into(),
                });
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            collect_files(root, &path, files, failures)?;
        } else {
            files.push(relative_to(root, &path));
        }
    }
    Ok(())
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn has_container_suffix(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(CONTAINER_SUFFIX))
        .unwrap_or(false)
}

fn target_relative(relative: &Path, direction: Direction) -> PathBuf {
    match direction {
        Direction::Encrypt => {
            let mut name = OsString::from(relative.as_os_str());
            name.push(CONTAINER_SUFFIX);
            PathBuf::from(name)
        }
        Direction::Decrypt => {
            let s = relative.to_string_lossy();
            PathBuf::from(s.strip_suffix(CONTAINER_SUFFIX).unwrap_or(&s))
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
