use super::line_counter::{process_source, Diagnostic, SourceStats};
use super::{FrequencyTable, Limits};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::SyncSender;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Succeeded,
    FailedToOpen,
    // Opened, but a read error cut the pass short. The partial table is still sent.
    FailedToRead,
}

/// Why a worker's table is empty or incomplete.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("cannot open file")]
    CannotOpenFile(#[source] io::Error),
    #[error("read failed after line {line}")]
    ReadFailed {
        line: u64,
        #[source]
        error: io::Error,
    },
}

/// The one message a worker hands back to the coordinator.
#[derive(Debug)]
pub struct WorkerResult {
    pub source: PathBuf,
    pub table: FrequencyTable,
    pub stats: SourceStats,
    pub error: Option<WorkerError>,
}

impl WorkerResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Diagnostic form of `error`, for the caller to surface.
    pub fn into_diagnostic(self) -> Option<Diagnostic> {
        let source = self.source;
        self.error.map(|e| match e {
            WorkerError::CannotOpenFile(error) => Diagnostic::CannotOpenFile { path: source, error },
            WorkerError::ReadFailed { line, error } => Diagnostic::ReadFailed {
                source: source.display().to_string(),
                line,
                error,
            },
        })
    }
}

// Counts a single file into a private table.
pub struct Worker {
    path: PathBuf,
    limits: Limits,
    state: WorkerState,
}

impl Worker {
    pub fn new(path: PathBuf, limits: Limits) -> Self {
        Worker {
            path,
            limits,
            state: WorkerState::Created,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(path = %self.path.display(), from = ?self.state, to = ?next, "worker state");
        self.state = next;
    }

    /// Opens the file and counts it. Line diagnostics are logged from here;
    /// open and read failures travel back inside the result.
    pub fn count(&mut self) -> WorkerResult {
        let mut table = FrequencyTable::with_capacity(self.limits.max_unique);

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                self.transition(WorkerState::FailedToOpen);
                return WorkerResult {
                    source: self.path.clone(),
                    table,
                    stats: SourceStats::default(),
                    error: Some(WorkerError::CannotOpenFile(e)),
                };
            }
        };

        self.transition(WorkerState::Running);
        let label = self.path.display().to_string();
        let (stats, error) = match process_source(
            BufReader::new(file),
            &label,
            &self.limits,
            &mut table,
            |d| d.log(),
        ) {
            Ok(stats) => {
                self.transition(WorkerState::Succeeded);
                (stats, None)
            }
            Err((stats, e)) => {
                self.transition(WorkerState::FailedToRead);
                let error = WorkerError::ReadFailed {
                    line: stats.lines,
                    error: e,
                };
                (stats, Some(error))
            }
        };

        WorkerResult {
            source: self.path.clone(),
            table,
            stats,
            error,
        }
    }

    /// Counts the file and sends the complete result as one message.
    pub fn run(mut self, outbound: SyncSender<WorkerResult>) {
        let result = self.count();
        if outbound.send(result).is_err() {
            error!(path = %self.path.display(), "coordinator hung up before receiving result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::mpsc;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn counts_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "names.txt", "bob\nann\nbob\n");

        let mut worker = Worker::new(path.clone(), Limits::default());
        assert_eq!(worker.state(), WorkerState::Created);
        let result = worker.count();

        assert_eq!(worker.state(), WorkerState::Succeeded);
        assert!(result.succeeded());
        assert_eq!(result.source, path);
        assert_eq!(result.table.get("bob"), Some(2));
        assert_eq!(result.table.get("ann"), Some(1));
        assert_eq!(result.stats.lines, 3);
    }

    #[test]
    fn missing_file_yields_empty_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let mut worker = Worker::new(path.clone(), Limits::default());
        let result = worker.count();

        assert_eq!(worker.state(), WorkerState::FailedToOpen);
        assert!(!result.succeeded());
        assert!(result.table.is_empty());
        match result.into_diagnostic() {
            Some(Diagnostic::CannotOpenFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected diagnostic {:?}", other),
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn read_failure_is_not_success() {
        // Opening a directory works on Linux; reading it fails.
        let dir = tempfile::tempdir().unwrap();

        let mut worker = Worker::new(dir.path().to_path_buf(), Limits::default());
        let result = worker.count();

        assert_eq!(worker.state(), WorkerState::FailedToRead);
        assert!(!result.succeeded());
        assert!(result.table.is_empty());
        match &result.error {
            Some(WorkerError::ReadFailed { line, .. }) => assert_eq!(*line, 0),
            other => panic!("unexpected error {:?}", other),
        }
        let err = result.error.as_ref().unwrap();
        assert_eq!(err.to_string(), "read failed after line 0");
        assert!(std::error::Error::source(err).is_some());
    }

    #[test]
    fn run_sends_exactly_one_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "names.txt", "x\n");

        let (tx, rx) = mpsc::sync_channel(1);
        Worker::new(path, Limits::default()).run(tx);

        let result = rx.recv().unwrap();
        assert_eq!(result.table.get("x"), Some(1));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn failed_open_still_writes_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::sync_channel(1);
        Worker::new(dir.path().join("nope"), Limits::default()).run(tx);

        let result = rx.recv().unwrap();
        assert!(!result.succeeded());
        assert!(result.table.is_empty());
    }
}
