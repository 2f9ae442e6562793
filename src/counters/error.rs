use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the fan-out machinery itself. Any of these aborts the run,
/// since a partial tally can't be trusted once a worker is lost.
#[derive(Debug, Error)]
pub enum CountError {
    #[error("failed to spawn worker for {}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("worker exited without a result for {}", display_paths(.paths))]
    WorkerLost { paths: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
