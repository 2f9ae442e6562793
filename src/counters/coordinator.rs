use super::line_counter::{process_source, Diagnostic, SourceStats};
use super::worker::{Worker, WorkerResult};
use super::{CountError, FrequencyTable, Limits, PeakMemory};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

/// The merged outcome of a run.
#[derive(Debug)]
pub struct Tally {
    pub table: FrequencyTable,
    pub sources: usize,
    pub failed_sources: usize,
    pub empty_lines: u64,
    pub dropped: u64,
}

impl Tally {
    fn new(limits: &Limits) -> Self {
        Tally {
            table: FrequencyTable::with_capacity(limits.max_unique),
            sources: 0,
            failed_sources: 0,
            empty_lines: 0,
            dropped: 0,
        }
    }

    fn add_stats(&mut self, stats: &SourceStats) {
        self.sources += 1;
        self.empty_lines += stats.empty_lines;
        self.dropped += stats.dropped;
    }
}

type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

struct Pending {
    path: PathBuf,
    inbound: Receiver<WorkerResult>,
    handle: JoinHandle<()>,
}

pub struct Coordinator {
    limits: Limits,
    memory: PeakMemory,
}

impl Coordinator {
    pub fn new(limits: Limits) -> Self {
        Coordinator {
            limits,
            memory: PeakMemory::new(),
        }
    }

    pub fn peak_memory_bytes(&self) -> Option<u64> {
        self.memory.bytes()
    }

    /// No-files mode: counts a single stream on the calling thread.
    pub fn run_stream<R: BufRead>(&self, reader: R, label: &str) -> Tally {
        let mut tally = Tally::new(&self.limits);
        let stats = match process_source(reader, label, &self.limits, &mut tally.table, |d| d.log()) {
            Ok(stats) => stats,
            Err((stats, error)) => {
                tally.failed_sources += 1;
                Diagnostic::ReadFailed {
                    source: label.to_string(),
                    line: stats.lines,
                    error,
                }
                .log();
                stats
            }
        };
        tally.add_stats(&stats);
        self.memory.sample();
        tally
    }

    /// Counts every path on its own worker thread and merges the results in
    /// argument order.
    ///
    /// Each worker gets a private single-slot channel, so a finished worker
    /// never waits on the coordinator even while an earlier path is still
    /// being drained. Workers are joined only after every channel has been
    /// read.
    pub fn run_files(&self, paths: &[PathBuf]) -> Result<Tally, CountError> {
        let pending = self.spawn_all(paths, |name, body| {
            thread::Builder::new().name(name).spawn(body)
        })?;
        self.drain(pending)
    }

    fn spawn_all<S>(&self, paths: &[PathBuf], mut spawn: S) -> Result<Vec<Pending>, CountError>
    where
        S: FnMut(String, WorkerBody) -> io::Result<JoinHandle<()>>,
    {
        let mut pending = Vec::with_capacity(paths.len());

        for (i, path) in paths.iter().enumerate() {
            let (outbound, inbound) = mpsc::sync_channel(1);
            let worker = Worker::new(path.clone(), self.limits);

            match spawn(format!("worker-{}", i), Box::new(move || worker.run(outbound))) {
                Ok(handle) => pending.push(Pending {
                    path: path.clone(),
                    inbound,
                    handle,
                }),
                Err(source) => {
                    // Reap what already started; their receivers are still alive.
                    for started in pending {
                        let _ = started.handle.join();
                    }
                    return Err(CountError::Spawn {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        debug!(workers = pending.len(), "spawned workers");
        Ok(pending)
    }

    /// Reads one result per channel in the given order, then joins every
    /// worker. A channel that closes without a result marks its path lost.
    fn drain(&self, pending: Vec<Pending>) -> Result<Tally, CountError> {
        let mut tally = Tally::new(&self.limits);
        let mut lost = Vec::new();
        let mut handles = Vec::with_capacity(pending.len());

        for Pending { path, inbound, handle } in pending {
            handles.push(handle);
            match inbound.recv() {
                Ok(result) => self.merge(&mut tally, result),
                Err(_) => {
                    error!(path = %path.display(), "worker exited without sending a result");
                    lost.push(path);
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                debug!("worker thread panicked");
            }
        }

        if !lost.is_empty() {
            return Err(CountError::WorkerLost { paths: lost });
        }
        Ok(tally)
    }

    fn merge(&self, tally: &mut Tally, result: WorkerResult) {
        tally.add_stats(&result.stats);
        if !result.succeeded() {
            tally.failed_sources += 1;
        }

        let dropped = tally.table.merge_from(&result.table);
        if dropped > 0 {
            tally.dropped += dropped as u64;
            warn!(
                source = %result.source.display(),
                dropped,
                capacity = tally.table.capacity(),
                "too many distinct names while merging {}",
                result.source.display()
            );
        }
        debug!(source = %result.source.display(), entries = result.table.len(), "merged");
        self.memory.sample();

        if let Some(diagnostic) = result.into_diagnostic() {
            diagnostic.log();
        }
    }
}
