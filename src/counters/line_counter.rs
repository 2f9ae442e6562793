use super::{FrequencyTable, Limits, Token};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{error, warn};

/// Non-fatal conditions found while counting. The caller decides where they go.
#[derive(Debug)]
pub enum Diagnostic {
    EmptyLine { source: String, line: u64 },
    CapacityExceeded { source: String, token: Token, capacity: usize },
    CannotOpenFile { path: PathBuf, error: io::Error },
    ReadFailed { source: String, line: u64, error: io::Error },
}

impl Diagnostic {
    pub fn log(&self) {
        match self {
            Diagnostic::EmptyLine { source, line } => {
                warn!(source = %source, line, "line {} of {} is empty", line, source);
            }
            Diagnostic::CapacityExceeded { source, token, capacity } => {
                warn!(
                    source = %source,
                    capacity,
                    "too many distinct names in {}, dropped {:?}",
                    source,
                    token.as_str()
                );
            }
            Diagnostic::CannotOpenFile { path, error } => {
                error!(path = %path.display(), "cannot open file {}: {}", path.display(), error);
            }
            Diagnostic::ReadFailed { source, line, error } => {
                error!(source = %source, line, "read failed in {} after line {}: {}", source, line, error);
            }
        }
    }
}

/// What a single pass over a source saw, for the summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub lines: u64,
    pub empty_lines: u64,
    pub dropped: u64,
}

/// Counts one name per line of `reader` into `table`.
///
/// Exactly one trailing `\n` (or `\r\n`) is stripped from each line. Empty
/// lines and names rejected by the capacity guard are reported through
/// `report` and skipped. A read error ends the pass and is returned to the
/// caller; counts gathered up to that point stay in `table`.
pub fn process_source<R, F>(
    mut reader: R,
    source: &str,
    limits: &Limits,
    table: &mut FrequencyTable,
    mut report: F,
) -> Result<SourceStats, (SourceStats, io::Error)>
where
    R: BufRead,
    F: FnMut(Diagnostic),
{
    let mut stats = SourceStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err((stats, e)),
        }
        stats.lines += 1;

        let content = strip_terminator(&buf);
        if content.is_empty() {
            stats.empty_lines += 1;
            report(Diagnostic::EmptyLine {
                source: source.to_string(),
                line: stats.lines,
            });
            continue;
        }

        let token = Token::new(&String::from_utf8_lossy(content), limits.max_name_length);
        if let Err(full) = table.record(token) {
            stats.dropped += 1;
            report(Diagnostic::CapacityExceeded {
                source: source.to_string(),
                token: full.token,
                capacity: full.capacity,
            });
        }
    }

    Ok(stats)
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    match line.strip_suffix(b"\n") {
        Some(rest) => rest.strip_suffix(b"\r").unwrap_or(rest),
        None => line,
    }
}
