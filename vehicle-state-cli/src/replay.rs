//! Replay file reader
//!
//! A replay file holds one JSON object per control cycle with the messages
//! the bus decoder resolved on that cycle:
//!
//! ```text
//! {"timestamp": "2024-05-01T12:00:00.010Z", "messages": {"CRUISE": {"SET_ME": 1}}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use vehicle_state_decoder::{ParsedSignals, Timestamp};

/// Errors raised while reading a replay file
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read replay file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cycle at {path:?}:{line}: {source}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded control cycle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayCycle {
    /// Bus time of the cycle, if recorded
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// Messages observed this cycle: message → signal → value
    #[serde(default)]
    pub messages: HashMap<String, HashMap<String, f64>>,
}

impl ReplayCycle {
    /// Apply this cycle's observations to the signal table
    pub fn apply(self, cp: &mut ParsedSignals, timestamp: Timestamp) {
        for (message, values) in self.messages {
            cp.update_message(&message, values, timestamp);
        }
    }
}

/// Iterator over the cycles of a replay file
pub struct ReplayReader<R: BufRead> {
    path: PathBuf,
    lines: Lines<R>,
    line_no: usize,
}

impl ReplayReader<BufReader<File>> {
    /// Open a replay file
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayReader<R> {
    pub fn new(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<ReplayCycle, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(ReplayError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|source| {
                ReplayError::MalformedLine {
                    path: self.path.clone(),
                    line: self.line_no,
                    source,
                }
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(content: &str) -> ReplayReader<Cursor<Vec<u8>>> {
        ReplayReader::new(Path::new("test.jsonl"), Cursor::new(content.as_bytes().to_vec()))
    }

    #[test]
    fn test_reads_cycles_and_skips_comments() {
        let content = r#"
# recorded on a BYD QIN
{"timestamp": "2024-05-01T12:00:00Z", "messages": {"CRUISE": {"SET_ME": 1}}}

{"messages": {"GEARBOX": {"GEAR_SHIFTER": 4}}}
"#;
        let cycles: Vec<ReplayCycle> = reader(content).collect::<Result<_, _>>().unwrap();

        assert_eq!(cycles.len(), 2);
        assert!(cycles[0].timestamp.is_some());
        assert_eq!(cycles[0].messages["CRUISE"]["SET_ME"], 1.0);
        assert!(cycles[1].timestamp.is_none());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let content = "{\"messages\": {}}\n{not json}\n";
        let results: Vec<_> = reader(content).collect();

        assert!(results[0].is_ok());
        match &results[1] {
            Err(ReplayError::MalformedLine { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected malformed line, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_updates_table() {
        let cycle: ReplayCycle =
            serde_json::from_str(r#"{"messages": {"LIGHT2": {"LEFT_BLINKER": 1}}}"#).unwrap();
        let mut cp = ParsedSignals::new();
        let now = chrono::Utc::now();

        cycle.apply(&mut cp, now);
        assert_eq!(cp.get("LIGHT2", "LEFT_BLINKER"), Some(1.0));
        assert_eq!(cp.last_update("LIGHT2"), Some(now));
    }

    #[test]
    fn test_missing_file() {
        let err = ReplayReader::open(Path::new("/nonexistent/replay.jsonl")).err().unwrap();
        assert!(matches!(err, ReplayError::Io { .. }));
    }
}
