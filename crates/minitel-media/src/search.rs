//! What a video search returns, and the traits that search and download.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clock::format_clock;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub title: String,
    pub channel: String,
    /// Length in seconds, when the source knows it.
    #[serde(default)]
    pub duration: Option<u64>,
    /// What to hand to [`MediaFetch::fetch`] to retrieve this entry.
    pub locator: String,
}

impl MediaEntry {
    /// `1:02:03`-style duration, or `live` when unknown.
    pub fn duration_label(&self) -> String {
        self.duration.map_or_else(|| "live".to_string(), format_clock)
    }
}

/// Errors from searching or fetching media.
#[derive(Debug)]
pub enum MediaError {
    /// The helper program could not be started.
    Spawn { program: String, source: io::Error },
    /// The helper ran but reported failure.
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// A line of helper output could not be understood.
    Parse { line: String, source: serde_json::Error },
    /// The download finished without naming the file it wrote.
    NoOutputFile,
    Io(io::Error),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::Spawn { program, source } => write!(f, "failed to run {program}: {source}"),
            MediaError::Failed { program, code, stderr } => {
                match code {
                    Some(code) => write!(f, "{program} exited with code {code}")?,
                    None => write!(f, "{program} was killed by a signal")?,
                }
                let first = stderr.lines().next().unwrap_or("").trim();
                if !first.is_empty() {
                    write!(f, ": {first}")?;
                }
                Ok(())
            }
            MediaError::Parse { line, source } => {
                write!(f, "unreadable helper output {line:?}: {source}")
            }
            MediaError::NoOutputFile => write!(f, "download did not report an output file"),
            MediaError::Io(err) => write!(f, "media I/O error: {err}"),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::Spawn { source, .. } => Some(source),
            MediaError::Parse { source, .. } => Some(source),
            MediaError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(err: io::Error) -> Self {
        MediaError::Io(err)
    }
}

/// Finds media matching free-text keywords.
pub trait MediaSearch {
    /// At most `max_results` entries, best match first.
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<MediaEntry>, MediaError>;
}

/// Downloads media to a local file.
pub trait MediaFetch {
    /// Retrieve `locator`, reporting `(bytes_so_far, total_bytes)` as it
    /// goes, and return the path of the written file.
    fn fetch(
        &self,
        locator: &str,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<PathBuf, MediaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(duration: Option<u64>) -> MediaEntry {
        MediaEntry {
            title: "Générique".to_string(),
            channel: "INA".to_string(),
            duration,
            locator: "https://www.youtube.com/watch?v=abc".to_string(),
        }
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(entry(Some(3723)).duration_label(), "1:02:03");
        assert_eq!(entry(Some(65)).duration_label(), "1:05");
        assert_eq!(entry(None).duration_label(), "live");
    }

    #[test]
    fn test_failed_display_uses_first_stderr_line() {
        let err = MediaError::Failed {
            program: "yt-dlp".to_string(),
            code: Some(1),
            stderr: "ERROR: video unavailable\nmore detail\n".to_string(),
        };
        assert_eq!(err.to_string(), "yt-dlp exited with code 1: ERROR: video unavailable");
    }

    #[test]
    fn test_entry_deserializes_without_duration() {
        let json = r#"{"title":"a","channel":"b","locator":"c"}"#;
        let parsed: MediaEntry = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.duration, None);
    }
}
