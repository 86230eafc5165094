//! `yt-dlp` as the search and download backend.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::clock::parse_clock;
use crate::search::{MediaEntry, MediaError, MediaFetch, MediaSearch};

pub const DEFAULT_FORMAT: &str = "best[height<=1080][fps<=30]";

const PROGRESS_PREFIX: &str = "progress:";
const PROGRESS_TEMPLATE: &str = "download:progress:%(progress.downloaded_bytes)s/\
%(progress.total_bytes,progress.total_bytes_estimate)s";

/// Search and download through the `yt-dlp` program.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    format: String,
    download_dir: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            format: DEFAULT_FORMAT.to_string(),
            download_dir: PathBuf::from("."),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn spawn_error(&self, source: std::io::Error) -> MediaError {
        MediaError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl MediaSearch for YtDlp {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<MediaEntry>, MediaError> {
        let output = Command::new(&self.program)
            .args(["--flat-playlist", "--dump-json", "--no-warnings"])
            .arg(format!("ytsearch{max_results}:{query}"))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let mut entries = parse_search_output(&String::from_utf8_lossy(&output.stdout))?;
        entries.truncate(max_results);
        log::debug!("search {query:?} returned {} entries", entries.len());
        Ok(entries)
    }
}

impl MediaFetch for YtDlp {
    fn fetch(
        &self,
        locator: &str,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<PathBuf, MediaError> {
        let template = self.download_dir.join("downloaded.%(ext)s");
        let mut child = Command::new(&self.program)
            .args(["--newline", "--no-warnings", "--progress", "--no-playlist"])
            .args(["-f", &self.format])
            .arg("-o")
            .arg(&template)
            .args(["--progress-template", PROGRESS_TEMPLATE])
            .args(["--print", "after_move:filepath"])
            .arg(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Drained on the side so a chatty stderr cannot stall stdout.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text);
                text
            })
        });

        let read = match child.stdout.take() {
            Some(stdout) => read_fetch_output(stdout, progress),
            None => Ok(None),
        };
        let path = match read {
            Ok(path) => path,
            Err(err) => {
                log::warn!("lost {} output, stopping it: {err}", self.program);
                let _ = child.kill();
                let _ = child.wait();
                if let Some(handle) = stderr_reader {
                    let _ = handle.join();
                }
                return Err(err.into());
            }
        };

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(MediaError::Failed {
                program: self.program.clone(),
                code: status.code(),
                stderr,
            });
        }

        let path = path.ok_or(MediaError::NoOutputFile)?;
        log::info!("downloaded {locator} to {}", path.display());
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct SearchRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    duration_string: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

impl SearchRecord {
    fn into_entry(self) -> Option<MediaEntry> {
        let locator = self
            .webpage_url
            .or(self.url)
            .or_else(|| self.id.map(|id| format!("https://www.youtube.com/watch?v={id}")))?;
        Some(MediaEntry {
            title: self.title.unwrap_or_default(),
            channel: self.channel.or(self.uploader).unwrap_or_default(),
            duration: self
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|d| d.round() as u64)
                .or_else(|| self.duration_string.as_deref().and_then(parse_clock)),
            locator,
        })
    }
}

/// Follow `fetch` stdout: progress lines go to `progress`, the last other
/// non-empty line is the downloaded file.
fn read_fetch_output(
    stdout: impl Read,
    progress: &mut dyn FnMut(u64, u64),
) -> std::io::Result<Option<PathBuf>> {
    let mut path = None;
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        if let Some((done, total)) = parse_progress_line(&line) {
            progress(done, total);
        } else if line.starts_with(PROGRESS_PREFIX) {
            log::trace!("progress without sizes: {line}");
        } else if !line.trim().is_empty() {
            path = Some(PathBuf::from(line.trim()));
        }
    }
    Ok(path)
}

/// Parse `--dump-json` output: one JSON object per line.
///
/// Records with nothing to download from are skipped.
pub fn parse_search_output(stdout: &str) -> Result<Vec<MediaEntry>, MediaError> {
    let mut entries = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let record: SearchRecord =
            serde_json::from_str(line).map_err(|source| MediaError::Parse {
                line: line.to_string(),
                source,
            })?;
        match record.into_entry() {
            Some(entry) => entries.push(entry),
            None => log::warn!("skipping search result without a locator"),
        }
    }
    Ok(entries)
}

/// `progress:<downloaded>/<total>` into byte counts.
///
/// Sizes yt-dlp does not know yet (`NA`, or a zero total) give `None`.
pub fn parse_progress_line(line: &str) -> Option<(u64, u64)> {
    let (done, total) = line.trim().strip_prefix(PROGRESS_PREFIX)?.split_once('/')?;
    let done = parse_size(done)?;
    let total = parse_size(total)?;
    (total > 0).then_some((done, total))
}

fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim();
    text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}
