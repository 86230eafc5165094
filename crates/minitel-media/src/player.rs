//! Playback control over VLC's `oldrc` Unix socket interface.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for any answer from the player.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

const CONNECT_ATTEMPTS: u32 = 30;
const CONNECT_INTERVAL: Duration = Duration::from_millis(200);
const READ_CHUNK: usize = 1024;
const REAP_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from the player control connection.
#[derive(Debug)]
pub enum PlayerError {
    /// The player program could not be started.
    Spawn(io::Error),
    /// The control socket never accepted a connection.
    Connect(io::Error),
    /// The player closed the control connection.
    Disconnected,
    /// An answer that does not fit the question.
    UnexpectedResponse { command: String, lines: Vec<String> },
    Io(io::Error),
}

impl std::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::Spawn(err) => write!(f, "failed to start player: {err}"),
            PlayerError::Connect(err) => write!(f, "failed to connect to player: {err}"),
            PlayerError::Disconnected => write!(f, "player closed the control connection"),
            PlayerError::UnexpectedResponse { command, lines } => {
                write!(f, "unexpected answer to {command:?}: {lines:?}")
            }
            PlayerError::Io(err) => write!(f, "player I/O error: {err}"),
        }
    }
}

impl std::error::Error for PlayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlayerError::Spawn(err) | PlayerError::Connect(err) | PlayerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PlayerError {
    fn from(err: io::Error) -> Self {
        PlayerError::Io(err)
    }
}

/// Playback control. Times are whole seconds.
pub trait Player {
    fn add(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn play(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
    fn time(&mut self) -> Result<u64, PlayerError>;
    fn length(&mut self) -> Result<u64, PlayerError>;
    fn is_playing(&mut self) -> Result<bool, PlayerError>;
    fn quit(&mut self) -> Result<(), PlayerError>;

    /// `(elapsed, length)` of the current stream.
    fn progress(&mut self) -> Result<(u64, u64), PlayerError> {
        let length = self.length()?;
        let elapsed = self.time()?;
        Ok((elapsed, length))
    }
}

/// A VLC instance driven through its `oldrc` interface on a Unix socket.
pub struct VlcController {
    stream: UnixStream,
    child: Option<Child>,
}

impl VlcController {
    /// Start `program` (normally `cvlc`) listening on `socket`, then
    /// connect to it.
    pub fn spawn(program: &str, socket: &Path) -> Result<Self, PlayerError> {
        match std::fs::remove_file(socket) {
            Ok(()) => log::debug!("removed stale socket {}", socket.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(PlayerError::Io(err)),
        }

        let mut child = Command::new(program)
            .args(["-I", "oldrc", "--rc-unix"])
            .arg(socket)
            .args(["--no-rc-show-pos", "--quiet", "-f", "--no-osd"])
            .stdin(Stdio::null())
            .spawn()
            .map_err(PlayerError::Spawn)?;
        log::info!("started {program} (pid {})", child.id());

        match Self::connect_with_retry(socket) {
            Ok(mut controller) => {
                controller.child = Some(child);
                Ok(controller)
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(err)
            }
        }
    }

    /// Connect to a player that is already listening on `socket`.
    pub fn connect(socket: &Path) -> Result<Self, PlayerError> {
        let stream = UnixStream::connect(socket).map_err(PlayerError::Connect)?;
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: UnixStream) -> Result<Self, PlayerError> {
        stream.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        Ok(Self {
            stream,
            child: None,
        })
    }

    fn connect_with_retry(socket: &Path) -> Result<Self, PlayerError> {
        let mut attempt = 1;
        loop {
            match Self::connect(socket) {
                Ok(controller) => return Ok(controller),
                Err(PlayerError::Connect(err)) if attempt < CONNECT_ATTEMPTS => {
                    log::trace!("player socket not ready ({err}), attempt {attempt}");
                    attempt += 1;
                    thread::sleep(CONNECT_INTERVAL);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send one command and collect the meaningful lines of its answer.
    fn exchange(&mut self, command: &str) -> Result<Vec<String>, PlayerError> {
        self.stream.write_all(format!("{command}\n").as_bytes())?;

        let mut pending = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(PlayerError::Disconnected);
            }
            pending.extend_from_slice(&chunk[..n]);
            if !pending.ends_with(b"\n") {
                continue;
            }
            let lines = response_lines(&pending);
            pending.clear();
            if !lines.is_empty() {
                log::trace!("{command} -> {lines:?}");
                return Ok(lines);
            }
        }
    }

    fn numeric(&mut self, command: &str) -> Result<u64, PlayerError> {
        let lines = self.exchange(command)?;
        if let [value] = lines.as_slice() {
            if let Ok(value) = value.parse::<i64>() {
                return Ok(value.max(0) as u64);
            }
        }
        Err(PlayerError::UnexpectedResponse {
            command: command.to_string(),
            lines,
        })
    }
}

impl Player for VlcController {
    fn add(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.exchange(&format!("add {}", path.display()))?;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.exchange("play")?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.exchange("stop")?;
        Ok(())
    }

    fn time(&mut self) -> Result<u64, PlayerError> {
        self.numeric("get_time")
    }

    fn length(&mut self) -> Result<u64, PlayerError> {
        self.numeric("get_length")
    }

    fn is_playing(&mut self) -> Result<bool, PlayerError> {
        Ok(self.numeric("is_playing")? > 0)
    }

    /// Ask the player to exit and reap it if we started it.
    fn quit(&mut self) -> Result<(), PlayerError> {
        match self.exchange("quit") {
            Ok(_) | Err(PlayerError::Disconnected) => {}
            Err(PlayerError::Io(err))
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::BrokenPipe
                        | io::ErrorKind::ConnectionReset
                ) => {}
            Err(err) => return Err(err),
        }
        if let Some(mut child) = self.child.take() {
            let status = reap(&mut child, RESPONSE_TIMEOUT)?;
            log::info!("player exited with {status}");
        }
        Ok(())
    }
}

/// Wait up to `grace` for `child` to exit on its own, then kill it.
fn reap(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            log::warn!("player ignored quit, killing pid {}", child.id());
            child.kill()?;
            return child.wait();
        }
        thread::sleep(REAP_INTERVAL);
    }
}

/// Trimmed answer lines, minus blanks and asynchronous notices.
fn response_lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Trying to add"))
        .filter(|line| !line.starts_with("status change:"))
        .map(str::to_string)
        .collect()
}
