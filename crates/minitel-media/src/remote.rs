//! Infrared keys for the VCR through LIRC.

use std::process::{Command, Stdio};

/// Start recording on the VCR.
pub const KEY_RECORD: &str = "KEY_RECORD";
/// Stop the VCR.
pub const KEY_STOP: &str = "KEY_STOP";

/// An infrared remote control. Sending is fire-and-forget: there is no way
/// to know whether the device saw the key.
pub trait Remote {
    fn send(&self, key: &str);
}

/// Sends keys through LIRC's `irsend`.
#[derive(Debug, Clone)]
pub struct IrSend {
    program: String,
    remote: String,
}

impl IrSend {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            program: "irsend".to_string(),
            remote: remote.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args<'a>(&'a self, key: &'a str) -> [&'a str; 3] {
        ["SEND_ONCE", &self.remote, key]
    }
}

impl Remote for IrSend {
    fn send(&self, key: &str) {
        let result = Command::new(&self.program)
            .args(self.args(key))
            .stdin(Stdio::null())
            .output();

        match result {
            Ok(output) if output.status.success() => {
                log::info!("sent {key} to {}", self.remote);
            }
            Ok(output) => log::warn!(
                "{} failed to send {key} ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(err) => log::warn!("failed to run {}: {err}", self.program),
        }
    }
}
