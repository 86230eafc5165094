//! In-memory port for exercising the link without a terminal attached.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::link::{BaudRate, LinkPort, TerminalLink};

#[derive(Default)]
struct MockState {
    input: VecDeque<u8>,
    output: Vec<u8>,
    flushed: usize,
    flushes: usize,
    speeds: Vec<BaudRate>,
    discards: usize,
}

/// Scripted keyboard input, captured screen output.
///
/// Clones share state, so a test keeps one handle while the link owns
/// another. Discarding input is only counted: the scripted bytes stand for
/// keys typed after the discard.
#[derive(Clone, Default)]
pub(crate) struct MockPort {
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_input(bytes: &[u8]) -> Self {
        let port = Self::new();
        port.state().input.extend(bytes);
        port
    }

    /// A link at 1200 bit/s over this port.
    pub(crate) fn link(&self) -> TerminalLink {
        TerminalLink::with_port(Box::new(self.clone()), BaudRate::B1200)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn output(&self) -> Vec<u8> {
        self.state().output.clone()
    }

    pub(crate) fn take_output(&self) -> Vec<u8> {
        let mut state = self.state();
        state.flushed = 0;
        std::mem::take(&mut state.output)
    }

    pub(crate) fn flushes(&self) -> usize {
        self.state().flushes
    }

    /// Bytes written since the last flush.
    pub(crate) fn unflushed(&self) -> usize {
        let state = self.state();
        state.output.len() - state.flushed
    }

    pub(crate) fn speeds(&self) -> Vec<BaudRate> {
        self.state().speeds.clone()
    }

    pub(crate) fn discards(&self) -> usize {
        self.state().discards
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        let n = buf.len().min(state.input.len());
        for (slot, byte) in buf.iter_mut().zip(state.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state();
        let len = state.output.len();
        state.flushed = len;
        state.flushes += 1;
        Ok(())
    }
}

impl LinkPort for MockPort {
    fn set_baud_rate(&mut self, rate: BaudRate) -> io::Result<()> {
        self.state().speeds.push(rate);
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.state().discards += 1;
        Ok(())
    }
}
