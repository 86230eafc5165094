//! minitel-link: the serial connection to a Minitel and everything that
//! needs one.
//!
//! This crate owns the device. It turns the byte-level vocabulary of
//! `minitel-vt` into operations on a live terminal and runs the interactive
//! pieces that depend on reading keys back.
//!
//! # Architecture
//!
//! - [`SerialPort`]: tty configuration (7E1, raw, blocking) via termios.
//! - [`TerminalLink`]: cursor, screen and speed commands, text output and
//!   key input over any [`LinkPort`].
//! - [`InputField`]: a bounded, remotely drawn input field.
//! - [`ProgressBar`] / [`UpdatableText`]: widgets redrawn in place.

pub mod editor;
pub mod elements;
pub mod link;
pub mod serial;

#[cfg(test)]
mod testing;

pub use editor::{InputField, Terminator};
pub use elements::{ProgressBar, UpdatableText};
pub use link::{BaudRate, LinkError, LinkPort, TerminalLink};
pub use serial::SerialPort;
