//! minitel-media: the outside world the Minitel front end talks to.
//!
//! Everything here is reached through a narrow trait so the screens can be
//! driven by something other than the real programs:
//!
//! - [`MediaSearch`] / [`MediaFetch`]: find and download videos
//!   ([`YtDlp`] runs `yt-dlp`).
//! - [`Player`]: playback control ([`VlcController`] speaks VLC's `oldrc`
//!   protocol over a Unix socket).
//! - [`Remote`]: infrared keys for the VCR ([`IrSend`] runs LIRC's `irsend`).

pub mod clock;
pub mod player;
pub mod remote;
pub mod search;
pub mod ytdlp;

pub use clock::{format_clock, format_remaining, parse_clock};
pub use player::{Player, PlayerError, VlcController};
pub use remote::{IrSend, Remote, KEY_RECORD, KEY_STOP};
pub use search::{MediaEntry, MediaError, MediaFetch, MediaSearch};
pub use ytdlp::YtDlp;
