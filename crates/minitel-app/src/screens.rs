//! The 3615 YouTube screens: search, pick a result, tape it.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use minitel_link::{InputField, LinkError, ProgressBar, TerminalLink, UpdatableText};
use minitel_media::{
    format_remaining, MediaEntry, MediaFetch, MediaSearch, Player, PlayerError, Remote,
    KEY_RECORD, KEY_STOP,
};
use minitel_vt::attr::{CharSize, Color};
use minitel_vt::codec::{self, DEFAULT_PLACEHOLDER};

use crate::config::Config;
use crate::images;

pub const SCREEN_WIDTH: usize = 40;
/// Three rows of the query line, minus the label in front of it.
pub const QUERY_LEN: usize = SCREEN_WIDTH * 3 - 12;

const TITLE_LEN: usize = 37;
const CHANNEL_LEN: usize = 20;
const RECORD_TITLE_LEN: usize = 80;
const RECORD_CHANNEL_LEN: usize = 35;
const MESSAGE_ROW: u8 = 24;

/// Errors that end the session.
#[derive(Debug)]
pub enum AppError {
    Link(LinkError),
    Player(PlayerError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Link(err) => write!(f, "terminal: {err}"),
            AppError::Player(err) => write!(f, "player: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Link(err) => Some(err),
            AppError::Player(err) => Some(err),
        }
    }
}

impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        AppError::Link(err)
    }
}

impl From<PlayerError> for AppError {
    fn from(err: PlayerError) -> Self {
        AppError::Player(err)
    }
}

/// Timings and assets for the screens.
#[derive(Debug, Clone)]
pub struct ScreenSettings {
    pub max_results: usize,
    pub logo_image: PathBuf,
    pub tape_image: PathBuf,
    /// Wait between the record key and starting playback.
    pub record_delay: Duration,
    /// How long error messages stay up.
    pub message_delay: Duration,
    /// Interval between playback progress polls.
    pub poll_interval: Duration,
}

impl ScreenSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_results: config.max_results.clamp(1, 7),
            logo_image: config.logo_image.clone(),
            tape_image: config.tape_image.clone(),
            record_delay: Duration::from_secs(config.record_delay_secs),
            message_delay: Duration::from_secs(3),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug)]
enum Screen {
    Search,
    Results(String),
    Record(MediaEntry),
    Quit,
}

/// The front end, borrowing the terminal and every outside service.
pub struct Frontend<'a> {
    pub link: &'a mut TerminalLink,
    pub search: &'a dyn MediaSearch,
    pub fetch: &'a dyn MediaFetch,
    pub player: &'a mut dyn Player,
    pub remote: &'a dyn Remote,
    pub settings: ScreenSettings,
}

impl Frontend<'_> {
    /// Run screens until the user hangs up on the search screen.
    pub fn run(&mut self) -> Result<(), AppError> {
        let mut screen = Screen::Search;
        loop {
            log::debug!("showing {screen:?}");
            screen = match screen {
                Screen::Search => match self.search_screen()? {
                    Some(query) => Screen::Results(query),
                    None => Screen::Quit,
                },
                Screen::Results(query) => match self.results_screen(&query)? {
                    Some(entry) => Screen::Record(entry),
                    None => Screen::Search,
                },
                Screen::Record(entry) => {
                    self.record_screen(&entry)?;
                    Screen::Search
                }
                Screen::Quit => return Ok(()),
            };
        }
    }

    /// Logo, title and keyword field. `None` when the user leaves.
    fn search_screen(&mut self) -> Result<Option<String>, AppError> {
        self.link.clear_screen()?;
        self.link.cursor_visible(false)?;
        let logo = self.settings.logo_image.clone();
        self.draw_image(&logo, (10, 6))?;

        self.link.move_cursor(9, 19)?;
        self.link.set_char_size(CharSize::DoubleSize)?;
        self.link.write_text("3615-YouTube")?;
        self.link.move_cursor(1, 20)?;
        self.link.write_text("Mots-clés : ")?;

        loop {
            self.link.move_cursor(13, 20)?;
            let (query, terminator) = InputField::new(QUERY_LEN).read(self.link)?;
            if terminator.is_abort() {
                log::info!("leaving on {terminator:?}");
                return Ok(None);
            }
            if !query.trim().is_empty() {
                return Ok(Some(query));
            }
        }
    }

    /// Numbered results and a one-key choice. `None` goes back to search.
    fn results_screen(&mut self, query: &str) -> Result<Option<MediaEntry>, AppError> {
        self.link.clear_screen()?;
        self.link.cursor_visible(false)?;
        self.link.inverse(true)?;
        self.link.write_text(&clip(&format!("Recherche: {query}"), QUERY_LEN))?;
        self.link.move_cursor(1, 2)?;
        self.link.set_foreground(Color::Green)?;
        self.link.write_text(&"_".repeat(SCREEN_WIDTH))?;

        log::info!("searching for {query:?}");
        let entries = match self.search.search(query, self.settings.max_results) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("search failed: {err}");
                self.flash("Recherche impossible")?;
                return Ok(None);
            }
        };
        if entries.is_empty() {
            self.flash("Aucun résultat")?;
            return Ok(None);
        }

        for (i, entry) in entries.iter().enumerate() {
            let row = 2 + (i as u8) * 3;
            self.link.move_cursor(1, row)?;
            self.link.write_text(&"_".repeat(SCREEN_WIDTH))?;
            self.link.move_cursor(1, row + 1)?;
            self.link.inverse(true)?;
            self.link.write_text(&(i + 1).to_string())?;
            self.link.move_cursor(3, row + 1)?;
            self.link.write_text(&clip(&entry.title, TITLE_LEN))?;
            self.link.move_cursor(3, row + 2)?;
            self.link.set_foreground(Color::Magenta)?;
            self.link.write_text(&clip(&entry.channel, CHANNEL_LEN))?;
            self.link.write_text(&format!(" ({})", clip(&entry.duration_label(), 10)))?;
        }

        let prompt = format!("Entrez votre choix (1 à {}) ", entries.len());
        loop {
            self.link.move_cursor(1, MESSAGE_ROW)?;
            self.link.write_text(&prompt)?;
            let (choice, terminator) = InputField::new(1).read(self.link)?;
            if terminator.is_abort() {
                return Ok(None);
            }
            if choice.is_empty() {
                continue;
            }
            match parse_choice(&choice, entries.len()) {
                Some(index) => return Ok(entries.into_iter().nth(index)),
                None => self.flash("Entrée invalide")?,
            }
        }
    }

    /// Download the entry, then play it while the VCR records.
    fn record_screen(&mut self, entry: &MediaEntry) -> Result<(), AppError> {
        self.link.clear_screen()?;
        self.link.cursor_visible(false)?;
        self.link.write_text(&clip(&entry.title, RECORD_TITLE_LEN))?;
        self.link.write_text("\n\r")?;
        self.link.set_foreground(Color::Magenta)?;
        self.link.write_text(&clip(&entry.channel, RECORD_CHANNEL_LEN))?;
        let tape = self.settings.tape_image.clone();
        self.draw_image(&tape, (9, 6))?;

        self.link.move_cursor(1, 18)?;
        self.link.write_text("Téléchargement : ")?;
        let download_bar = ProgressBar::new(18, 18, 12);
        let download_percent = UpdatableText::new(32, 18, 8);

        let Some(path) = self.download(entry, download_bar, download_percent)? else {
            return Ok(());
        };
        let recorded = self.record(entry, &path);
        remove_download(&path);
        recorded
    }

    /// Play the downloaded file with the VCR recording.
    fn record(&mut self, entry: &MediaEntry, path: &Path) -> Result<(), AppError> {
        self.player.add(path)?;
        self.player.stop()?;
        self.link.move_cursor(1, 19)?;
        self.link.write_text("Enregistrement : ")?;
        let record_bar = ProgressBar::new(18, 19, 12);
        let remaining = UpdatableText::new(32, 19, 8);

        log::info!("recording {}", entry.title);
        self.remote.send(KEY_RECORD);
        thread::sleep(self.settings.record_delay);
        let playback = self.follow_playback(entry, record_bar, remaining);
        self.remote.send(KEY_STOP);
        log::info!("recording stopped");
        playback
    }

    fn download(
        &mut self,
        entry: &MediaEntry,
        bar: ProgressBar,
        percent: UpdatableText,
    ) -> Result<Option<PathBuf>, AppError> {
        let link = &mut *self.link;
        let mut failure: Option<LinkError> = None;
        let mut on_progress = |done: u64, total: u64| {
            if failure.is_some() || total == 0 {
                return;
            }
            let fraction = done as f64 / total as f64;
            let drawn = bar
                .update(link, fraction)
                .and_then(|()| percent.update(link, &format!("{:.2}%", fraction * 100.0)));
            if let Err(err) = drawn {
                failure = Some(err);
            }
        };
        let result = self.fetch.fetch(&entry.locator, &mut on_progress);
        if let Some(err) = failure {
            if let Ok(path) = &result {
                remove_download(path);
            }
            return Err(err.into());
        }

        match result {
            Ok(path) => Ok(Some(path)),
            Err(err) => {
                log::warn!("download of {} failed: {err}", entry.locator);
                self.flash("Echec du téléchargement")?;
                Ok(None)
            }
        }
    }

    /// Poll the player until playback is over and at least half the
    /// expected duration has passed.
    fn follow_playback(
        &mut self,
        entry: &MediaEntry,
        bar: ProgressBar,
        remaining: UpdatableText,
    ) -> Result<(), AppError> {
        self.player.play()?;
        let started = Instant::now();
        let minimum = Duration::from_secs(entry.duration.unwrap_or(0)) / 2;

        while self.player.is_playing()? || started.elapsed() < minimum {
            let (elapsed, length) = self.player.progress()?;
            if length > 0 {
                bar.update(self.link, elapsed as f64 / length as f64)?;
                remaining.update(self.link, &format_remaining(length.saturating_sub(elapsed)))?;
            }
            thread::sleep(self.settings.poll_interval);
        }
        Ok(())
    }

    /// Show a message on the bottom row for a while.
    fn flash(&mut self, message: &str) -> Result<(), AppError> {
        self.link.move_cursor(1, MESSAGE_ROW)?;
        self.link.write_text(&format!("{message:<width$}", width = SCREEN_WIDTH))?;
        thread::sleep(self.settings.message_delay);
        Ok(())
    }

    /// Artwork is decoration: a picture that fails to load is skipped.
    fn draw_image(&mut self, path: &Path, origin: (u8, u8)) -> Result<(), AppError> {
        match images::mosaic_from_file(path, origin) {
            Ok(bytes) => self.link.write_bytes(&bytes)?,
            Err(err) => log::warn!("not drawing {}: {err}", path.display()),
        }
        Ok(())
    }
}

fn remove_download(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        log::warn!("failed to remove {}: {err}", path.display());
    }
}

/// First `max` characters of `text`, made displayable.
fn clip(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    codec::sanitize(&head, DEFAULT_PLACEHOLDER)
}

/// A typed digit `1..=count` as a zero-based index.
fn parse_choice(choice: &str, count: usize) -> Option<usize> {
    let number: usize = choice.trim().parse().ok()?;
    (1..=count).contains(&number).then(|| number - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};
    use std::sync::{Arc, Mutex};

    use minitel_link::{BaudRate, LinkPort};
    use minitel_media::MediaError;

    const SEND: &[u8] = &[0x13, 0x41];
    const BACK: &[u8] = &[0x13, 0x42];
    const HANGUP: &[u8] = &[0x13, 0x59];

    #[derive(Default)]
    struct Wire {
        input: VecDeque<u8>,
        output: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct FakePort(Arc<Mutex<Wire>>);

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut wire = self.0.lock().unwrap();
            let n = buf.len().min(wire.input.len());
            for (slot, byte) in buf.iter_mut().zip(wire.input.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LinkPort for FakePort {
        fn set_baud_rate(&mut self, _rate: BaudRate) -> io::Result<()> {
            Ok(())
        }

        fn discard_input(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FakeSearch {
        entries: Vec<MediaEntry>,
        queries: RefCell<Vec<String>>,
    }

    impl MediaSearch for FakeSearch {
        fn search(&self, query: &str, max_results: usize) -> Result<Vec<MediaEntry>, MediaError> {
            self.queries.borrow_mut().push(query.to_string());
            Ok(self.entries.iter().take(max_results).cloned().collect())
        }
    }

    struct FakeFetch {
        path: PathBuf,
        fetched: RefCell<Vec<String>>,
    }

    impl MediaFetch for FakeFetch {
        fn fetch(
            &self,
            locator: &str,
            progress: &mut dyn FnMut(u64, u64),
        ) -> Result<PathBuf, MediaError> {
            self.fetched.borrow_mut().push(locator.to_string());
            std::fs::write(&self.path, b"video")?;
            progress(50, 100);
            progress(100, 100);
            Ok(self.path.clone())
        }
    }

    #[derive(Default)]
    struct FakePlayer {
        calls: Vec<String>,
        playing_polls: usize,
        refuse_add: bool,
    }

    impl Player for FakePlayer {
        fn add(&mut self, path: &Path) -> Result<(), PlayerError> {
            self.calls.push(format!("add {}", path.display()));
            if self.refuse_add {
                return Err(PlayerError::Disconnected);
            }
            Ok(())
        }

        fn play(&mut self) -> Result<(), PlayerError> {
            self.calls.push("play".to_string());
            Ok(())
        }

        fn stop(&mut self) -> Result<(), PlayerError> {
            self.calls.push("stop".to_string());
            Ok(())
        }

        fn time(&mut self) -> Result<u64, PlayerError> {
            Ok(30)
        }

        fn length(&mut self) -> Result<u64, PlayerError> {
            Ok(90)
        }

        fn is_playing(&mut self) -> Result<bool, PlayerError> {
            if self.playing_polls == 0 {
                return Ok(false);
            }
            self.playing_polls -= 1;
            Ok(true)
        }

        fn quit(&mut self) -> Result<(), PlayerError> {
            self.calls.push("quit".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRemote {
        keys: RefCell<Vec<String>>,
    }

    impl Remote for FakeRemote {
        fn send(&self, key: &str) {
            self.keys.borrow_mut().push(key.to_string());
        }
    }

    fn entry(n: u32) -> MediaEntry {
        MediaEntry {
            title: format!("Vidéo n°{n}"),
            channel: "Chaîne ~ officielle".to_string(),
            duration: Some(0),
            locator: format!("https://www.youtube.com/watch?v={n}"),
        }
    }

    struct Harness {
        port: FakePort,
        search: FakeSearch,
        fetch: FakeFetch,
        player: FakePlayer,
        remote: FakeRemote,
    }

    impl Harness {
        fn new(name: &str, input: &[&[u8]]) -> Self {
            let port = FakePort::default();
            port.0.lock().unwrap().input.extend(input.concat());
            let path = std::env::temp_dir()
                .join(format!("minitube-{name}-{}.mp4", std::process::id()));
            Self {
                port,
                search: FakeSearch {
                    entries: (1..=3).map(entry).collect(),
                    queries: RefCell::new(Vec::new()),
                },
                fetch: FakeFetch {
                    path,
                    fetched: RefCell::new(Vec::new()),
                },
                player: FakePlayer {
                    playing_polls: 2,
                    ..FakePlayer::default()
                },
                remote: FakeRemote::default(),
            }
        }

        fn run(&mut self) -> Result<(), AppError> {
            let mut link = TerminalLink::with_port(Box::new(self.port.clone()), BaudRate::B4800);
            let mut frontend = Frontend {
                link: &mut link,
                search: &self.search,
                fetch: &self.fetch,
                player: &mut self.player,
                remote: &self.remote,
                settings: ScreenSettings {
                    max_results: 7,
                    logo_image: PathBuf::from("/nonexistent/logo.png"),
                    tape_image: PathBuf::from("/nonexistent/vhs.png"),
                    record_delay: Duration::ZERO,
                    message_delay: Duration::ZERO,
                    poll_interval: Duration::ZERO,
                },
            };
            frontend.run()
        }

        fn output(&self) -> Vec<u8> {
            self.port.0.lock().unwrap().output.clone()
        }

        fn shows(&self, text: &str) -> bool {
            let needle = codec::encode(text).unwrap();
            self.output().windows(needle.len()).any(|w| w == needle.as_slice())
        }
    }

    #[test]
    fn test_hangup_on_search_quits() {
        let mut harness = Harness::new("hangup", &[HANGUP]);
        harness.run().unwrap();
        assert!(harness.search.queries.borrow().is_empty());
        assert!(harness.shows("Mots-clés : "));
        assert!(harness.shows("3615-YouTube"));
    }

    #[test]
    fn test_empty_query_asks_again() {
        let mut harness = Harness::new("empty", &[SEND, b"  ", SEND, BACK]);
        harness.run().unwrap();
        assert!(harness.search.queries.borrow().is_empty());
    }

    #[test]
    fn test_back_on_results_returns_to_search() {
        let mut harness = Harness::new("back", &[b"minitel", SEND, BACK, HANGUP]);
        harness.run().unwrap();
        assert_eq!(*harness.search.queries.borrow(), vec!["minitel".to_string()]);
        assert!(harness.fetch.fetched.borrow().is_empty());
        assert!(harness.shows("Recherche: minitel"));
        assert!(harness.shows("Entrez votre choix (1 à 3) "));
        // '~' is not displayable and is replaced.
        assert!(harness.shows("Cha\u{ee}ne _ offi"));
    }

    #[test]
    fn test_invalid_choice_is_reported() {
        let mut harness = Harness::new("invalid", &[b"minitel", SEND, b"9", SEND, BACK, HANGUP]);
        harness.run().unwrap();
        assert!(harness.shows("Entrée invalide"));
        assert!(harness.fetch.fetched.borrow().is_empty());
    }

    #[test]
    fn test_full_recording() {
        let mut harness = Harness::new("record", &[b"minitel", SEND, b"2", SEND, HANGUP]);
        harness.run().unwrap();

        let path = harness.fetch.path.clone();
        assert_eq!(
            *harness.fetch.fetched.borrow(),
            vec!["https://www.youtube.com/watch?v=2".to_string()]
        );
        assert_eq!(
            harness.player.calls,
            vec![format!("add {}", path.display()), "stop".to_string(), "play".to_string()]
        );
        assert_eq!(
            *harness.remote.keys.borrow(),
            vec![KEY_RECORD.to_string(), KEY_STOP.to_string()]
        );
        assert!(!path.exists(), "downloaded file should be removed");
        assert!(harness.shows("Téléchargement : "));
        assert!(harness.shows("100.00% "));
        assert!(harness.shows("Enregistrement : "));
        assert!(harness.shows("1:00"));
    }

    #[test]
    fn test_player_failure_still_removes_download() {
        let mut harness = Harness::new("refused", &[b"minitel", SEND, b"1", SEND, HANGUP]);
        harness.player.refuse_add = true;
        let err = harness.run().unwrap_err();

        assert!(matches!(err, AppError::Player(PlayerError::Disconnected)));
        assert_eq!(harness.fetch.fetched.borrow().len(), 1);
        assert!(!harness.fetch.path.exists(), "downloaded file should be removed");
        assert!(harness.remote.keys.borrow().is_empty());
    }

    #[test]
    fn test_input_ending_mid_session_is_an_error() {
        let mut harness = Harness::new("eof", &[b"mini"]);
        let err = harness.run().unwrap_err();
        assert!(matches!(err, AppError::Link(LinkError::Io(_))));
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 7), Some(0));
        assert_eq!(parse_choice("7", 7), Some(6));
        assert_eq!(parse_choice("7", 3), None);
        assert_eq!(parse_choice("0", 7), None);
        assert_eq!(parse_choice("a", 7), None);
    }

    #[test]
    fn test_clip_counts_characters() {
        assert_eq!(clip("éèàçù", 3), "éèà");
        assert_eq!(clip("a~b", 5), "a_b");
    }
}
