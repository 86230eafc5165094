//! `minitube`: the 3615 YouTube service on a Minitel.

mod config;
mod images;
mod screens;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use minitel_link::{BaudRate, TerminalLink};
use minitel_media::{IrSend, Player, VlcController, YtDlp};

use config::Config;
use screens::{Frontend, ScreenSettings};

#[derive(Parser, Debug)]
#[command(name = "minitube")]
#[command(about = "3615 YouTube: search and tape videos from a Minitel")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MINITUBE_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device, overriding the configuration
    #[arg(long)]
    port: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config);
    if let Some(port) = cli.port {
        config.port = port;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("minitube: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let initial = BaudRate::try_from(config.initial_baud_rate)?;
    let mut link = TerminalLink::open(&config.port, initial)?;
    if config.baud_rate != config.initial_baud_rate {
        link.set_baud_rate(config.baud_rate)?;
    }
    link.local_echo(false)?;
    log::info!("Connected to Minitel on {}", config.port.display());

    let mut player = VlcController::spawn(&config.player_command, &config.player_socket)?;
    let ytdlp = YtDlp::new(&config.ytdlp_command)
        .with_format(&config.video_format)
        .with_download_dir(&config.download_dir);
    let remote = IrSend::new(&config.ir_remote);

    let outcome = Frontend {
        link: &mut link,
        search: &ytdlp,
        fetch: &ytdlp,
        player: &mut player,
        remote: &remote,
        settings: ScreenSettings::from_config(config),
    }
    .run();

    // Leave the terminal blank and the player gone even after a failure.
    let cleared = link.clear_screen().and_then(|()| link.close());
    if let Err(e) = player.quit() {
        log::warn!("Failed to quit player: {e}");
    }
    outcome?;
    cleared?;
    Ok(())
}
