mod artwork;
mod compositor;
mod config;
mod lastfm;
mod poller;
#[cfg(test)]
mod testutil;
mod text;
mod types;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use ab_glyph::FontVec;
use anyhow::{Context, Result};
use clap::Parser;
use image::RgbaImage;
use reqwest::blocking::Client;

use crate::config::Config;

/// Sleep applied after every cycle, successful or not. Slow renders push
/// the next poll back rather than piling up.
const POLL_INTERVAL: Duration = Duration::from_secs(10);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "slidecast", about = "Renders a now-playing slide for a radio stream")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "slidecast.toml")]
    config: PathBuf,
}

struct App {
    config: Config,
    client: Client,
    font: FontVec,
    fallback_logo: Option<RgbaImage>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    // The base font is the one asset the renderer cannot work without.
    let font_bytes = std::fs::read(&config.font)
        .with_context(|| format!("failed to read font {}", config.font.display()))?;
    let font = FontVec::try_from_vec(font_bytes)
        .with_context(|| format!("failed to parse font {}", config.font.display()))?;
    log::info!("font loaded from {}", config.font.display());

    let fallback_logo = artwork::load_fallback_logo(&config.logo);

    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    ctrlc::set_handler(|| {
        log::info!("received interrupt, shutting down");
        std::process::exit(0);
    })
    .context("failed to set interrupt handler")?;

    let app = App {
        config,
        client,
        font,
        fallback_logo,
    };

    log::info!("starting render loop");
    let mut last_title = String::new();
    loop {
        match render_cycle(&app, &last_title) {
            Ok(Some(title)) => last_title = title,
            Ok(None) => {}
            Err(e) => log::error!("render cycle failed: {e:#}"),
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// One poll/render cycle. Returns the new track title when a slide was
/// written, `None` when nothing changed or the poll came up empty.
fn render_cycle(app: &App, last_title: &str) -> Result<Option<String>> {
    let Some(now) = poller::fetch_now_playing_with_retries(&app.client, &app.config) else {
        return Ok(None);
    };

    if now.title.is_empty() || now.title == last_title {
        log::debug!("track unchanged, skipping render");
        return Ok(None);
    }
    log::info!("now playing: {} by {}", now.title, now.artist);

    let art = artwork::resolve_artwork(
        &app.client,
        now.artwork_url.as_deref(),
        app.fallback_logo.as_ref(),
    );
    let logo = artwork::load_logo_block(&app.config.logo);

    let slide = compositor::composite(&now, art.as_ref(), logo.as_ref(), &app.font);
    compositor::save_output(slide, &app.config.output_image)?;
    log::info!("slide written to {}", app.config.output_image.display());

    Ok(Some(now.title))
}
