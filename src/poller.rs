use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::lastfm;
use crate::types::NowPlaying;

const MAX_RETRIES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Failures while polling the metadata endpoint. Transport errors are
/// transient and worth retrying; a bad status or a non-JSON body means
/// the endpoint answered and retrying this cycle won't help.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("metadata endpoint returned status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("metadata endpoint returned a non-JSON payload: {0}")]
    BadPayload(#[from] serde_json::Error),
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Retrieve the current track, retrying transient failures a bounded
/// number of times. `None` abandons this poll cycle; the render loop
/// tries again on its next iteration.
pub fn fetch_now_playing_with_retries(client: &Client, config: &Config) -> Option<NowPlaying> {
    for attempt in 1..=MAX_RETRIES {
        log::debug!("fetching now-playing data, attempt {attempt}/{MAX_RETRIES}");
        match poll_once(client, config) {
            Ok(now) => {
                log::debug!("now playing: {} by {}", now.title, now.artist);
                return Some(now);
            }
            Err(e @ (PollError::BadStatus(_) | PollError::BadPayload(_))) => {
                log::error!("{e}");
                return None;
            }
            Err(e) => {
                log::warn!("poll attempt {attempt} failed: {e}");
                thread::sleep(RETRY_DELAY);
            }
        }
    }

    log::warn!("failed to fetch now-playing data after {MAX_RETRIES} retries");
    None
}

fn poll_once(client: &Client, config: &Config) -> Result<NowPlaying, PollError> {
    let url = if config.use_icecast {
        &config.icecast_url
    } else {
        &config.azuracast_url
    };

    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(PollError::BadStatus(response.status()));
    }
    let body = response.text()?;
    let data: Value = serde_json::from_str(&body)?;

    let mut now = if config.use_icecast {
        parse_icecast(&data)
    } else {
        parse_azuracast(&data)
    };

    // Icecast metadata carries no artwork URL; ask Last.fm when configured.
    if config.use_icecast
        && !config.lastfm_api_key.is_empty()
        && !now.artist.is_empty()
        && !now.title.is_empty()
    {
        now.artwork_url =
            lastfm::album_art_url(client, &now.artist, &now.title, &config.lastfm_api_key);
    }

    Ok(now)
}

/// Icecast reports a single `"Artist - Title"` string; split on the first
/// hyphen. Without a hyphen the whole string is the title.
fn parse_icecast(data: &Value) -> NowPlaying {
    let full_title = data["icestats"]["source"]["title"].as_str().unwrap_or("");

    match full_title.split_once('-') {
        Some((artist, title)) => NowPlaying::new(artist.trim(), title.trim()),
        None => NowPlaying::new("", full_title),
    }
}

/// Azuracast reports structured song metadata; the title is cut at the
/// first `(` so parenthetical remix/edit suffixes don't reach the slide.
fn parse_azuracast(data: &Value) -> NowPlaying {
    let song = &data["now_playing"]["song"];

    let title = song["title"]
        .as_str()
        .unwrap_or("")
        .split('(')
        .next()
        .unwrap_or("")
        .trim();
    let mut now = NowPlaying::new(song["artist"].as_str().unwrap_or(""), title);
    now.artwork_url = song["art"].as_str().map(str::to_string);
    now
}
