use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;
use reqwest::blocking::Client;

use crate::compositor::LOGO_BLOCK_SIZE;

/// Fetch and decode remote album art. Every failure mode logs and yields
/// `None`; a missing cover must never take the renderer down.
pub fn fetch_album_art(client: &Client, url: &str) -> Option<RgbaImage> {
    log::debug!("fetching album art from {url}");

    let response = match client.get(url).send() {
        Ok(response) => response,
        Err(e) => {
            log::warn!("album art request failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        log::warn!("album art fetch returned status {}", response.status());
        return None;
    }

    let bytes = match response.bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("failed to read album art response: {e}");
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(art) => Some(art.to_rgba8()),
        Err(e) => {
            log::warn!("failed to decode album art: {e}");
            None
        }
    }
}

/// Resolve the raster used for the background and thumbnail: the track's
/// artwork when a URL is known and fetchable, otherwise a copy of the
/// station logo. `None` means the caller renders a plain dark background.
pub fn resolve_artwork(
    client: &Client,
    url: Option<&str>,
    fallback: Option<&RgbaImage>,
) -> Option<RgbaImage> {
    let fetched = url
        .filter(|url| !url.is_empty())
        .and_then(|url| fetch_album_art(client, url));

    if fetched.is_some() {
        return fetched;
    }
    match fallback {
        Some(logo) => {
            log::debug!("using station logo as album art");
            Some(logo.clone())
        }
        None => {
            log::debug!("no album art and no fallback logo available");
            None
        }
    }
}

/// Full-resolution logo loaded once at startup, shared read-only across
/// renders as the artwork fallback.
pub fn load_fallback_logo(path: &Path) -> Option<RgbaImage> {
    match image::open(path) {
        Ok(logo) => {
            log::info!("fallback logo loaded from {}", path.display());
            Some(logo.to_rgba8())
        }
        Err(e) => {
            log::warn!("could not load logo for fallback use: {e}");
            None
        }
    }
}

/// Logo sized for the bottom bar. Re-read on every render so a replaced
/// logo file is picked up without a restart.
pub fn load_logo_block(path: &Path) -> Option<RgbaImage> {
    if !path.exists() {
        log::debug!("logo file not found at {}", path.display());
        return None;
    }
    match image::open(path) {
        Ok(logo) => Some(image::imageops::resize(
            &logo.to_rgba8(),
            LOGO_BLOCK_SIZE,
            LOGO_BLOCK_SIZE,
            FilterType::Lanczos3,
        )),
        Err(e) => {
            log::debug!("error loading logo: {e}");
            None
        }
    }
}
