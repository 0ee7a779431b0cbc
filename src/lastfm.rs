//! Album-art lookup against the Last.fm track.getInfo API, used when the
//! Icecast backend is active (Icecast metadata carries no artwork URL).

use reqwest::blocking::Client;
use serde_json::Value;

const API_URL: &str = "http://ws.audioscrobbler.com/2.0/";

// Last.fm serves this image hash when it has no artwork for a track.
const NO_ART_SENTINEL: &str = "2a96cbd8b46e442fc41c2b86b821562f";

/// Look up an album-art URL for a track. Any API or transport failure is
/// logged and reported as "no artwork known".
pub fn album_art_url(
    client: &Client,
    artist: &str,
    title: &str,
    api_key: &str,
) -> Option<String> {
    if artist.is_empty() || title.is_empty() || api_key.is_empty() {
        log::debug!("skipping Last.fm lookup: missing artist, title or API key");
        return None;
    }

    log::debug!("Last.fm lookup for {artist} - {title}");
    let response = client
        .get(API_URL)
        .query(&[
            ("method", "track.getInfo"),
            ("api_key", api_key),
            ("artist", artist),
            ("track", title),
            ("format", "json"),
            ("autocorrect", "1"),
        ])
        .send();

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Last.fm request failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        log::warn!("Last.fm returned status {}", response.status());
        return None;
    }

    let data: Value = match response.json() {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Last.fm returned invalid JSON: {e}");
            return None;
        }
    };
    extract_art_url(&data)
}

/// Pick the best usable image URL from a track.getInfo response: the
/// first "extralarge" entry, falling back to "large", skipping empty
/// URLs and the known "no artwork" placeholder.
fn extract_art_url(data: &Value) -> Option<String> {
    if !data["error"].is_null() {
        log::debug!(
            "Last.fm API error: {}",
            data["message"].as_str().unwrap_or("unknown error")
        );
        return None;
    }

    let images = data["track"]["album"]["image"].as_array()?;
    for wanted in ["extralarge", "large"] {
        let url = images
            .iter()
            .filter(|image| image["size"].as_str() == Some(wanted))
            .find_map(|image| {
                image["#text"]
                    .as_str()
                    .filter(|url| !url.is_empty() && !url.ends_with(NO_ART_SENTINEL))
            });
        if let Some(url) = url {
            log::debug!("Last.fm album art URL found ({wanted}): {url}");
            return Some(url.to_string());
        }
    }

    log::debug!("Last.fm found the track but no usable album art");
    None
}
