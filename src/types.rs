/// Track metadata reported by the stream, as consumed by the renderer.
///
/// Produced once per poll and never mutated; the render loop compares
/// `title` against the previously rendered title to decide whether a new
/// slide is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub artist: String,
    pub title: String,
    pub artwork_url: Option<String>,
}

impl NowPlaying {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            artwork_url: None,
        }
    }
}
