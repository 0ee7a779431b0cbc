//! Shared test fixtures.

use ab_glyph::FontVec;

/// Text fitting and compositing tests need real glyph metrics; use a
/// system font when one is around and skip quietly otherwise.
pub fn test_font() -> Option<FontVec> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];
    for path in CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }
    eprintln!("no system font found, skipping");
    None
}
