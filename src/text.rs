use ab_glyph::{Font, PxScale};
use imageproc::drawing::text_size;

/// Starting point for the downward size scan.
pub const INITIAL_FONT_SIZE: u32 = 20;

const ELLIPSIS: &str = "...";

/// Pixel width of `text` at `size`, measured with the same glyph layout
/// the drawing routines use. An empty string trivially measures zero.
pub fn line_width(font: &impl Font, size: u32, text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let (width, _) = text_size(PxScale::from(size as f32), font, text);
    width as u32
}

/// Largest size at which both the artist and title lines fit `max_width`.
///
/// Each line is fitted independently from [`INITIAL_FONT_SIZE`] down to 1,
/// and the smaller of the two results is used so both lines render at a
/// consistent size.
pub fn fit_uniform_font_size(
    font: &impl Font,
    artist: &str,
    title: &str,
    max_width: u32,
) -> u32 {
    let artist_size = fit_line(|size, text| line_width(font, size, text), artist, max_width);
    let title_size = fit_line(|size, text| line_width(font, size, text), title, max_width);
    artist_size.min(title_size)
}

/// Cut `text` down until it fits `max_width` at `size`, marking the cut
/// with an ellipsis. Applied after the uniform size is chosen, so a line
/// that still overflows by a few glyphs gets physically shortened.
pub fn truncate_with_ellipsis(font: &impl Font, size: u32, text: &str, max_width: u32) -> String {
    truncate_line(|text| line_width(font, size, text), text, max_width)
}

fn fit_line(mut width_at: impl FnMut(u32, &str) -> u32, text: &str, max_width: u32) -> u32 {
    let mut size = INITIAL_FONT_SIZE;
    while width_at(size, text) > max_width && size > 1 {
        size -= 1;
    }
    size
}

// Drops the last four characters and appends "..." per round, so after
// the first round each pass shortens the kept prefix by one character.
// The guard keeps pathological inputs from shrinking below "xxx...".
fn truncate_line(mut width_of: impl FnMut(&str) -> u32, text: &str, max_width: u32) -> String {
    let original_len = text.chars().count();
    let mut current = text.to_string();

    while width_of(&current) > max_width && current.chars().count() > 3 {
        let kept = current.chars().count() - 4;
        current = current.chars().take(kept).collect::<String>() + ELLIPSIS;

        if current.chars().count() <= 3 && original_len > 3 {
            current = text.chars().take(3).collect::<String>() + ELLIPSIS;
            break;
        }
    }

    current
}
