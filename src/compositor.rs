use std::fs;
use std::path::Path;

use ab_glyph::{Font, PxScale};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::text;
use crate::types::NowPlaying;

// Slide geometry. The 320x240 canvas is the DAB slideshow target size and
// is fixed for every render.
pub const CANVAS_WIDTH: u32 = 320;
pub const CANVAS_HEIGHT: u32 = 240;
pub const BAR_HEIGHT: u32 = 55;
pub const BAR_TOP: u32 = CANVAS_HEIGHT - BAR_HEIGHT;
pub const LOGO_BLOCK_SIZE: u32 = 55;

const THUMBNAIL_SIZE: u32 = 140;
const THUMBNAIL_BORDER: u32 = 2;
const TEXT_LEFT_PADDING: u32 = 10;
const TEXT_RIGHT_MARGIN: u32 = 5;
const ARTIST_Y_OFFSET: i32 = 19;
const TITLE_Y_OFFSET: i32 = 38;
const STROKE_WIDTH: i32 = 1;
const BLUR_SIGMA: f32 = 8.0;

const BAR_FILL: Rgba<u8> = Rgba([0, 0, 0, 180]);
const BORDER_FILL: Rgba<u8> = Rgba([55, 56, 52, 180]);
const TEXT_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STROKE_FILL: Rgba<u8> = Rgba([0, 0, 0, 150]);

/// Render the full slide. Deterministic in its inputs: the same track,
/// artwork, logo and font always produce the same pixels.
pub fn composite(
    now: &NowPlaying,
    artwork: Option<&RgbaImage>,
    logo: Option<&RgbaImage>,
    font: &impl Font,
) -> RgbaImage {
    let mut canvas =
        RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([0, 0, 0, 255]));

    if let Some(art) = artwork {
        let cover = cover_fit(art, CANVAS_WIDTH, CANVAS_HEIGHT);
        let background = imageproc::filter::gaussian_blur_f32(&cover, BLUR_SIGMA);
        imageops::replace(&mut canvas, &background, 0, 0);
    }

    draw_thumbnail(&mut canvas, artwork);
    imageops::overlay(&mut canvas, &bar_overlay(logo), 0, 0);
    draw_track_text(&mut canvas, now, font);

    canvas
}

/// Scale `art` so it fully covers `width`x`height` while preserving its
/// aspect ratio, center-cropping the overflow.
fn cover_fit(art: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let art_ratio = art.width() as f64 / art.height() as f64;
    let target_ratio = width as f64 / height as f64;

    if art_ratio > target_ratio {
        // Relatively wider: match the height, crop the sides.
        let new_width = ((height as f64 * art_ratio) as u32).max(width);
        let resized = imageops::resize(art, new_width, height, FilterType::Lanczos3);
        let left = (new_width - width) / 2;
        imageops::crop_imm(&resized, left, 0, width, height).to_image()
    } else {
        // Relatively taller: match the width, crop top and bottom.
        let new_height = ((width as f64 / art_ratio) as u32).max(height);
        let resized = imageops::resize(art, width, new_height, FilterType::Lanczos3);
        let top = (new_height - height) / 2;
        imageops::crop_imm(&resized, 0, top, width, height).to_image()
    }
}

/// Bordered 140x140 cover thumbnail, centered in the space above the bar.
/// The border is always drawn; without artwork it frames empty background.
fn draw_thumbnail(canvas: &mut RgbaImage, artwork: Option<&RgbaImage>) {
    let thumb_x = (CANVAS_WIDTH - THUMBNAIL_SIZE) / 2;
    let thumb_y = (BAR_TOP - THUMBNAIL_SIZE) / 2;

    let border = Rect::at(
        thumb_x as i32 - THUMBNAIL_BORDER as i32,
        thumb_y as i32 - THUMBNAIL_BORDER as i32,
    )
    .of_size(
        THUMBNAIL_SIZE + 2 * THUMBNAIL_BORDER,
        THUMBNAIL_SIZE + 2 * THUMBNAIL_BORDER,
    );
    draw_filled_rect_mut(canvas, border, BORDER_FILL);

    if let Some(art) = artwork {
        let thumbnail =
            imageops::resize(art, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
        imageops::overlay(canvas, &thumbnail, thumb_x as i64, thumb_y as i64);
    }
}

/// Translucent bottom strip with the station logo in its top-left corner,
/// built as a separate layer so strip and logo alpha-blend over whatever
/// sits beneath them.
fn bar_overlay(logo: Option<&RgbaImage>) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([0, 0, 0, 0]));

    let bar = Rect::at(0, BAR_TOP as i32).of_size(CANVAS_WIDTH, BAR_HEIGHT);
    draw_filled_rect_mut(&mut overlay, bar, BAR_FILL);

    if let Some(logo) = logo {
        imageops::overlay(&mut overlay, logo, 0, BAR_TOP as i64);
    }

    overlay
}

fn draw_track_text(canvas: &mut RgbaImage, now: &NowPlaying, font: &impl Font) {
    let left = LOGO_BLOCK_SIZE + TEXT_LEFT_PADDING;
    let max_width = CANVAS_WIDTH - TEXT_RIGHT_MARGIN - left;

    let artist = now.artist.to_uppercase();
    let size = text::fit_uniform_font_size(font, &artist, &now.title, max_width);
    let artist = text::truncate_with_ellipsis(font, size, &artist, max_width);
    let title = text::truncate_with_ellipsis(font, size, &now.title, max_width);

    draw_stroked_line(canvas, &artist, font, size, left as i32, BAR_TOP as i32 + ARTIST_Y_OFFSET);
    draw_stroked_line(canvas, &title, font, size, left as i32, BAR_TOP as i32 + TITLE_Y_OFFSET);
}

/// One line of white text with a thin dark outline, left-aligned at `x`
/// and vertically centered on `y_center`. Stroke and fill go onto their
/// own transparent layer first so the stroke's partial alpha composites
/// correctly over the artwork behind it.
fn draw_stroked_line(
    canvas: &mut RgbaImage,
    line: &str,
    font: &impl Font,
    size: u32,
    x: i32,
    y_center: i32,
) {
    if line.is_empty() {
        return;
    }

    let scale = PxScale::from(size as f32);
    let (_, line_height) = text_size(scale, font, line);
    let y = y_center - line_height as i32 / 2;

    let mut layer = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([0, 0, 0, 0]));
    for dx in -STROKE_WIDTH..=STROKE_WIDTH {
        for dy in -STROKE_WIDTH..=STROKE_WIDTH {
            if dx == 0 && dy == 0 {
                continue;
            }
            draw_text_mut(&mut layer, STROKE_FILL, x + dx, y + dy, scale, font, line);
        }
    }
    draw_text_mut(&mut layer, TEXT_FILL, x, y, scale, font, line);

    imageops::overlay(canvas, &layer, 0, 0);
}

/// Encode the slide to `path`, flattening to opaque RGB when the
/// extension names a format without alpha. The encode goes to a sibling
/// temp file renamed into place so readers never see a partial write.
pub fn save_output(image: RgbaImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("cannot infer image format for {}", path.display()))?;

    let tmp = path.with_extension("tmp");
    let encode_result = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .save_with_format(&tmp, format)
    } else {
        image.save_with_format(&tmp, format)
    };
    encode_result.with_context(|| format!("failed to encode {}", tmp.display()))?;

    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move slide into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_font;

    fn checkerboard(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgba([220, 40, 40, 255])
            } else {
                Rgba([40, 40, 220, 255])
            }
        })
    }

    #[test]
    fn cover_fit_always_matches_target_dimensions() {
        for (w, h) in [(50, 50), (4000, 1000), (100, 4000), (320, 240), (321, 241)] {
            let fitted = cover_fit(&checkerboard(w, h), CANVAS_WIDTH, CANVAS_HEIGHT);
            assert_eq!(fitted.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT), "source {w}x{h}");
        }
    }

    #[test]
    fn composite_output_is_always_canvas_sized() {
        let Some(font) = test_font() else { return };
        let now = NowPlaying::new("Daft Punk", "One More Time");

        for (w, h) in [(50, 50), (4000, 1000), (100, 4000)] {
            let art = checkerboard(w, h);
            let slide = composite(&now, Some(&art), None, &font);
            assert_eq!(slide.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT), "source {w}x{h}");
        }
    }

    #[test]
    fn composite_without_artwork_or_logo_still_renders() {
        let Some(font) = test_font() else { return };
        let now = NowPlaying::new("Daft Punk", "One More Time");

        let slide = composite(&now, None, None, &font);
        assert_eq!(slide.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        // Background outside bar, thumbnail frame and text stays black.
        assert_eq!(slide.get_pixel(2, 2), &Rgba([0, 0, 0, 255]));
        // The bar strip darkens the bottom rows but stays opaque.
        assert_eq!(slide.get_pixel(CANVAS_WIDTH - 1, CANVAS_HEIGHT - 1).0[3], 255);
    }

    #[test]
    fn composite_is_deterministic() {
        let Some(font) = test_font() else { return };
        let now = NowPlaying::new("Daft Punk", "Harder, Better, Faster, Stronger");
        let art = checkerboard(300, 300);
        let logo = checkerboard(LOGO_BLOCK_SIZE, LOGO_BLOCK_SIZE);

        let first = composite(&now, Some(&art), Some(&logo), &font);
        let second = composite(&now, Some(&art), Some(&logo), &font);
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn long_titles_stay_inside_the_text_region() {
        let Some(font) = test_font() else { return };
        let now = NowPlaying::new(
            "A Band With A Remarkably Unreasonably Long Name",
            "An Extended Director's Cut Of A Song That Never Ends (Ultra Rare 12\" Mix)",
        );
        let slide = composite(&now, None, None, &font);
        let blank = composite(&NowPlaying::new("", ""), None, None, &font);

        assert_eq!(slide.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        // Fitted and truncated text ends before the 5px right margin, so
        // the rightmost bar column matches a render with no text at all.
        for y in BAR_TOP..CANVAS_HEIGHT {
            assert_eq!(
                slide.get_pixel(CANVAS_WIDTH - 1, y),
                blank.get_pixel(CANVAS_WIDTH - 1, y),
                "text bled into the right margin at y={y}"
            );
        }
    }

    #[test]
    fn save_output_flattens_jpeg_and_replaces_atomically() {
        let dir = std::env::temp_dir();
        let jpg = dir.join(format!("slidecast-test-{}.jpg", std::process::id()));
        let png = dir.join(format!("slidecast-test-{}.png", std::process::id()));

        let image = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([9, 9, 9, 255]));
        save_output(image.clone(), &jpg).unwrap();
        save_output(image, &png).unwrap();

        let reloaded = image::open(&jpg).unwrap();
        assert_eq!(reloaded.color(), image::ColorType::Rgb8);
        assert_eq!(reloaded.to_rgb8().dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(image::open(&png).is_ok());
        assert!(!jpg.with_extension("tmp").exists());

        let _ = std::fs::remove_file(&jpg);
        let _ = std::fs::remove_file(&png);
    }

    #[test]
    fn save_output_rejects_unknown_extensions() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        assert!(save_output(image, Path::new("/tmp/slide.notaformat")).is_err());
    }
}
