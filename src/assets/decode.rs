use std::sync::Arc;

use crate::{
    assets::{AssetId, PreparedImage},
    core::Rgba8Premul,
    error::{PlakatError, PlakatResult},
};

/// Decode encoded image bytes (PNG/JPEG/…) into premultiplied RGBA8.
///
/// The prepared id is derived from the encoded bytes, so identical inputs
/// map to the same id regardless of where they were fetched from.
pub fn decode_image(bytes: &[u8]) -> PlakatResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PlakatError::asset(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        id: AssetId::from_content(b'I', bytes),
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let p = Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]);
        px[0] = p.r;
        px[1] = p.g;
        px[2] = p.b;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_image_png_dimensions_and_premul() {
        let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
        let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let prepared = decode_image(&buf).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(prepared.height, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn zero_alpha_pixels_collapse_to_transparent_black() {
        let src_rgba = vec![100u8, 50u8, 200u8, 0u8];
        let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let prepared = decode_image(&buf).unwrap();
        assert_eq!(prepared.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(err.to_string().starts_with("asset error:"), "got: {err}");
    }
}
