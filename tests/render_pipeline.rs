use std::io::Cursor;

use plakat::{
    Canvas, Color, FixedAsset, FrameRGBA, Layer, LoadState, MaskRect, MemoryAssets, PhotoSource,
    TemplateDescriptor, TemplateRenderer,
};

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

/// 32x32 fontless descriptor with the mask in the middle of the canvas.
fn small_descriptor() -> TemplateDescriptor {
    let mut desc = TemplateDescriptor::default();
    desc.canvas = Canvas {
        width: 32,
        height: 32,
    };
    desc.image_mask = MaskRect {
        x: 8.0,
        y: 8.0,
        width: 16.0,
        height: 16.0,
    };
    desc.urls.font = None;
    desc
}

fn source_with(desc: &TemplateDescriptor, pattern: [u8; 4], stroke: [u8; 4]) -> MemoryAssets {
    let mut src = MemoryAssets::new();
    src.insert(desc.urls.design_pattern.clone(), png_bytes(2, 2, pattern));
    src.insert(desc.urls.stroke.clone(), png_bytes(2, 2, stroke));
    src
}

/// Route load warnings through the test writer for `--nocapture` runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn photo_draws_over_the_pattern_inside_the_mask() {
    let desc = small_descriptor();
    let src = source_with(&desc, [0, 0, 255, 255], [0, 0, 0, 0]);
    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    renderer
        .set_photo(Some(PhotoSource::Bytes(png_bytes(2, 2, [0, 255, 0, 255]))))
        .unwrap();

    let banner = renderer.render().unwrap();
    // Outside the mask the opaque pattern shows; inside, the photo covers it.
    assert_eq!(px(&banner.frame, 2, 2), [0, 0, 255, 255]);
    assert_eq!(px(&banner.frame, 16, 16), [0, 255, 0, 255]);
    assert!(banner.report.skipped.iter().all(|s| s.layer != Layer::Photo));
}

#[test]
fn stroke_overlay_draws_over_the_photo() {
    let desc = small_descriptor();
    let src = source_with(&desc, [0, 0, 255, 255], [255, 255, 0, 255]);
    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    renderer
        .set_photo(Some(PhotoSource::Bytes(png_bytes(2, 2, [0, 255, 0, 255]))))
        .unwrap();

    let banner = renderer.render().unwrap();
    // The opaque stroke overlay is the topmost image layer everywhere.
    assert_eq!(px(&banner.frame, 2, 2), [255, 255, 0, 255]);
    assert_eq!(px(&banner.frame, 16, 16), [255, 255, 0, 255]);
}

#[test]
fn backdrop_shows_through_transparent_overlays() {
    let desc = small_descriptor();
    let src = source_with(&desc, [0, 0, 0, 0], [0, 0, 0, 0]);
    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    renderer.set_background_color(Some(Color::rgb(200, 10, 10)));

    let banner = renderer.render().unwrap();
    assert_eq!(px(&banner.frame, 0, 0), [200, 10, 10, 255]);
    assert_eq!(px(&banner.frame, 31, 31), [200, 10, 10, 255]);
}

#[test]
fn missing_fixed_asset_skips_its_layer_and_keeps_the_rest() {
    init_tracing();
    let desc = small_descriptor();
    let mut src = MemoryAssets::new();
    // Stroke only; the design pattern path stays unresolvable.
    src.insert(desc.urls.stroke.clone(), png_bytes(2, 2, [0, 0, 0, 0]));

    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();

    let pattern_status = renderer
        .asset_statuses()
        .iter()
        .find(|s| s.asset == FixedAsset::DesignPattern)
        .unwrap();
    assert!(matches!(pattern_status.state, LoadState::Failed(_)));

    let banner = renderer.render().unwrap();
    let skipped: Vec<_> = banner.report.skipped.iter().map(|s| s.layer).collect();
    assert!(skipped.contains(&Layer::DesignPattern));
    assert!(!skipped.contains(&Layer::StrokeOverlay));

    // The render still produced a full frame with the default backdrop.
    assert_eq!(px(&banner.frame, 0, 0), [3, 105, 161, 255]);
}

#[test]
fn identical_state_renders_identical_bytes() {
    let desc = small_descriptor();
    let src = source_with(&desc, [0, 0, 255, 255], [0, 0, 0, 0]);
    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    renderer
        .set_photo(Some(PhotoSource::Bytes(png_bytes(3, 3, [7, 8, 9, 255]))))
        .unwrap();

    let first = renderer.render().unwrap();
    let second = renderer.render().unwrap();

    assert_eq!(first.frame.data, second.frame.data);
    assert!(second.generation > first.generation);
}

#[test]
fn photo_loads_from_a_filesystem_path() {
    let dir = std::path::PathBuf::from("target").join("render_pipeline");
    std::fs::create_dir_all(&dir).unwrap();
    let photo_path = dir.join("photo.png");
    std::fs::write(&photo_path, png_bytes(2, 2, [250, 0, 250, 255])).unwrap();

    let desc = small_descriptor();
    let src = source_with(&desc, [0, 0, 0, 0], [0, 0, 0, 0]);
    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    renderer
        .set_photo(Some(PhotoSource::Path(photo_path)))
        .unwrap();

    let banner = renderer.render().unwrap();
    assert_eq!(px(&banner.frame, 16, 16), [250, 0, 250, 255]);
}

#[test]
fn default_template_renders_at_full_canvas_size() {
    let mut desc = TemplateDescriptor::default();
    desc.urls.font = None;
    let src = source_with(&desc, [0, 0, 0, 0], [0, 0, 0, 0]);

    let mut renderer = TemplateRenderer::new(desc, &src).unwrap();
    let banner = renderer.render().unwrap();

    assert_eq!((banner.frame.width, banner.frame.height), (1080, 1080));
    assert!(banner.frame.premultiplied);
    assert_eq!(px(&banner.frame, 0, 0), [3, 105, 161, 255]);
    assert_eq!(px(&banner.frame, 1079, 1079), [3, 105, 161, 255]);

    // Without a font the two text layers are reported, nothing else.
    let skipped: Vec<_> = banner.report.skipped.iter().map(|s| s.layer).collect();
    assert_eq!(skipped, vec![Layer::Caption, Layer::Cta]);
}
