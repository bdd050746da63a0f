use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::{Point, Rect, Size};
use stampink_app::{
    Attribute, Editor, EditorConfig, EditorError, ElementKind, ElementRef, FrameHost, FrameToken,
    InteractionEvent, PointerInput,
};
use stampink_core::ManualFrameHost;
use stampink_render::CpuRenderer;
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn png(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn config() -> EditorConfig {
    EditorConfig {
        load_system_fonts: false,
        ..EditorConfig::default()
    }
}

fn editor() -> Editor {
    init_logger();
    let renderer = Box::new(CpuRenderer::default());
    Editor::with_parts(config(), renderer, Box::new(ManualFrameHost)).unwrap()
}

#[derive(Debug, Default)]
struct FrameLog {
    requested: Vec<FrameToken>,
    cancelled: Vec<FrameToken>,
}

struct SharedHost(Rc<RefCell<FrameLog>>);

impl FrameHost for SharedHost {
    fn request_frame(&mut self, token: FrameToken) {
        self.0.borrow_mut().requested.push(token);
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.0.borrow_mut().cancelled.push(token);
    }
}

#[test]
fn scenario_drag_clamp_and_native_export() {
    let mut editor = editor();
    let beach = editor.load_base_image(png(800, 600, WHITE), Some("beach.png".into()));
    pollster::block_on(beach).unwrap();
    let id = pollster::block_on(editor.add_watermark(png(200, 100, GREEN), "logo.png")).unwrap();
    editor.set_active_element_attribute(Attribute::Scale(0.5));
    editor.set_active_element_attribute(Attribute::Position(Point::new(10.0, 10.0)));
    editor.flush();

    let target = ElementRef::watermark(id);
    assert_eq!(editor.bounds().get(target), Some(Rect::new(10.0, 10.0, 110.0, 60.0)));

    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(20.0, 20.0)));
    editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(720.0, 20.0)));
    editor.handle_event(&InteractionEvent::End);
    assert_eq!(editor.watermarks()[0].position, Point::new(700.0, 10.0));

    let exported = editor.export_composite().unwrap();
    assert_eq!((exported.width, exported.height), (800, 600));
    let out = image::load_from_memory(&exported.png).unwrap().to_rgba8();
    assert_eq!(out.get_pixel(700, 10).0, GREEN);
    assert_eq!(out.get_pixel(799, 59).0, GREEN);
    assert_eq!(out.get_pixel(699, 30).0, WHITE);
    assert_eq!(editor.suggested_export_name(), "beach_watermarked.png");
}

#[test]
fn export_matches_native_size_when_canvas_is_downscaled() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(2400, 1800, WHITE), None)).unwrap();
    assert_eq!(editor.canvas_size(), Size::new(800.0, 600.0));

    let exported = editor.export_composite().unwrap();
    assert_eq!((exported.width, exported.height), (2400, 1800));
}

/// Inclusive bounding box of pixels equal to `color`.
fn bbox_of(image: &RgbaImage, color: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, px)| px.0 == color)
        .fold(None, |bbox, (x, y, _)| match bbox {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}

/// 1600x1200 base shown at 800x600 with a 100x50 watermark at (700, 10).
fn editor_with_corner_watermark() -> (Editor, ElementRef) {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(1600, 1200, WHITE), None)).unwrap();
    let id = pollster::block_on(editor.add_watermark(png(200, 100, GREEN), "logo.png")).unwrap();
    editor.set_active_element_attribute(Attribute::Scale(0.5));
    editor.set_active_element_attribute(Attribute::Position(Point::new(700.0, 10.0)));
    editor.flush();
    (editor, ElementRef::watermark(id))
}

#[test]
fn resizing_the_container_does_not_move_exported_elements() {
    let (mut editor, target) = editor_with_corner_watermark();
    let before = editor.export_composite().unwrap();
    let decoded = image::load_from_memory(&before.png).unwrap().to_rgba8();
    assert_eq!(bbox_of(&decoded, GREEN), Some((1400, 20, 1599, 119)));

    editor.resize_container(400.0, 300.0);
    editor.flush();
    assert_eq!(editor.canvas_size(), Size::new(400.0, 300.0));
    assert_eq!(editor.bounds().get(target), Some(Rect::new(350.0, 5.0, 400.0, 30.0)));
    assert_eq!(editor.watermarks()[0].position, Point::new(700.0, 10.0));

    let after = editor.export_composite().unwrap();
    assert_eq!((after.width, after.height), (1600, 1200));
    assert_eq!(after.png, before.png);
}

#[test]
fn drag_after_resize_commits_in_document_space() {
    let (mut editor, _) = editor_with_corner_watermark();
    editor.resize_container(400.0, 300.0);

    // 50 canvas pixels at half size is 100 document units
    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(360.0, 10.0)));
    editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(310.0, 10.0)));
    editor.handle_event(&InteractionEvent::End);
    assert_eq!(editor.watermarks()[0].position, Point::new(600.0, 10.0));

    let exported = editor.export_composite().unwrap();
    let decoded = image::load_from_memory(&exported.png).unwrap().to_rgba8();
    assert_eq!(bbox_of(&decoded, GREEN), Some((1200, 20, 1399, 119)));
}

#[test]
fn resize_mid_drag_keeps_following_the_pointer() {
    let (mut editor, target) = editor_with_corner_watermark();
    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(710.0, 20.0)));
    assert!(editor.is_dragging());

    editor.resize_container(400.0, 300.0);
    editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(305.0, 10.0)));
    editor.flush();
    assert_eq!(editor.bounds().get(target), Some(Rect::new(300.0, 5.0, 350.0, 30.0)));

    editor.handle_event(&InteractionEvent::End);
    assert_eq!(editor.watermarks()[0].position, Point::new(600.0, 10.0));
}

#[test]
fn text_is_drawn_and_exported_with_real_glyphs() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(1600, 1200, WHITE), None)).unwrap();
    editor.add_text("Stamp").unwrap();
    editor.set_active_element_attribute(Attribute::Color("#ff0000".parse().unwrap()));
    editor.select_element(None);
    editor.flush();

    let rect = editor.bounds().get(ElementRef::text(0)).unwrap();
    let red = [255, 0, 0, 255];
    let (x0, y0, x1, y1) = bbox_of(editor.surface(), red).unwrap();
    assert!(rect.inflate(1.0, 1.0).contains(Point::new(x0 as f64, y0 as f64)));
    assert!(rect.inflate(1.0, 1.0).contains(Point::new(x1 as f64, y1 as f64)));

    let exported = editor.export_composite().unwrap();
    let decoded = image::load_from_memory(&exported.png).unwrap().to_rgba8();
    let (nx0, ny0, _, _) = bbox_of(&decoded, red).unwrap();
    assert!((nx0 as f64 - 2.0 * x0 as f64).abs() <= 3.0);
    assert!((ny0 as f64 - 2.0 * y0 as f64).abs() <= 3.0);
}

#[test]
fn adding_without_base_image_is_rejected() {
    let mut editor = editor();

    let err = pollster::block_on(editor.add_watermark(png(10, 10, GREEN), "logo.png")).unwrap_err();
    assert_eq!(err, EditorError::NO_BASE_IMAGE);
    assert!(editor.add_text("Hello").is_err());

    assert!(editor.watermarks().is_empty());
    assert!(editor.texts().is_empty());
    assert_eq!(editor.error(), Some(&EditorError::NO_BASE_IMAGE));
    assert!(!editor.is_loading());
}

#[test]
fn text_is_hit_before_overlapping_watermark() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(800, 600, WHITE), None)).unwrap();
    pollster::block_on(editor.add_watermark(png(400, 400, GREEN), "big.png")).unwrap();
    editor.add_text("Caption").unwrap();
    editor.select_element(None);

    // Watermark covers (0, 0, 120, 120); text sits at (50, 50)
    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(60.0, 60.0)));
    let active = editor.active_element().map(|e| e.element_ref());
    assert_eq!(active.map(|r| r.kind), Some(ElementKind::Text));
    editor.handle_event(&InteractionEvent::End);

    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(10.0, 10.0)));
    let active = editor.active_element().map(|e| e.element_ref());
    assert_eq!(active.map(|r| r.kind), Some(ElementKind::Watermark));
}

#[test]
fn removed_element_is_no_longer_hit_or_drawn() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(800, 600, WHITE), None)).unwrap();
    pollster::block_on(editor.add_watermark(png(100, 100, GREEN), "logo.png")).unwrap();
    editor.flush();
    assert_eq!(editor.surface().get_pixel(5, 5).0, GREEN);

    assert!(editor.remove_active_element());
    assert!(editor.active_element().is_none());
    editor.flush();
    assert!(editor.bounds().is_empty());
    assert_eq!(editor.surface().get_pixel(5, 5).0, WHITE);

    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(5.0, 5.0)));
    assert!(!editor.is_dragging());
}

#[test]
fn reset_clears_everything_and_restarts_ids() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(100, 100, WHITE), None)).unwrap();
    editor.add_text("one").unwrap();
    editor.add_text("two").unwrap();

    editor.reset_session();
    assert!(editor.store().base_image().is_none());
    assert!(editor.store().is_empty());
    assert_eq!(editor.canvas_size(), Size::new(600.0, 400.0));

    pollster::block_on(editor.load_base_image(png(100, 100, WHITE), None)).unwrap();
    assert_eq!(editor.add_text("again").unwrap(), 0);
}

#[test]
fn pointer_coordinates_are_mapped_through_display_rect() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(800, 600, WHITE), None)).unwrap();
    pollster::block_on(editor.add_watermark(png(100, 100, GREEN), "logo.png")).unwrap();
    editor.set_active_element_attribute(Attribute::Position(Point::new(400.0, 300.0)));
    editor.select_element(None);

    // Canvas shown at half size, offset by (100, 50) on screen
    editor.set_display_rect(Rect::new(100.0, 50.0, 500.0, 350.0));
    editor.handle_event(&InteractionEvent::Start(PointerInput::touch(305.0, 205.0)));
    assert!(editor.is_dragging());
}

#[test]
fn export_is_rejected_mid_drag() {
    let mut editor = editor();
    pollster::block_on(editor.load_base_image(png(800, 600, WHITE), None)).unwrap();
    pollster::block_on(editor.add_watermark(png(100, 100, GREEN), "logo.png")).unwrap();

    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(5.0, 5.0)));
    editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(200.0, 200.0)));
    let err = editor.export_composite().unwrap_err();
    assert_eq!(err.kind(), "export");

    editor.handle_event(&InteractionEvent::End);
    assert!(editor.export_composite().is_ok());
    assert!(editor.error().is_none());
}

#[test]
fn corrupt_upload_keeps_previous_base_image() {
    let mut editor = editor();
    let first = editor.load_base_image(png(300, 200, WHITE), Some("first.png".into()));
    pollster::block_on(first).unwrap();
    editor.add_text("stay").unwrap();

    let bad = editor.load_base_image(b"not an image".to_vec(), Some("bad.png".into()));
    let err = pollster::block_on(bad).unwrap_err();
    assert_eq!(err.kind(), "decode");
    assert_eq!(editor.canvas_size(), Size::new(300.0, 200.0));
    assert_eq!(editor.texts().len(), 1);
    assert_eq!(editor.suggested_export_name(), "first_watermarked.png");
}

#[test]
fn drag_drives_frame_loop_and_teardown_cancels_it() {
    init_logger();
    let log = Rc::new(RefCell::new(FrameLog::default()));
    let mut editor = Editor::with_parts(
        config(),
        Box::new(CpuRenderer::default()),
        Box::new(SharedHost(log.clone())),
    )
    .unwrap();

    let first = *log.borrow().requested.last().unwrap();
    assert!(editor.on_animation_frame(first));

    pollster::block_on(editor.load_base_image(png(800, 600, WHITE), None)).unwrap();
    pollster::block_on(editor.add_watermark(png(100, 100, GREEN), "logo.png")).unwrap();
    editor.handle_event(&InteractionEvent::Start(PointerInput::mouse(5.0, 5.0)));
    assert!(editor.is_dragging());

    // Many moves between ticks collapse into one pending request
    let before = log.borrow().requested.len();
    for x in 10..20 {
        editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(x as f64, 5.0)));
    }
    assert!(log.borrow().requested.len() <= before + 1);

    // While dragging, every tick re-requests the next one
    let token = *log.borrow().requested.last().unwrap();
    assert!(editor.on_animation_frame(token));
    let next = *log.borrow().requested.last().unwrap();
    assert_ne!(token, next);

    drop(editor);
    assert_eq!(log.borrow().cancelled.last(), Some(&next));
}
