use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use cartoonize::image::{decode_bytes, decode_file, to_pixels, to_tensor};
use cartoonize::notify::{Notice, NoticeLog};
use cartoonize::preview::{Preview, PreviewSink};
use cartoonize::storage::{ImageWriter, MediaIndex, DEFAULT_DIRECTORY_NAME};
use cartoonize::{
    Action, Controller, Displayable, Error, ImageSource, Inference, ModelVariant, PathSource,
    Pick, PipelineState, PixelBuffer, Result, TensorImage,
};

const SIZE: u32 = 8;

/// Negates every tensor value, i.e. inverts colors.
#[derive(Clone, Default)]
struct NegateModel {
    calls: Rc<RefCell<Vec<(ModelVariant, TensorImage)>>>,
    live: Rc<Cell<usize>>,
    fail: bool,
}

impl Inference for NegateModel {
    fn infer(&self, variant: ModelVariant, image: &TensorImage) -> Result<TensorImage> {
        self.live.set(self.live.get() + 1);
        assert_eq!(self.live.get(), 1, "overlapping model handles");

        self.calls.borrow_mut().push((variant, image.clone()));
        let result = if self.fail {
            Err(Error::ShapeMismatch {
                expected: "(1, 8, 8, 3)".to_string(),
                actual: "[]".to_string(),
            })
        } else {
            Ok(TensorImage::new(image.data().mapv(|v| -v), image.source_dims()))
        };

        self.live.set(self.live.get() - 1);
        result
    }
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<PixelBuffer>>>);

impl PreviewSink for RecordingSink {
    fn render(&mut self, image: &PixelBuffer) -> Result<()> {
        self.0.borrow_mut().push(image.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingMedia {
    registered: Rc<RefCell<Vec<PathBuf>>>,
    fail: bool,
}

impl MediaIndex for RecordingMedia {
    fn register(&self, path: &Path) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("indexer down"));
        }
        self.registered.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Hands out queued picks in order, then cancels.
struct ScriptedSource(VecDeque<Result<Pick>>);

impl ScriptedSource {
    fn new(picks: impl IntoIterator<Item = Result<Pick>>) -> Self {
        Self(picks.into_iter().collect())
    }
}

impl ImageSource for ScriptedSource {
    fn pick(&mut self) -> Result<Pick> {
        self.0.pop_front().unwrap_or(Ok(Pick::Cancelled))
    }
}

struct Harness {
    controller: Controller,
    model: NegateModel,
    sink: RecordingSink,
    media: RecordingMedia,
    pictures: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::build(NegateModel::default(), RecordingMedia::default(), true)
    }

    fn build(model: NegateModel, media: RecordingMedia, storage: bool) -> Self {
        let pictures = tempfile::tempdir().unwrap();
        let sink = RecordingSink::default();

        let pictures_dir = if storage {
            pictures.path().to_path_buf()
        } else {
            pictures.path().join("unmounted")
        };

        let writer = ImageWriter::new(
            Some(pictures_dir),
            DEFAULT_DIRECTORY_NAME,
            100,
            Box::new(media.clone()),
        );

        let controller = Controller::with_parts(
            ModelVariant::Int8,
            SIZE,
            Box::new(model.clone()),
            Preview::new(Box::new(sink.clone())),
            writer,
        );

        Self {
            controller,
            model,
            sink,
            media,
            pictures,
        }
    }

    fn saved_files(&self) -> Vec<PathBuf> {
        let dir = self.pictures.path().join(DEFAULT_DIRECTORY_NAME);
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
        files.sort();
        files
    }
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
    PixelBuffer::new(RgbaImage::from_pixel(width, height, Rgba(rgba)))
}

fn gradient(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::new(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 20 % 256) as u8, (y * 30 % 256) as u8, 128, 255])
    }))
}

fn selected(pixels: PixelBuffer) -> Result<Pick> {
    Ok(Pick::Selected(Displayable::Bitmap(pixels)))
}

#[test]
fn convert_and_save_need_an_image() {
    let mut h = Harness::new();

    assert!(matches!(h.controller.convert(), Err(Error::NoImageSelected)));
    assert!(matches!(h.controller.save(), Err(Error::NoImageSelected)));

    assert_eq!(h.controller.state(), PipelineState::Empty);
    assert!(h.controller.displayed().is_none());
    assert!(h.model.calls.borrow().is_empty());
    assert!(h.saved_files().is_empty());
}

#[test]
fn cancel_leaves_state_unchanged() {
    let mut h = Harness::new();

    let state = h.controller.select(&mut PathSource::cancelled()).unwrap();
    assert_eq!(state, PipelineState::Empty);
    assert!(h.controller.displayed().is_none());

    let image = gradient(8, 6);
    let mut source = ScriptedSource::new([selected(image.clone()), Ok(Pick::Cancelled)]);
    h.controller.select(&mut source).unwrap();
    h.controller.select(&mut source).unwrap();

    assert_eq!(h.controller.state(), PipelineState::SourceLoaded);
    assert_eq!(
        h.controller.displayed(),
        Some(&Displayable::Bitmap(image))
    );
}

#[test]
fn select_displays_the_decoded_file() {
    let mut h = Harness::new();
    let path = h.pictures.path().join("photo.png");
    gradient(10, 7).as_image().save(&path).unwrap();

    let state = h.controller.select(&mut PathSource::new(&path)).unwrap();

    assert_eq!(state, PipelineState::SourceLoaded);
    let decoded = decode_file(&path).unwrap();
    assert_eq!(
        h.controller.displayed(),
        Some(&Displayable::Bitmap(decoded.clone()))
    );

    h.controller.preview_mut().pump();
    assert_eq!(*h.sink.0.borrow(), vec![decoded]);
}

#[test]
fn decode_failure_keeps_previous_image() {
    let mut h = Harness::new();
    let image = gradient(8, 8);
    let mut log = NoticeLog::default();

    let mut source = ScriptedSource::new([
        selected(image.clone()),
        decode_bytes(b"not an image", "garbage.png").map(|p| Pick::Selected(p.into())),
    ]);
    h.controller.handle(Action::Select(&mut source), &mut log);
    let notice = h.controller.handle(Action::Select(&mut source), &mut log);

    assert_eq!(notice, Some(Notice::DecodeFailed));
    assert_eq!(log.notices, vec![Notice::DecodeFailed]);
    assert_eq!(h.controller.state(), PipelineState::SourceLoaded);
    assert_eq!(h.controller.displayed(), Some(&Displayable::Bitmap(image)));
}

#[test]
fn convert_displays_int8_model_output() {
    let mut h = Harness::new();
    let image = gradient(12, 9);
    h.controller
        .select(&mut ScriptedSource::new([selected(image.clone())]))
        .unwrap();

    h.controller.convert().unwrap();

    let input = to_tensor(&Displayable::Bitmap(image), SIZE);
    let expected = to_pixels(&NegateModel::default().infer(ModelVariant::Int8, &input).unwrap())
        .unwrap();

    assert_eq!(h.controller.state(), PipelineState::Cartoonized);
    assert_eq!(
        h.controller.displayed(),
        Some(&Displayable::Bitmap(expected.clone()))
    );

    let calls = h.model.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ModelVariant::Int8);
    assert_eq!(calls[0].1, input);

    drop(calls);
    h.controller.preview_mut().pump();
    assert_eq!(h.sink.0.borrow().last(), Some(&expected));
}

#[test]
fn repeated_convert_reapplies_model_to_displayed_image() {
    let mut h = Harness::new();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(8, 8))]))
        .unwrap();

    h.controller.convert().unwrap();
    let first = h.controller.displayed().cloned().unwrap();
    h.controller.convert().unwrap();

    assert_eq!(h.controller.state(), PipelineState::Cartoonized);
    let calls = h.model.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].1, to_tensor(&first, SIZE));
}

#[test]
fn preview_shows_only_latest_image() {
    let mut h = Harness::new();
    let mut source = ScriptedSource::new([selected(gradient(8, 8))]);
    let mut log = NoticeLog::default();

    h.controller.select(&mut source).unwrap();
    h.controller.convert().unwrap();
    assert_eq!(h.controller.preview_mut().pending(), 1);

    h.controller.handle(Action::Convert, &mut log);

    let shown = h.sink.0.borrow();
    assert_eq!(shown.len(), 1);
    assert_eq!(
        Some(&Displayable::Bitmap(shown[0].clone())),
        h.controller.displayed()
    );
}

#[test]
fn many_unpumped_converts_retain_one_preview() {
    let mut h = Harness::new();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(400, 300))]))
        .unwrap();

    for _ in 0..50 {
        h.controller.convert().unwrap();
        assert!(h.controller.preview_mut().pending() <= 1);
    }

    assert_eq!(h.model.calls.borrow().len(), 50);
    let completions = h.controller.preview_mut().pump();
    assert_eq!(completions.len(), 51);

    let shown = h.sink.0.borrow();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].dimensions(), (400, 300));
}

#[test]
fn failed_inference_keeps_state() {
    let model = NegateModel {
        fail: true,
        ..NegateModel::default()
    };
    let mut h = Harness::build(model, RecordingMedia::default(), true);
    let image = gradient(8, 8);
    let mut log = NoticeLog::default();

    h.controller
        .select(&mut ScriptedSource::new([selected(image.clone())]))
        .unwrap();
    let notice = h.controller.handle(Action::Convert, &mut log);

    assert_eq!(notice, Some(Notice::ConvertFailed));
    assert_eq!(h.controller.state(), PipelineState::SourceLoaded);
    assert_eq!(h.controller.displayed(), Some(&Displayable::Bitmap(image)));
}

#[test]
fn save_writes_decodable_jpeg() {
    let mut h = Harness::new();
    let image = solid(16, 12, [30, 160, 220, 255]);
    h.controller
        .select(&mut ScriptedSource::new([selected(image)]))
        .unwrap();

    let path = h.controller.save().unwrap();

    assert_eq!(h.controller.state(), PipelineState::SourceLoaded);
    assert_eq!(h.saved_files(), vec![path.clone()]);
    assert_eq!(*h.media.registered.borrow(), vec![path.clone()]);

    let name = path.file_name().unwrap().to_str().unwrap();
    let millis = name
        .strip_prefix("cartoon_")
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .unwrap();
    assert!(millis.parse::<u128>().is_ok(), "unexpected name {name}");

    let decoded = image::open(&path).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 12));
    for pixel in decoded.pixels() {
        assert!(pixel[0].abs_diff(30) <= 6);
        assert!(pixel[1].abs_diff(160) <= 6);
        assert!(pixel[2].abs_diff(220) <= 6);
    }
}

#[test]
fn save_after_convert_keeps_cartoonized_state() {
    let mut h = Harness::new();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(8, 8))]))
        .unwrap();
    h.controller.convert().unwrap();

    h.controller.save().unwrap();

    assert_eq!(h.controller.state(), PipelineState::Cartoonized);
    assert_eq!(h.saved_files().len(), 1);
}

#[test]
fn unavailable_storage_creates_nothing() {
    let mut h = Harness::build(NegateModel::default(), RecordingMedia::default(), false);
    let mut log = NoticeLog::default();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(8, 8))]))
        .unwrap();

    assert!(matches!(
        h.controller.save(),
        Err(Error::StorageUnavailable { .. })
    ));
    assert_eq!(
        h.controller.handle(Action::Save, &mut log),
        Some(Notice::StorageUnavailable)
    );

    assert!(!h.pictures.path().join("unmounted").exists());
    assert_eq!(fs::read_dir(h.pictures.path()).unwrap().count(), 0);
    assert!(h.media.registered.borrow().is_empty());
}

#[test]
fn saves_in_different_milliseconds_are_distinct() {
    let mut h = Harness::new();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(8, 8))]))
        .unwrap();

    let first = h.controller.save().unwrap();
    std::thread::sleep(Duration::from_millis(5));
    let second = h.controller.save().unwrap();

    assert_ne!(first, second);
    assert_eq!(h.saved_files().len(), 2);
}

#[test]
fn media_index_failure_is_not_a_save_failure() {
    let media = RecordingMedia {
        fail: true,
        ..RecordingMedia::default()
    };
    let mut h = Harness::build(NegateModel::default(), media, true);
    let mut log = NoticeLog::default();
    h.controller
        .select(&mut ScriptedSource::new([selected(gradient(8, 8))]))
        .unwrap();

    let notice = h.controller.handle(Action::Save, &mut log);

    let files = h.saved_files();
    assert_eq!(files.len(), 1);
    assert_eq!(notice, Some(Notice::Saved(files[0].clone())));
}

#[test]
fn placeholder_is_converted_and_saved_as_blank() {
    let mut h = Harness::new();
    let mut source = ScriptedSource::new([Ok(Pick::Selected(Displayable::Placeholder {
        width: 6,
        height: 4,
    }))]);
    h.controller.select(&mut source).unwrap();

    let path = h.controller.save().unwrap();
    let decoded = image::open(&path).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (6, 4));
    assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c <= 6)));

    h.controller.convert().unwrap();
    assert_eq!(h.controller.state(), PipelineState::Cartoonized);
    let Some(Displayable::Bitmap(cartoon)) = h.controller.displayed() else {
        panic!("expected a bitmap after convert");
    };
    assert_eq!(cartoon.dimensions(), (6, 4));
}

#[test]
fn handle_reports_no_image_selected() {
    let mut h = Harness::new();
    let mut log = NoticeLog::default();

    assert_eq!(
        h.controller.handle(Action::Convert, &mut log),
        Some(Notice::NoImageSelected)
    );
    assert_eq!(
        h.controller.handle(Action::Save, &mut log),
        Some(Notice::NoImageSelected)
    );
    assert_eq!(
        log.notices,
        vec![Notice::NoImageSelected, Notice::NoImageSelected]
    );
    assert_eq!(h.controller.state(), PipelineState::Empty);
}
