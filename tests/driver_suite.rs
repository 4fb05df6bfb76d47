use std::sync::{Arc, Mutex};
use std::thread;

use fractalglass::config::{Params, ParamsPatch};
use fractalglass::driver::{DriverState, FixedStep, Frame, FrameDriver, FrameSink, PngSequence};
use fractalglass::error::{Error, Result};
use fractalglass::render::render_frame;
use fractalglass::surface::{LIVE_MAX_PIXEL_RATIO, Surface, Viewport};

/// Keeps every presented frame so tests can inspect them afterwards.
#[derive(Clone, Default)]
struct SharedSink {
    frames: Arc<Mutex<Vec<Frame>>>,
    resizes: Arc<Mutex<Vec<Surface>>>,
}

impl FrameSink for SharedSink {
    fn open(&mut self, _surface: Surface) -> Result<()> {
        Ok(())
    }

    fn resize(&mut self, surface: Surface) -> Result<()> {
        self.resizes.lock().unwrap().push(surface);
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}

/// A display with no rendering context.
struct NoContext {
    presented: usize,
}

impl FrameSink for NoContext {
    fn open(&mut self, _surface: Surface) -> Result<()> {
        Err(Error::BackendUnavailable("no rendering context".into()))
    }

    fn present(&mut self, _frame: &Frame) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}

fn small_viewport() -> Viewport {
    Viewport::new(12, 8, 1.0)
}

#[test]
fn missing_backend_is_reported_and_loop_never_runs() {
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 60.0),
        NoContext { presented: 0 },
    );
    let err = driver.run(Some(5), None).unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable(_)), "{err}");
    assert_eq!(driver.state(), DriverState::Idle);
    assert!(!driver.tick().unwrap());
    assert_eq!(driver.sink().presented, 0);
}

#[test]
fn frames_match_pure_pipeline() {
    let sink = SharedSink::default();
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(1.0, 4.0),
        sink.clone(),
    );
    driver.run(Some(2), None).unwrap();

    let frames = sink.frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].time, 1.25);
    for f in frames.iter() {
        assert_eq!(f.rgba, render_frame(f.surface, f.time, &Params::default()));
    }
}

#[test]
fn parameter_updates_land_between_frames() {
    let sink = SharedSink::default();
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 1.0),
        sink.clone(),
    );
    driver.start().unwrap();
    driver.tick().unwrap();

    let patch = ParamsPatch { line_frequency: Some(25.0), ..ParamsPatch::default() };
    driver.handle().update(patch.clone());
    assert_eq!(driver.params().line_frequency, 80.0);
    driver.tick().unwrap();
    assert_eq!(driver.params().line_frequency, 25.0);

    let mut expected = Params::default();
    expected.apply(&patch);
    let frames = sink.frames.lock().unwrap();
    assert_eq!(frames[0].rgba, render_frame(frames[0].surface, 0.0, &Params::default()));
    assert_eq!(frames[1].rgba, render_frame(frames[1].surface, 1.0, &expected));
}

#[test]
fn resize_from_another_thread_is_atomic() {
    let sink = SharedSink::default();
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 30.0),
        sink.clone(),
    );
    driver.start().unwrap();
    driver.tick().unwrap();

    let handle = driver.handle();
    thread::spawn(move || {
        handle.resize(Viewport::new(5, 5, 1.0));
        handle.resize(Viewport::new(9, 7, 3.0));
    })
    .join()
    .unwrap();

    driver.tick().unwrap();
    assert_eq!(driver.surface(), Surface::new(18, 14));
    assert_eq!(*sink.resizes.lock().unwrap(), vec![Surface::new(18, 14)]);

    let frames = sink.frames.lock().unwrap();
    for f in frames.iter() {
        assert_eq!(f.rgba.len(), f.surface.pixel_count() * 4);
    }
}

#[test]
fn stop_from_handle_ends_run() {
    let sink = SharedSink::default();
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 30.0),
        sink.clone(),
    );
    driver.start().unwrap();
    driver.tick().unwrap();
    driver.handle().stop();
    assert_eq!(driver.run(None, None).unwrap(), 0);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(sink.frames.lock().unwrap().len(), 1);
}

#[test]
fn png_sequence_writes_numbered_frames() {
    let dir = std::env::temp_dir().join(format!("fractalglass-driver-{}", std::process::id()));
    let mut driver = FrameDriver::new(
        Params::default(),
        Viewport::new(6, 4, 2.0),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 10.0),
        PngSequence::new(&dir),
    );
    assert_eq!(driver.run(Some(2), None).unwrap(), 2);

    let written = driver.sink().written().to_vec();
    assert_eq!(written.len(), 2);
    assert!(written[1].ends_with("frame_00001.png"));
    let img = image::open(&written[0]).unwrap();
    assert_eq!((img.width(), img.height()), (12, 8));
    std::fs::remove_dir_all(&dir).unwrap();
}

/// Rejects its first resize, then behaves.
#[derive(Clone, Default)]
struct BusyOnce {
    inner: SharedSink,
    failed: bool,
}

impl FrameSink for BusyOnce {
    fn open(&mut self, surface: Surface) -> Result<()> {
        self.inner.open(surface)
    }

    fn resize(&mut self, surface: Surface) -> Result<()> {
        if !self.failed {
            self.failed = true;
            return Err(Error::Io(std::io::Error::other("busy")));
        }
        self.inner.resize(surface)
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.inner.present(frame)
    }
}

#[test]
fn rejected_resize_is_retried_on_next_tick() {
    let sink = BusyOnce::default();
    let shared = sink.inner.clone();
    let mut driver = FrameDriver::new(
        Params::default(),
        small_viewport(),
        LIVE_MAX_PIXEL_RATIO,
        FixedStep::new(0.0, 30.0),
        sink,
    );
    driver.start().unwrap();
    driver.tick().unwrap();

    let handle = driver.handle();
    handle.resize(Viewport::new(10, 5, 2.0));
    handle.update(ParamsPatch { line_frequency: Some(25.0), ..ParamsPatch::default() });

    assert!(driver.tick().is_err());
    assert_eq!(driver.surface(), Surface::new(12, 8));
    assert_eq!(shared.frames.lock().unwrap().len(), 1);

    assert!(driver.tick().unwrap());
    assert_eq!(driver.surface(), Surface::new(20, 10));
    assert_eq!(driver.params().line_frequency, 25.0);
    assert_eq!(*shared.resizes.lock().unwrap(), vec![Surface::new(20, 10)]);

    let frames = shared.frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].surface, Surface::new(20, 10));
}
