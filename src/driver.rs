use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::{Params, ParamsPatch};
use crate::error::{Error, Result};
use crate::render::{render_frame, save_png};
use crate::surface::{Surface, Viewport};

/// Source of elapsed seconds since the animation started.
pub trait Clock {
    fn now(&mut self) -> f64;
}

/// Wall-clock time from a monotonic `Instant`.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Advances a fixed `1 / fps` per reading, starting at `start`. For
/// offline rendering and tests.
pub struct FixedStep {
    start: f64,
    fps: f64,
    frame: u64,
}

impl FixedStep {
    pub fn new(start: f64, fps: f64) -> Self {
        Self { start, fps: fps.max(1e-3), frame: 0 }
    }
}

impl Clock for FixedStep {
    fn now(&mut self) -> f64 {
        let t = self.start + self.frame as f64 / self.fps;
        self.frame += 1;
        t
    }
}

/// One rendered frame handed to the display.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: u64,
    pub time: f64,
    pub surface: Surface,
    pub rgba: Vec<u8>,
}

/// Display collaborator that receives rendered frames.
pub trait FrameSink {
    /// Acquire whatever the sink draws into. An error here means there is
    /// nothing to render to; the driver reports it and never starts.
    fn open(&mut self, surface: Surface) -> Result<()>;

    fn resize(&mut self, _surface: Surface) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Release resources. Called once when the driver stops.
    fn close(&mut self) {}
}

/// Messages from outside the frame loop. Drained at the top of each tick.
#[derive(Clone, Debug)]
pub enum Event {
    Resize(Viewport),
    Update(ParamsPatch),
    Stop,
}

/// Cloneable sender for driver events. Safe to use from other threads.
#[derive(Clone)]
pub struct DriverHandle {
    tx: Sender<Event>,
}

impl DriverHandle {
    /// Returns false once the driver has been dropped.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn resize(&self, viewport: Viewport) -> bool {
        self.send(Event::Resize(viewport))
    }

    pub fn update(&self, patch: ParamsPatch) -> bool {
        self.send(Event::Update(patch))
    }

    pub fn stop(&self) -> bool {
        self.send(Event::Stop)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Stopped,
}

/// Owns the surface, elapsed time and current parameters, and runs the
/// pipeline once per tick. Single-threaded; rendering inside a tick fans
/// out over rayon.
pub struct FrameDriver<C: Clock, S: FrameSink> {
    params: Params,
    surface: Surface,
    /// Requested surface the sink has not accepted yet.
    pending_surface: Option<Surface>,
    max_pixel_ratio: f64,
    time: f64,
    frames: u64,
    state: DriverState,
    clock: C,
    sink: S,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl<C: Clock, S: FrameSink> FrameDriver<C, S> {
    pub fn new(params: Params, viewport: Viewport, max_pixel_ratio: f64, clock: C, sink: S) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut params = params;
        params.sanitize();
        Self {
            params,
            surface: viewport.surface(max_pixel_ratio),
            pending_surface: None,
            max_pixel_ratio,
            time: 0.0,
            frames: 0,
            state: DriverState::Idle,
            clock,
            sink,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle { tx: self.tx.clone() }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Open the sink and begin accepting ticks.
    pub fn start(&mut self) -> Result<()> {
        if self.state != DriverState::Idle {
            return Ok(());
        }
        self.sink.open(self.surface).map_err(|e| match e {
            Error::BackendUnavailable(_) => e,
            other => Error::BackendUnavailable(other.to_string()),
        })?;
        self.state = DriverState::Running;
        info!(
            "frame loop started at {}x{} ({:?})",
            self.surface.width, self.surface.height, self.params.variant
        );
        Ok(())
    }

    /// Stop scheduling frames and release the sink. Idempotent.
    pub fn stop(&mut self) {
        if self.state == DriverState::Running {
            self.sink.close();
            info!("frame loop stopped after {} frames", self.frames);
        }
        self.state = DriverState::Stopped;
    }

    /// Apply queued events. Resizes collapse to the last one so a frame
    /// never sees an intermediate size. A resize the sink rejects stays
    /// pending and is retried on the next tick. Returns false if a stop was
    /// queued.
    fn drain_events(&mut self) -> Result<bool> {
        let mut keep_running = true;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Event::Resize(viewport) => {
                    self.pending_surface = Some(viewport.surface(self.max_pixel_ratio))
                }
                Event::Update(patch) => self.params.apply(&patch),
                Event::Stop => keep_running = false,
            }
        }
        if !keep_running {
            return Ok(false);
        }
        if let Some(surface) = self.pending_surface {
            if surface != self.surface {
                if let Err(e) = self.sink.resize(surface) {
                    warn!("resize to {}x{} failed, retrying next frame: {e}", surface.width, surface.height);
                    return Err(e);
                }
                info!("surface resized to {}x{}", surface.width, surface.height);
                self.surface = surface;
            }
            self.pending_surface = None;
        }
        Ok(true)
    }

    /// Render and present one frame. Returns Ok(false) when the driver is
    /// not running or a stop was requested.
    pub fn tick(&mut self) -> Result<bool> {
        if self.state != DriverState::Running {
            return Ok(false);
        }
        if !self.drain_events()? {
            self.stop();
            return Ok(false);
        }

        // Snapshot: the whole frame sees one parameter set and one size.
        let params = self.params.clone();
        let surface = self.surface;
        self.time = self.clock.now().max(self.time);

        let started = Instant::now();
        let rgba = render_frame(surface, self.time, &params);
        let frame = Frame { index: self.frames, time: self.time, surface, rgba };
        self.sink.present(&frame)?;
        debug!(
            "frame {} t={:.3}s rendered in {:.1} ms",
            frame.index,
            frame.time,
            started.elapsed().as_secs_f64() * 1000.0
        );
        self.frames += 1;
        Ok(true)
    }

    /// Tick until stopped or `max_frames` have been presented, pacing to
    /// `frame_interval` when given. Returns the number of frames rendered.
    pub fn run(&mut self, max_frames: Option<u64>, frame_interval: Option<Duration>) -> Result<u64> {
        self.start()?;
        let first = self.frames;
        loop {
            if max_frames.is_some_and(|n| self.frames - first >= n) {
                self.stop();
                break;
            }
            let tick_start = Instant::now();
            if !self.tick()? {
                break;
            }
            if let Some(interval) = frame_interval {
                if let Some(rest) = interval.checked_sub(tick_start.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }
        Ok(self.frames - first)
    }
}

impl<C: Clock, S: FrameSink> Drop for FrameDriver<C, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Writes every presented frame to `dir/frame_NNNNN.png`.
pub struct PngSequence {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: Vec::new() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for PngSequence {
    fn open(&mut self, _surface: Surface) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::BackendUnavailable(format!("cannot create {}: {e}", self.dir.display()))
        })
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        let path = self.dir.join(format!("frame_{:05}.png", frame.index));
        save_png(&path, &frame.rgba, frame.surface)?;
        info!("Saved {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
