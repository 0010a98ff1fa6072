use {
    crate::*,
    base::Vec2,
    image::{OwnedFrame, PlaneLayout},
    std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::{Duration, Instant},
    },
};

// a stalled synthetic device times out much sooner than a real one
const STALL_TIMEOUT_MS: u64 = 20;

/// Shared counters for observing the synthetic device from outside the capture thread.
#[derive(Debug, Clone, Default)]
pub struct CaptureCounters {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    captured: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl CaptureCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Test-pattern camera with configurable memory layout.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub size: Vec2<usize>,
    /// Frames per second; 0 delivers frames as fast as they are consumed.
    pub frame_rate: f32,
    pub layout: PlaneLayout,
    /// Sensors that refuse to bind.
    pub unavailable: Vec<Sensor>,
    /// Fail the capture after this many frames per binding, forcing a reopen.
    pub fail_after: Option<usize>,
    /// Stop delivering frames after this many per binding; captures then time out.
    pub stall_after: Option<usize>,
    pub counters: CaptureCounters,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(480, 640),
            frame_rate: 30.0,
            layout: PlaneLayout::padded_interleaved(32),
            unavailable: Vec::new(),
            fail_after: None,
            stall_after: None,
            counters: CaptureCounters::default(),
        }
    }
}

impl SyntheticConfig {
    pub fn with_size(mut self, size: Vec2<usize>) -> Self {
        self.size = size;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_layout(mut self, layout: PlaneLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_unavailable(mut self, sensor: Sensor) -> Self {
        self.unavailable.push(sensor);
        self
    }

    pub fn with_fail_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn with_stall_after(mut self, frames: usize) -> Self {
        self.stall_after = Some(frames);
        self
    }

    pub fn counters(&self) -> &CaptureCounters {
        &self.counters
    }

    /// Base luma of the pattern produced by `sensor`, so frames can be traced back to it.
    pub fn luma_for(sensor: Sensor) -> u8 {
        match sensor {
            Sensor::Front => 64,
            Sensor::Back => 192,
        }
    }

    /// `(u, v)` of the pattern produced by `sensor`.
    pub fn chroma_for(sensor: Sensor) -> (u8, u8) {
        match sensor {
            Sensor::Front => (100, 160),
            Sensor::Back => (160, 100),
        }
    }

    fn render(&self, sensor: Sensor) -> OwnedFrame {
        let luma = Self::luma_for(sensor);
        let chroma = Self::chroma_for(sensor);
        OwnedFrame::from_fn(
            self.size,
            self.layout,
            |x, y| if (x / 16 + y / 16) % 2 == 0 { luma } else { luma - 8 },
            |_, _| chroma,
        )
    }
}

pub(crate) struct SyntheticCamera {
    config: SyntheticConfig,
    frame: Option<OwnedFrame>,
    captured_since_open: usize,
    next_deadline: Option<Instant>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame: None,
            captured_since_open: 0,
            next_deadline: None,
        }
    }

    fn pace(&mut self) {
        if self.config.frame_rate <= 0.0 {
            return;
        }
        let interval = Duration::from_secs_f32(1.0 / self.config.frame_rate);
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            thread::sleep(deadline - now);
        }
        self.next_deadline = Some(deadline.max(now) + interval);
    }
}

impl CameraDevice for SyntheticCamera {
    fn open(&mut self, sensor: Sensor) -> Result<CaptureFormat, VideoError> {
        if self.config.unavailable.contains(&sensor) {
            return Err(VideoError::Bind(format!("{sensor} sensor unavailable")));
        }
        self.close();
        self.frame = Some(self.config.render(sensor));
        self.captured_since_open = 0;
        self.next_deadline = None;
        self.config.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureFormat {
            size: self.config.size,
            frame_rate: self.config.frame_rate,
        })
    }

    fn close(&mut self) {
        if self.frame.take().is_some() {
            self.config.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn blocking_capture(&mut self) -> Result<FrameLease<'_>, VideoError> {
        if self.frame.is_none() {
            return Err(VideoError::Stream("device not open".to_string()));
        }
        if let Some(limit) = self.config.fail_after {
            if self.captured_since_open >= limit {
                return Err(VideoError::Stream("synthetic capture failure".to_string()));
            }
        }
        if let Some(limit) = self.config.stall_after {
            if self.captured_since_open >= limit {
                thread::sleep(Duration::from_millis(STALL_TIMEOUT_MS));
                return Err(VideoError::Timeout);
            }
        }
        self.pace();
        self.captured_since_open += 1;
        self.config.counters.captured.fetch_add(1, Ordering::SeqCst);

        let released = Arc::clone(&self.config.counters.released);
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| VideoError::Stream("device not open".to_string()))?;
        Ok(FrameLease::new(frame.as_raw(), move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
