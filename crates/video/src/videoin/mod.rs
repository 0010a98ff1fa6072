use {
    crate::*,
    base::Vec2,
    image::RawFrame,
    std::{
        panic::{AssertUnwindSafe, catch_unwind},
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
            mpsc,
        },
        thread::{self, JoinHandle},
        time::Duration,
    },
};

// delay before reopening the device after a capture failure
const WAIT_BEFORE_REOPEN_MS: u64 = 100;

/// Longest a device may block in `blocking_capture` before returning `VideoError::Timeout`.
pub const CAPTURE_TIMEOUT_MS: u64 = 200;

// consecutive timeouts before the device is treated as failed and reopened
const MAX_CAPTURE_TIMEOUTS: usize = 10;

/// Format negotiated with the device when a sensor is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureFormat {
    pub size: Vec2<usize>,
    pub frame_rate: f32,
}

/// A camera backend driven by the capture thread.
///
/// `open` and `blocking_capture` are always called from the same OS thread.
pub trait CameraDevice: Send {
    /// Bind the given sensor and return the format that was actually set.
    fn open(&mut self, sensor: Sensor) -> Result<CaptureFormat, VideoError>;
    /// Unbind the sensor, if bound.
    fn close(&mut self);
    /// Block until the next frame is available and lend it out.
    ///
    /// Returns `VideoError::Timeout` instead of blocking longer than
    /// [`CAPTURE_TIMEOUT_MS`], so the session can notice a stop request.
    fn blocking_capture(&mut self) -> Result<FrameLease<'_>, VideoError>;
}

#[derive(Debug, Clone)]
pub enum CaptureBackend {
    Synthetic(synthetic::SyntheticConfig),
    #[cfg(feature = "v4l2")]
    V4l2(v4l2::V4l2Config),
}

impl Default for CaptureBackend {
    fn default() -> Self {
        CaptureBackend::Synthetic(synthetic::SyntheticConfig::default())
    }
}

impl CaptureBackend {
    fn create_device(&self) -> Box<dyn CameraDevice> {
        match self {
            CaptureBackend::Synthetic(config) => {
                Box::new(synthetic::SyntheticCamera::new(config.clone()))
            }
            #[cfg(feature = "v4l2")]
            CaptureBackend::V4l2(config) => Box::new(v4l2::V4l2::new(config.clone())),
        }
    }
}

/// Called on the capture thread for every frame, tagged with the sensor that produced it.
pub type FrameCallback = Arc<dyn Fn(Sensor, &RawFrame<'_>) + Send + Sync>;

struct Binding {
    sensor: Sensor,
    format: CaptureFormat,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Owns the camera and delivers frames from one sensor at a time.
pub struct CaptureSession {
    backend: CaptureBackend,
    on_frame: FrameCallback,
    binding: Option<Binding>,
}

impl CaptureSession {
    pub fn new(
        backend: CaptureBackend,
        on_frame: impl Fn(Sensor, &RawFrame<'_>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            backend,
            on_frame: Arc::new(on_frame),
            binding: None,
        }
    }

    fn spawn_worker(
        &self,
        sensor: Sensor,
        cancel: Arc<AtomicBool>,
    ) -> Result<(JoinHandle<()>, CaptureFormat), VideoError> {
        let mut device = self.backend.create_device();
        let on_frame = Arc::clone(&self.on_frame);

        // the device is opened on the worker thread itself, the result comes back here
        let (init_tx, init_rx) = mpsc::channel::<Result<CaptureFormat, VideoError>>();

        let thread = thread::Builder::new()
            .name(format!("capture-{sensor}"))
            .spawn(move || {
                let mut format = match device.open(sensor) {
                    Ok(format) => {
                        let _ = init_tx.send(Ok(format));
                        format
                    }
                    Err(error) => {
                        let _ = init_tx.send(Err(error));
                        return;
                    }
                };

                while !cancel.load(Ordering::Acquire) {
                    log::info!("capture worker: {sensor} streaming {}", format.size);
                    let mut timeouts = 0;
                    while !cancel.load(Ordering::Acquire) {
                        match device.blocking_capture() {
                            Err(VideoError::Timeout) => {
                                timeouts += 1;
                                if timeouts >= MAX_CAPTURE_TIMEOUTS {
                                    log::error!("capture worker: {sensor} stopped delivering frames");
                                    break;
                                }
                                log::debug!("capture worker: {sensor} capture timed out");
                            }
                            Ok(lease) => {
                                timeouts = 0;
                                let delivered =
                                    catch_unwind(AssertUnwindSafe(|| on_frame(sensor, lease.frame())));
                                drop(lease);
                                if delivered.is_err() {
                                    log::error!("capture worker: frame callback panicked, frame dropped");
                                }
                            }
                            Err(error) => {
                                log::error!("capture worker: capture failed: {error}");
                                break;
                            }
                        }
                    }

                    // close, wait, and reopen the same sensor
                    while !cancel.load(Ordering::Acquire) {
                        log::info!("capture worker: reopening {sensor}");
                        device.close();
                        thread::sleep(Duration::from_millis(WAIT_BEFORE_REOPEN_MS));
                        match device.open(sensor) {
                            Ok(new_format) => {
                                format = new_format;
                                break;
                            }
                            Err(error) => log::warn!("capture worker: reopen failed: {error}"),
                        }
                    }
                }
                device.close();
                log::debug!("capture worker: {sensor} released");
            })?;

        match init_rx.recv() {
            Ok(Ok(format)) => Ok((thread, format)),
            Ok(Err(error)) => {
                let _ = thread.join();
                Err(match error {
                    VideoError::Bind(_) => error,
                    other => VideoError::Bind(other.to_string()),
                })
            }
            Err(_) => {
                let _ = thread.join();
                Err(VideoError::Bind(
                    "capture worker died while binding".to_string(),
                ))
            }
        }
    }

    /// Bind `sensor` and start delivering frames.
    ///
    /// Any existing binding is torn down first. On failure the session stays stopped.
    pub fn start(&mut self, sensor: Sensor) -> Result<CaptureFormat, VideoError> {
        self.stop();
        let cancel = Arc::new(AtomicBool::new(false));
        let (thread, format) = self.spawn_worker(sensor, Arc::clone(&cancel))?;
        log::info!("capture session: bound {sensor} at {} {} fps", format.size, format.frame_rate);
        self.binding = Some(Binding {
            sensor,
            format,
            cancel,
            thread,
        });
        Ok(format)
    }

    /// Rebind with the opposite sensor.
    ///
    /// The old capture thread is joined before the new sensor is opened, so no
    /// two sensors ever deliver frames concurrently. Returns the new sensor.
    /// If the opposite sensor cannot be bound, the session ends up stopped.
    pub fn switch(&mut self) -> Result<Sensor, VideoError> {
        let next = self.sensor().ok_or(VideoError::Inactive)?.opposite();
        self.start(next)?;
        Ok(next)
    }

    /// Unbind the sensor and release the camera. Does nothing when already stopped.
    pub fn stop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.cancel.store(true, Ordering::Release);
            if binding.thread.join().is_err() {
                log::error!("capture session: {} worker panicked", binding.sensor);
            }
            log::info!("capture session: stopped {}", binding.sensor);
        }
    }

    pub fn is_running(&self) -> bool {
        self.binding.is_some()
    }

    pub fn sensor(&self) -> Option<Sensor> {
        self.binding.as_ref().map(|binding| binding.sensor)
    }

    pub fn format(&self) -> Option<CaptureFormat> {
        self.binding.as_ref().map(|binding| binding.format)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

pub mod synthetic;

#[cfg(feature = "v4l2")]
pub mod v4l2;
