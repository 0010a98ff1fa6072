use {
    crate::*,
    base::{Epoch, Stamped},
    com::{ComError, Connection, ConnectionState, PredictionMessage, TransportHandler},
    image::{ImageError, OwnedFrame},
    std::sync::Arc,
    tokio::{runtime::Handle, task::JoinHandle},
    video::{CaptureBackend, CaptureSession, Sensor},
};

/// Receives the trimmed labels of every prediction, in arrival order.
pub type LabelCallback = Arc<dyn Fn(&[String]) + Send + Sync>;

/// A frame copied out of the capture callback.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub sensor: Sensor,
    pub frame: OwnedFrame,
}

type PendingFrame = Stamped<CapturedFrame>;

struct LabelForwarder {
    delimiter: char,
    on_labels: LabelCallback,
    stats: Arc<PipelineStats>,
}

impl TransportHandler for LabelForwarder {
    fn on_prediction(&self, message: PredictionMessage) {
        self.stats.count_prediction();
        let labels = trim_labels(&message.labels, self.delimiter);
        log::debug!("pipeline: labels {labels:?}");
        (self.on_labels)(&labels);
    }

    fn on_state(&self, state: ConnectionState) {
        log::info!("pipeline: connection {state}");
    }

    fn on_error(&self, error: &ComError) {
        log::warn!("pipeline: connection error: {error}");
    }
}

struct Streaming {
    connection: Arc<Connection>,
    worker: JoinHandle<()>,
}

/// Capture, convert, encode and stream frames; forward labels to the display.
///
/// The control methods are synchronous and must be called from a thread that
/// may block briefly (they join the capture thread).
pub struct Pipeline {
    config: OverlayConfig,
    runtime: Handle,
    session: CaptureSession,
    gate: Arc<FrameGate<PendingFrame>>,
    epoch: Epoch,
    stats: Arc<PipelineStats>,
    on_labels: LabelCallback,
    streaming: Option<Streaming>,
}

impl Pipeline {
    /// Build a stopped pipeline on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::Config` for an invalid configuration and
    /// `OverlayError::Com(ComError::NoRuntime)` outside a tokio runtime.
    pub fn new(
        config: OverlayConfig,
        backend: CaptureBackend,
        on_labels: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> Result<Self, OverlayError> {
        let runtime = Handle::try_current().map_err(|_| ComError::NoRuntime)?;
        Self::with_runtime(runtime, config, backend, on_labels)
    }

    /// Like [`Pipeline::new`], with an explicit runtime for the worker and connection.
    pub fn with_runtime(
        runtime: Handle,
        config: OverlayConfig,
        backend: CaptureBackend,
        on_labels: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> Result<Self, OverlayError> {
        config.validate()?;

        let gate = Arc::new(FrameGate::new());
        gate.close();
        let epoch = Epoch::new();
        let stats = Arc::new(PipelineStats::default());

        let session = {
            let gate = Arc::clone(&gate);
            let epoch = epoch.clone();
            let stats = Arc::clone(&stats);
            CaptureSession::new(backend, move |sensor, raw| {
                // copy now, the camera buffer goes back when this returns
                let frame = raw.to_owned_frame();
                stats.count_captured();
                match gate.submit(epoch.stamp(CapturedFrame { sensor, frame })) {
                    Admission::Superseded => stats.count_superseded(),
                    Admission::Admitted | Admission::Rejected => {}
                }
            })
        };

        Ok(Self {
            config,
            runtime,
            session,
            gate,
            epoch,
            stats,
            on_labels: Arc::new(on_labels),
            streaming: None,
        })
    }

    /// Open the connection and start streaming from `sensor`.
    ///
    /// A running pipeline is stopped first. If the camera cannot be bound the
    /// connection is closed again and the pipeline stays stopped.
    ///
    /// # Errors
    ///
    /// Returns `OverlayError::Com` for an unusable endpoint and
    /// `OverlayError::Video(VideoError::Bind)` if the sensor cannot be bound.
    pub fn start_capture(&mut self, sensor: Sensor) -> Result<(), OverlayError> {
        self.stop_capture();

        let handler = Arc::new(LabelForwarder {
            delimiter: self.config.delimiter(),
            on_labels: Arc::clone(&self.on_labels),
            stats: Arc::clone(&self.stats),
        });
        let connection = {
            let _guard = self.runtime.enter();
            Arc::new(Connection::open(self.config.endpoint(), handler)?)
        };

        self.epoch.advance();
        self.gate.reopen();
        let worker = self.runtime.spawn(run_worker(
            Arc::clone(&self.gate),
            self.epoch.clone(),
            Arc::clone(&connection),
            Arc::clone(&self.stats),
            self.config.quality(),
        ));

        if let Err(error) = self.session.start(sensor) {
            log::error!("pipeline: cannot bind {sensor}: {error}");
            self.gate.close();
            worker.abort();
            connection.close();
            return Err(error.into());
        }

        log::info!("pipeline: streaming {sensor} to {}", self.config.endpoint());
        self.streaming = Some(Streaming { connection, worker });
        Ok(())
    }

    /// Start with the configured default sensor.
    pub fn start_default(&mut self) -> Result<(), OverlayError> {
        self.start_capture(self.config.sensor())
    }

    /// Rebind the opposite sensor, keeping the connection.
    ///
    /// Frames from the old sensor still waiting in the gate are discarded, and
    /// any that slip through are dropped by the worker before conversion.
    /// Returns the new sensor. If it cannot be bound, streaming stops.
    pub fn switch_sensor(&mut self) -> Result<Sensor, OverlayError> {
        let current = self.session.sensor().ok_or(video::VideoError::Inactive)?;
        let next = current.opposite();

        self.session.stop();
        self.epoch.advance();
        self.gate.clear();

        if let Err(error) = self.session.start(next) {
            log::error!("pipeline: cannot switch to {next}: {error}");
            self.stop_capture();
            return Err(error.into());
        }
        log::info!("pipeline: switched {current} -> {next}");
        Ok(next)
    }

    /// Stop the camera, the worker and the connection. Does nothing when stopped.
    pub fn stop_capture(&mut self) {
        self.session.stop();
        let Some(streaming) = self.streaming.take() else {
            return;
        };
        self.epoch.advance();
        self.gate.close();
        streaming.worker.abort();
        streaming.connection.close();
        log::info!("pipeline: stopped");
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    pub fn sensor(&self) -> Option<Sensor> {
        self.session.sensor()
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.streaming
            .as_ref()
            .map(|streaming| streaming.connection.state())
    }

    /// Wait until the connection handshake has finished, if streaming.
    pub async fn wait_connected(&self) -> Option<ConnectionState> {
        let connection = Arc::clone(&self.streaming.as_ref()?.connection);
        Some(connection.wait_settled().await)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

async fn run_worker(
    gate: Arc<FrameGate<PendingFrame>>,
    epoch: Epoch,
    connection: Arc<Connection>,
    stats: Arc<PipelineStats>,
    quality: u8,
) {
    while let Some(pending) = gate.next().await {
        if pending.is_stale(&epoch) {
            stats.count_stale();
            continue;
        }
        let CapturedFrame { sensor, frame } = pending.into_inner();
        match image::transcode(frame, quality).await {
            Ok(encoded) => {
                let len = encoded.data.len();
                if connection.send(encoded.data) {
                    stats.count_sent();
                    log::trace!("pipeline: sent {len} byte frame from {sensor}");
                } else {
                    stats.count_skipped();
                }
            }
            Err(ImageError::Conversion(msg)) => {
                stats.count_conversion_failure();
                log::warn!("pipeline: dropping {sensor} frame, conversion failed: {msg}");
            }
            Err(error) => {
                stats.count_encoding_failure();
                log::warn!("pipeline: dropping {sensor} frame: {error}");
            }
        }
    }
    log::debug!("pipeline: worker finished");
}
