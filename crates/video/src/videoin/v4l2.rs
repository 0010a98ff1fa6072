use {
    crate::*,
    base::Vec2,
    image::{Plane, RawFrame},
    std::{io, path::PathBuf, time::Duration},
    v4l::{
        Device, Format, FourCC, buffer::Type, io::mmap::Stream as MmapStream,
        io::traits::CaptureStream, video::Capture,
    },
};

const YU12: &[u8; 4] = b"YU12";

// number of mmap buffers queued with the driver
const BUFFER_COUNT: u32 = 4;

/// V4L2 capture in planar YU12 (I420).
#[derive(Debug, Clone)]
pub struct V4l2Config {
    pub front: PathBuf,
    pub back: PathBuf,
    pub size: Vec2<usize>,
    pub frame_rate: f32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            front: PathBuf::from("/dev/video1"),
            back: PathBuf::from("/dev/video0"),
            size: Vec2::new(480, 640),
            frame_rate: 30.0,
        }
    }
}

impl V4l2Config {
    /// Set the device paths for the front and back sensors.
    pub fn with_devices(mut self, front: impl Into<PathBuf>, back: impl Into<PathBuf>) -> Self {
        self.front = front.into();
        self.back = back.into();
        self
    }

    pub fn with_size(mut self, size: Vec2<usize>) -> Self {
        self.size = size;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    fn path_for(&self, sensor: Sensor) -> &PathBuf {
        match sensor {
            Sensor::Front => &self.front,
            Sensor::Back => &self.back,
        }
    }
}

pub(crate) struct V4l2 {
    config: V4l2Config,
    stream: Option<MmapStream<'static>>,
    size: Vec2<usize>,
    luma_stride: usize,
}

impl V4l2 {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            config,
            stream: None,
            size: Vec2::new(0, 0),
            luma_stride: 0,
        }
    }
}

impl CameraDevice for V4l2 {
    fn open(&mut self, sensor: Sensor) -> Result<CaptureFormat, VideoError> {
        self.stream.take();

        let path = self.config.path_for(sensor);
        let device = Device::with_path(path)
            .map_err(|e| VideoError::Bind(format!("{sensor} ({}): {e}", path.display())))?;

        let requested = Format::new(
            self.config.size.x as u32,
            self.config.size.y as u32,
            FourCC::new(YU12),
        );
        let actual = Capture::set_format(&device, &requested)?;
        if actual.fourcc != FourCC::new(YU12) {
            return Err(VideoError::Bind(format!(
                "{sensor} does not support YU12, got {}",
                actual.fourcc
            )));
        }
        self.size = Vec2::new(actual.width as usize, actual.height as usize);
        self.luma_stride = (actual.stride as usize).max(self.size.x);

        let params = Capture::set_params(
            &device,
            &v4l::video::capture::Parameters::with_fps(self.config.frame_rate as u32),
        )?;
        let frame_rate = params.interval.denominator as f32 / params.interval.numerator.max(1) as f32;

        let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| VideoError::Stream(e.to_string()))?;
        stream.set_timeout(Duration::from_millis(CAPTURE_TIMEOUT_MS));
        self.stream = Some(stream);

        Ok(CaptureFormat {
            size: self.size,
            frame_rate,
        })
    }

    fn close(&mut self) {
        self.stream.take();
    }

    fn blocking_capture(&mut self) -> Result<FrameLease<'_>, VideoError> {
        let size = self.size;
        let luma_stride = self.luma_stride;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| VideoError::Stream("No stream".to_string()))?;
        let (data, _metadata) = CaptureStream::next(stream).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => VideoError::Timeout,
            _ => VideoError::Stream(e.to_string()),
        })?;

        // YU12: Y plane, then U, then V, chroma rows at half the luma stride
        let chroma_stride = luma_stride / 2;
        let luma_len = luma_stride * size.y;
        let chroma_len = chroma_stride * (size.y / 2);
        if data.len() < luma_len + 2 * chroma_len {
            return Err(VideoError::Stream(format!(
                "short YU12 buffer: {} bytes",
                data.len()
            )));
        }
        let frame = RawFrame {
            size,
            y: Plane::new(&data[..luma_len], luma_stride, 1),
            u: Plane::new(&data[luma_len..luma_len + chroma_len], chroma_stride, 1),
            v: Plane::new(&data[luma_len + chroma_len..luma_len + 2 * chroma_len], chroma_stride, 1),
        };

        // the mmap buffer is requeued by the next call to `next`
        Ok(FrameLease::borrowed(frame))
    }
}
