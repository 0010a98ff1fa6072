use image::RawFrame;

/// A camera buffer lent out for the duration of one capture callback.
///
/// Dropping the lease hands the buffer back to the device, exactly once.
pub struct FrameLease<'a> {
    frame: RawFrame<'a>,
    release: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> FrameLease<'a> {
    pub fn new(frame: RawFrame<'a>, release: impl FnOnce() + 'a) -> Self {
        Self {
            frame,
            release: Some(Box::new(release)),
        }
    }

    /// Lease whose buffer is reclaimed implicitly by the device on the next capture.
    pub fn borrowed(frame: RawFrame<'a>) -> Self {
        Self {
            frame,
            release: None,
        }
    }

    pub fn frame(&self) -> &RawFrame<'a> {
        &self.frame
    }
}

impl Drop for FrameLease<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for FrameLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLease")
            .field("size", &self.frame.size)
            .field("pending_release", &self.release.is_some())
            .finish()
    }
}
