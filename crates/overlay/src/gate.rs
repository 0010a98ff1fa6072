use {
    std::sync::Mutex,
    tokio::sync::Notify,
};

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The slot was empty.
    Admitted,
    /// An older, untaken frame was discarded to make room.
    Superseded,
    /// The gate is closed and the frame was dropped.
    Rejected,
}

struct Slot<T> {
    pending: Option<T>,
    closed: bool,
}

/// Single-slot admission control between the capture thread and the worker.
///
/// Only the newest frame is kept. A frame is handed out at most once and
/// never waits behind another one.
pub struct FrameGate<T> {
    slot: Mutex<Slot<T>>,
    notify: Notify,
}

impl<T> Default for FrameGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameGate<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `frame` the pending frame, discarding any frame not yet taken.
    pub fn submit(&self, frame: T) -> Admission {
        let admission = {
            let mut slot = self.lock();
            if slot.closed {
                return Admission::Rejected;
            }
            match slot.pending.replace(frame) {
                Some(_) => Admission::Superseded,
                None => Admission::Admitted,
            }
        };
        self.notify.notify_one();
        admission
    }

    /// Hand off the pending frame, leaving the slot empty.
    pub fn take_next(&self) -> Option<T> {
        self.lock().pending.take()
    }

    /// Wait for the next frame. Returns `None` once the gate is closed.
    pub async fn next(&self) -> Option<T> {
        loop {
            {
                let mut slot = self.lock();
                if slot.closed {
                    return None;
                }
                if let Some(frame) = slot.pending.take() {
                    return Some(frame);
                }
            }
            // a permit left by submit() or close() wakes this immediately
            self.notify.notified().await;
        }
    }

    /// Drop the pending frame, if any.
    pub fn clear(&self) {
        self.lock().pending = None;
    }

    /// Reject further frames, drop the pending one and wake the consumer.
    pub fn close(&self) {
        {
            let mut slot = self.lock();
            slot.closed = true;
            slot.pending = None;
        }
        self.notify.notify_one();
    }

    /// Accept frames again after [`FrameGate::close`].
    pub fn reopen(&self) {
        self.lock().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
