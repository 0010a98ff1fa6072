use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Generation counter shared between a producer and its consumers.
///
/// Values are stamped with the generation they were produced in. Bumping the
/// counter with [`Epoch::advance`] makes every value stamped earlier stale,
/// without touching the values themselves.
#[derive(Clone, Debug)]
pub struct Epoch(Arc<AtomicU64>);

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl Epoch {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Start a new generation and return it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }

    pub fn stamp<T>(&self, inner: T) -> Stamped<T> {
        Stamped {
            epoch: self.current(),
            inner,
        }
    }
}

/// A value tagged with the generation it was produced in.
#[derive(Clone, Debug)]
pub struct Stamped<T> {
    pub epoch: u64,
    pub inner: T,
}

impl<T> Stamped<T> {
    /// Whether `epoch` has moved on since this value was stamped.
    pub fn is_stale(&self, epoch: &Epoch) -> bool {
        !epoch.is_current(self.epoch)
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_makes_earlier_stamps_stale() {
        let epoch = Epoch::new();
        let first = epoch.stamp("a");
        assert!(!first.is_stale(&epoch));

        let shared = epoch.clone();
        assert_eq!(shared.advance(), first.epoch + 1);
        assert!(first.is_stale(&epoch));
        assert!(!epoch.stamp("b").is_stale(&shared));
    }
}
