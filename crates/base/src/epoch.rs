use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A shared run counter.
///
/// Every start of the processing loop advances the epoch. Work dispatched
/// during one run keeps the epoch it was stamped with, so a result that
/// arrives after its run was stopped can be recognised as late.
#[derive(Clone, Debug)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}

impl Epoch {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the current epoch value.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Advance to the next epoch. Returns the new epoch value.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Check if the given epoch is still current.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }
}

/// A value stamped with the epoch it was created in.
#[derive(Clone, Debug)]
pub struct Stamped<T> {
    pub epoch: u64,
    pub inner: T,
}

impl<T> Stamped<T> {
    pub fn new(epoch: &Epoch, inner: T) -> Self {
        Self {
            epoch: epoch.current(),
            inner,
        }
    }

    pub fn is_current(&self, epoch: &Epoch) -> bool {
        epoch.is_current(self.epoch)
    }
}
