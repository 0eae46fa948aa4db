use {
    crate::*,
    base::{Epoch, Stamped},
    tokio::task::JoinHandle,
};

/// One open camera+channel pairing.
///
/// The channel itself outlives sessions and is held by the controller.
/// Dropping a session stops its camera and its timer.
pub struct Session {
    source: Option<Box<dyn FrameSource>>,
    camera_pending: bool,
    timer: Option<JoinHandle<()>>,
    epoch: Epoch,
    // sequence number of the frame awaiting a result, stamped with its run
    in_flight: Option<Stamped<u64>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Epoch::new())
    }
}

impl Session {
    /// `epoch` is shared with earlier sessions so their ticks stay stale.
    pub fn new(epoch: Epoch) -> Self {
        Self {
            source: None,
            camera_pending: false,
            timer: None,
            epoch,
            in_flight: None,
        }
    }

    pub fn has_camera(&self) -> bool {
        self.source.as_ref().is_some_and(|source| source.is_active())
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn epoch(&self) -> &Epoch {
        &self.epoch
    }

    pub(crate) fn source(&self) -> Option<&dyn FrameSource> {
        self.source.as_deref()
    }

    pub(crate) fn camera_pending(&self) -> bool {
        self.camera_pending
    }

    pub(crate) fn set_camera_pending(&mut self, pending: bool) {
        self.camera_pending = pending;
    }

    pub(crate) fn attach_camera(&mut self, source: Box<dyn FrameSource>) {
        self.stop_camera();
        self.source = Some(source);
    }

    pub(crate) fn stop_camera(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
    }

    /// Begin a new run with `timer` driving it. Returns the run's epoch.
    pub(crate) fn start_run(&mut self, timer: impl FnOnce(u64) -> JoinHandle<()>) -> u64 {
        self.stop_run();
        let run = self.epoch.advance();
        self.timer = Some(timer(run));
        run
    }

    /// Cancel future ticks. A frame already sent stays in flight.
    pub(crate) fn stop_run(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub(crate) fn mark_in_flight(&mut self, sequence: u64) {
        self.in_flight = Some(Stamped::new(&self.epoch, sequence));
    }

    /// Clear the in-flight flag, returning the frame it guarded.
    pub(crate) fn clear_in_flight(&mut self) -> Option<Stamped<u64>> {
        self.in_flight.take()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_run();
        self.stop_camera();
    }
}
