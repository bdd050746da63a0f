//! Dirty-flag redraw scheduling, one frame per display refresh.
//!
//! Mutations call [`FrameScheduler::invalidate`]; the host delivers
//! [`FrameScheduler::on_frame`] on its next refresh tick. At most one frame
//! request is outstanding at a time, so bursts of pointer moves or container
//! resizes collapse into a single redraw. While a drag is live the scheduler
//! animates: it requests a new frame after every tick until animation stops.

/// Token identifying one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// The host's "call me on the next display refresh" facility.
pub trait FrameHost {
    /// Schedule a callback for the next refresh tick.
    fn request_frame(&mut self, token: FrameToken);

    /// Cancel a previously requested callback.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// A host that never calls back; the owner renders synchronously instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualFrameHost;

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self, _token: FrameToken) {}

    fn cancel_frame(&mut self, _token: FrameToken) {}
}

/// Tracks dirtiness and the single outstanding frame request.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    dirty: bool,
    animating: bool,
    pending: Option<FrameToken>,
    next_token: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view dirty and make sure a frame is requested.
    pub fn invalidate(&mut self, host: &mut dyn FrameHost) {
        self.dirty = true;
        self.ensure_requested(host);
    }

    /// Enter animation mode (a drag started).
    pub fn start_animation(&mut self, host: &mut dyn FrameHost) {
        if !self.animating {
            log::debug!("Frame loop started");
        }
        self.animating = true;
        self.ensure_requested(host);
    }

    /// Leave animation mode (the drag ended or was cancelled).
    ///
    /// The outstanding request is cancelled unless there is still something to draw.
    pub fn stop_animation(&mut self, host: &mut dyn FrameHost) {
        if self.animating {
            log::debug!("Frame loop stopped");
        }
        self.animating = false;
        if !self.dirty {
            self.cancel(host);
        }
    }

    /// A refresh tick arrived for `token`.
    ///
    /// Returns `true` if the caller should redraw now. Stale tokens are ignored.
    pub fn on_frame(&mut self, token: FrameToken, host: &mut dyn FrameHost) -> bool {
        if self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        let draw = std::mem::take(&mut self.dirty);
        if self.animating {
            self.ensure_requested(host);
        }
        draw
    }

    /// Cancel any outstanding request and stop animating. Used on teardown.
    pub fn shutdown(&mut self, host: &mut dyn FrameHost) {
        self.animating = false;
        self.dirty = false;
        self.cancel(host);
    }

    /// Clear the dirty flag after a synchronous redraw.
    pub fn mark_drawn(&mut self) {
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    fn ensure_requested(&mut self, host: &mut dyn FrameHost) {
        if self.pending.is_some() {
            return;
        }
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        host.request_frame(token);
    }

    fn cancel(&mut self, host: &mut dyn FrameHost) {
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
        }
    }
}
