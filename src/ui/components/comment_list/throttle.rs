use tracing::trace;

/// Single-slot coalescing of notifications onto frame boundaries: any number
/// of requests between two frames yield one release.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameThrottle {
    pending: bool,
}

impl FrameThrottle {
    /// Returns `false` when a notification was already pending for this frame.
    pub fn request(&mut self) -> bool {
        if self.pending {
            trace!("Coalescing scroll notification");
            return false;
        }
        self.pending = true;
        true
    }

    /// Called on the frame tick; true at most once per pending request.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_until_the_next_frame() {
        let mut throttle = FrameThrottle::default();
        assert!(throttle.request());
        assert!(!throttle.request());
        assert!(throttle.take());
        assert!(!throttle.take());
        assert!(throttle.request());
        assert!(!throttle.request());
    }
}
