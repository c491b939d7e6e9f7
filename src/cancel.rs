use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared flag asking a download to stop. Checked between chunks, never mid-chunk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Cancel, returning whether a cancel had already been requested
    pub fn request_cancel(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn second_request_reports_earlier_cancel() {
        let token = CancelToken::new();
        let handler = token.clone();

        assert!(!handler.request_cancel());
        assert!(token.is_cancelled());
        assert!(handler.request_cancel());
    }
}
