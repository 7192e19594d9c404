//! Level-triggered cancellation token shared between a caller and a
//! running `BootstrapRequest`. Grounded on the teacher's
//! `Arc<AtomicBool>` interrupt flag: cheap to check, safe to set from
//! any thread, and never itself blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn as_atomic(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}
