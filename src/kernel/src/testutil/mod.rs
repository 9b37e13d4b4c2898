//! Helpers shared by the unit tests.

use alloc::sync::Arc;
use alloc::task::Wake;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use core::task::Waker;
use w32sem_hal::{HandleKind, HandleOps, SignalState};

/// Payload with no state of its own, standing in for kinds this crate does
/// not implement (mutexes, events).
pub struct MarkerOps {
    kind: HandleKind,
    name: Option<&'static str>,
    closed: Arc<AtomicBool>,
}

impl MarkerOps {
    pub fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            name: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report `name` as the namespace name.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Flag set once the table reclaims the record.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl HandleOps for MarkerOps {
    fn kind(&self) -> HandleKind {
        self.kind
    }

    fn own(&mut self, state: &mut dyn SignalState) -> bool {
        state.set_signal_state(false, false);
        true
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("marker")
    }

    fn namespace_name(&self) -> Option<&str> {
        self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Waker that counts how often it was woken.
#[derive(Clone, Default)]
pub struct CountingWaker(Arc<WakeCounter>);

#[derive(Default)]
pub struct WakeCounter {
    wakes: AtomicUsize,
}

impl CountingWaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waker(&self) -> Waker {
        Waker::from(Arc::clone(&self.0))
    }

    pub fn count(&self) -> usize {
        self.0.wakes.load(Ordering::SeqCst)
    }
}

impl Wake for WakeCounter {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}

/// `SignalState` that records every transition it is asked for.
#[derive(Default)]
pub struct RecordingSignal {
    pub signaled: bool,
    pub calls: Vec<(bool, bool)>,
}

impl SignalState for RecordingSignal {
    fn is_signaled(&self) -> bool {
        self.signaled
    }

    fn set_signal_state(&mut self, signaled: bool, broadcast: bool) {
        self.signaled = signaled;
        self.calls.push((signaled, broadcast));
    }
}
