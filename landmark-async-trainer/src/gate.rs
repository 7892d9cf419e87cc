use std::sync::{Condvar, Mutex};

/// One-shot signal that the replay memory holds its initial transitions.
///
/// Consumers block in [`InitGate::wait`] until [`InitGate::open`] is called.
/// Once open, the gate stays open.
#[derive(Default)]
pub struct InitGate {
    open: Mutex<bool>,
    cvar: Condvar,
}

impl InitGate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate, waking up all waiting threads.
    pub fn open(&self) {
        let mut open = self.open.lock().unwrap();
        *open = true;
        self.cvar.notify_all();
    }

    /// `true` once opened.
    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    /// Blocks until the gate is opened.
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cvar.wait(open).unwrap();
        }
    }
}
