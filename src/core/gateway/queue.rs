use crate::core::protocol::codec::COMMAND_TERMINATOR;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Thread-safe FIFO of outbound gateway commands.
///
/// Cloning yields another handle to the same queue. The lock is only held
/// for bookkeeping; callers write popped commands after it is released.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<String>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a command, terminating it with `\r` if needed
    pub fn enqueue(&self, command: impl Into<String>) {
        let mut command = command.into();
        if !command.ends_with(COMMAND_TERMINATOR) {
            command.push(COMMAND_TERMINATOR);
        }
        debug!(command = %command.trim_end(), "Command queued");
        self.lock().push_back(command);
    }

    /// Remove and return the oldest command
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every pending command
    pub fn clear(&self) {
        self.lock().clear();
    }
}
