//! FIFO of deferred mutations for state that only the render loop may touch.
//!
//! Producers on any thread push closures; the render loop drains the queue once per
//! frame, before it poses or draws anything.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub type Command<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

pub struct CommandQueue<T> {
    inner: Arc<Mutex<VecDeque<Command<T>>>>,
}

impl<T> Clone for CommandQueue<T> {
    fn clone(&self) -> Self {
        CommandQueue {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        CommandQueue {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T> CommandQueue<T> {
    pub fn new() -> Self {
        CommandQueue::default()
    }

    pub fn push(&self, command: impl FnOnce(&mut T) + Send + 'static) {
        self.inner.lock().push_back(Box::new(command));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run everything queued so far, oldest first, and return how many ran. Commands
    /// pushed while draining wait for the next drain. The lock is not held while a
    /// command runs.
    pub fn drain(&self, target: &mut T) -> usize {
        let batch = std::mem::take(&mut *self.inner.lock());
        let count = batch.len();
        for command in batch {
            command(target);
        }
        count
    }
}

impl<T> std::fmt::Debug for CommandQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////
