use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO handoff between a producer thread and the main thread.
///
/// The only synchronisation primitive crossing the thread boundary: `push`
/// never blocks (on overflow the oldest element is dropped to make room) and
/// `pop` returns immediately when empty.
#[derive(Debug)]
pub struct BatchQueue<T> {
    inner: Mutex<VecDeque<T>>,
    max_capacity: usize,
}

impl<T> BatchQueue<T> {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(max_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            max_capacity: max_capacity.max(1),
        }
    }

    /// Enqueue, dropping the oldest element if the queue is full.
    pub fn push(&self, item: T) {
        let mut q = self.inner.lock().expect("batch queue poisoned");
        if q.len() >= self.max_capacity {
            q.pop_front();
        }
        q.push_back(item);
    }

    /// Dequeue the oldest element, or `None` immediately when empty.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().expect("batch queue poisoned").pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("batch queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().expect("batch queue poisoned").clear();
    }
}

impl<T> Default for BatchQueue<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
