//! Sliding window over the most recent raw samples.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of raw ADC samples with a running sum.
///
/// A push onto a full buffer evicts the oldest sample; it never fails.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<i32>,
    capacity: usize,
    sum: i64,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0,
        }
    }

    pub fn push(&mut self, sample: i32) {
        if self.samples.len() == self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= i64::from(old);
            }
        }
        self.samples.push_back(sample);
        self.sum += i64::from(sample);
    }

    /// Arithmetic mean of the held samples, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum as f64 / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0;
    }
}
