// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-capacity FIFO storage used by every rolling history in the controller.

use std::collections::VecDeque;

/// A circular buffer with a fixed capacity chosen at runtime.
///
/// Pushing beyond capacity evicts the oldest element. Iteration always yields
/// elements in arrival order (oldest to newest).
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a value, returning the evicted oldest value if the buffer was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.data.len() == self.capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back(value);
        evicted
    }

    /// Returns the number of elements currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when nothing has been pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns an iterator in chronological order (oldest to newest).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.data.iter()
    }

    /// Returns the most recently pushed element.
    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    /// Returns an iterator over at most the `n` most recent elements, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.data.len().saturating_sub(n);
        self.data.iter().skip(skip)
    }

    /// Removes every element, keeping the capacity.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Changes the capacity. When shrinking, the oldest elements are evicted first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.data.len() > self.capacity {
            self.data.pop_front();
        }
    }
}

impl RingBuffer<f32> {
    /// Calculates the arithmetic mean of the values in the buffer.
    pub fn average(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Difference between the mean of the newest half and the mean of the oldest half.
    /// Positive when values are increasing.
    pub fn trend(&self) -> f32 {
        let count = self.data.len();
        if count < 2 {
            return 0.0;
        }
        let half = count / 2;
        let first: f32 = self.data.iter().take(half).sum::<f32>() / half as f32;
        let last: f32 = self.data.iter().skip(count - half).sum::<f32>() / half as f32;
        last - first
    }

    /// Population variance of the values in the buffer.
    ///
    /// High variance in frame times indicates stutter.
    pub fn variance(&self) -> f32 {
        let count = self.data.len();
        if count < 2 {
            return 0.0;
        }
        let avg = self.average();
        self.data.iter().map(|v| (v - avg) * (v - avg)).sum::<f32>() / count as f32
    }

    /// Returns the minimum value, or `f32::MAX` if empty.
    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::MAX, f32::min)
    }

    /// Returns the maximum value, or `f32::MIN` if empty.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max)
    }
}
