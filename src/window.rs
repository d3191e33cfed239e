use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;

/// Returned by [`WindowBuffer::at`] when the logical index is not live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window index {} is out of range for {} live element(s)",
            self.index, self.len
        )
    }
}

impl std::error::Error for IndexOutOfRange {}

/// A fixed-capacity FIFO connected end to end.
///
/// Elements are addressed by their logical position from the oldest live
/// element. Pushing into a full buffer evicts the oldest element.
#[derive(Clone)]
pub struct WindowBuffer<T> {
    storage: Vec<T>,
    capacity: usize,
    start: usize,
    end: usize,
    count: usize,
}

impl<T: Copy> WindowBuffer<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be greater than 0");
        Self {
            storage: Vec::with_capacity(capacity),
            capacity,
            start: 0,
            end: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
        self.count = 0;
    }

    /// Appends `item`, returning the evicted element if the buffer was full.
    pub fn push_back(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.pop_front()
        } else {
            None
        };

        // Slots past storage.len() have never been written.
        if self.end == self.storage.len() {
            self.storage.push(item);
        } else {
            self.storage[self.end] = item;
        }
        self.end = self.wrap_physical(self.end + 1);
        self.count += 1;
        evicted
    }

    /// Removes and returns the oldest element; `None` if empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.storage[self.start];
        self.start = self.wrap_physical(self.start + 1);
        self.count -= 1;
        Some(item)
    }

    pub fn front(&self) -> Option<T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<T> {
        self.count.checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn get(&self, index: usize) -> Option<T> {
        if index < self.count {
            Some(self.storage[self.physical(index)])
        } else {
            None
        }
    }

    /// Checked random access by logical index.
    pub fn at(&self, index: usize) -> Result<T, IndexOutOfRange> {
        self.get(index).ok_or(IndexOutOfRange {
            index,
            len: self.count,
        })
    }

    /// Live elements, oldest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            front: 0,
            back: self.count,
        }
    }

    /// Live elements starting at logical position `from`, wrapping back to
    /// the oldest element after the newest one.
    pub fn rotate_iter(&self, from: usize) -> impl Iterator<Item = T> + '_ {
        let live = self.count;
        (0..live).map(move |step| {
            let logical = (from + step) % live;
            self.storage[self.physical(logical)]
        })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    // Storage slot of a logical index. Wraps modulo capacity; logical
    // positions are bounded by count in the callers.
    fn physical(&self, logical: usize) -> usize {
        self.wrap_physical(self.start + logical)
    }

    fn wrap_physical(&self, slot: usize) -> usize {
        slot % self.capacity
    }
}

impl<T: Copy> Index<usize> for WindowBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(
            index < self.count,
            "window index {} out of range for {} live element(s)",
            index,
            self.count
        );
        &self.storage[self.physical(index)]
    }
}

impl<T: Copy> Extend<T> for WindowBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for WindowBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowBuffer")
            .field("capacity", &self.capacity)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("items", &self.to_vec())
            .finish()
    }
}

impl<'a, T: Copy> IntoIterator for &'a WindowBuffer<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Iterator over the live elements of a [`WindowBuffer`].
///
/// `front` and `back` are logical positions in `0..=count`, so iteration
/// stops at the last live element rather than at the end of storage.
pub struct Iter<'a, T> {
    buffer: &'a WindowBuffer<T>,
    front: usize,
    back: usize,
}

impl<T: Copy> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let item = self.buffer.storage[self.buffer.physical(self.front)];
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T: Copy> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.buffer.storage[self.buffer.physical(self.back)])
    }
}

impl<T: Copy> ExactSizeIterator for Iter<'_, T> {}

impl<T: Copy> FusedIterator for Iter<'_, T> {}
