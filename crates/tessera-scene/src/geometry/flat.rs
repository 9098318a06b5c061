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

//! The contiguous accumulation buffer.

use super::Element;

/// An append-only, auto-growing contiguous buffer.
///
/// Amortized O(1) append through the backing `Vec`'s geometric growth.
/// Because the store is already contiguous, [`combine`](Self::combine) is a
/// borrow, not a copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatBuffer<T: Element> {
    data: Vec<T>,
}

impl<T: Element> FlatBuffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Appends a single scalar.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Appends every element of a slice. A zero-length slice is a no-op.
    #[inline]
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.data.extend_from_slice(values);
    }

    /// Appends the full logical contents of another buffer.
    pub fn append(&mut self, other: &FlatBuffer<T>) {
        self.data.extend_from_slice(&other.data);
    }

    /// Positional read into the logical sequence.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.data.get(index).copied()
    }

    /// Positional write. Returns `false` when `index` is out of range.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Copies the full logical contents into `dest` starting at `offset`.
    ///
    /// # Panics
    /// Panics if `dest` is too small to hold the contents at `offset`.
    pub fn write_into(&self, dest: &mut [T], offset: usize) {
        dest[offset..offset + self.data.len()].copy_from_slice(&self.data);
    }

    /// The contiguous view of the contents. No copy is made.
    #[inline]
    pub fn combine(&self) -> &[T] {
        &self.data
    }

    /// The raw byte view of the contents, for GPU upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Adds `delta` to every element. Used to re-base index buffers when
    /// concatenating batches.
    pub fn offset(&mut self, delta: T) {
        for value in &mut self.data {
            *value = *value + delta;
        }
    }

    /// The number of elements pushed so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no elements have been pushed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops all contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// An iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }
}

impl<T: Element> From<Vec<T>> for FlatBuffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get() {
        let mut buffer = FlatBuffer::new();
        buffer.push(1u32);
        buffer.extend_from_slice(&[2, 3]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get(2), Some(3));
        assert_eq!(buffer.get(3), None);
    }

    #[test]
    fn set_out_of_range() {
        let mut buffer = FlatBuffer::from(vec![1u32, 2]);
        assert!(buffer.set(1, 9));
        assert!(!buffer.set(2, 9));
        assert_eq!(buffer.combine(), &[1, 9]);
    }

    #[test]
    fn offset_rebases_every_element() {
        let mut buffer = FlatBuffer::from(vec![0u32, 1, 2]);
        buffer.offset(10);
        assert_eq!(buffer.combine(), &[10, 11, 12]);
    }

    #[test]
    fn write_into_at_offset() {
        let buffer = FlatBuffer::from(vec![7.0f32, 8.0]);
        let mut dest = [0.0f32; 4];
        buffer.write_into(&mut dest, 1);
        assert_eq!(dest, [0.0, 7.0, 8.0, 0.0]);
    }

    #[test]
    fn zero_push_is_noop() {
        let mut buffer: FlatBuffer<f32> = FlatBuffer::new();
        buffer.extend_from_slice(&[]);
        assert!(buffer.is_empty());
    }
}
