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

//! The chunked accumulation buffer.

use super::Element;

/// The default per-chunk element capacity.
const DEFAULT_CHUNK_CAPACITY: usize = 512;

/// An append-only buffer stored as fixed-capacity chunks.
///
/// Growth allocates a new chunk instead of reallocating and copying what
/// was already pushed, so long accumulation runs never move earlier data.
/// Positional access binary-searches a prefix-sum table: chunk `i` owns the
/// half-open logical range `[starts[i], starts[i] + chunks[i].len())`.
///
/// A single push larger than the chunk capacity spills into a dedicated
/// exactly-sized chunk rather than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentedBuffer<T: Element> {
    chunks: Vec<Vec<T>>,
    /// Logical start index of each chunk; parallel to `chunks`.
    starts: Vec<usize>,
    chunk_capacity: usize,
    len: usize,
}

impl<T: Element> FragmentedBuffer<T> {
    /// Creates an empty buffer with the default chunk capacity.
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates an empty buffer with an explicit per-chunk capacity.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        Self {
            chunks: Vec::new(),
            starts: Vec::new(),
            chunk_capacity: chunk_capacity.max(1),
            len: 0,
        }
    }

    /// Appends a single scalar.
    pub fn push(&mut self, value: T) {
        let capacity = self.chunk_capacity;
        let chunk = match self.chunks.last_mut() {
            Some(chunk) if chunk.len() < chunk.capacity() => chunk,
            _ => self.begin_chunk(capacity),
        };
        chunk.push(value);
        self.len += 1;
    }

    /// Appends every element of a slice. A zero-length slice is a no-op.
    pub fn push_slice(&mut self, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let mut remaining = values;
        // Fill what is left of the open chunk first.
        if let Some(chunk) = self.chunks.last_mut() {
            let room = chunk.capacity() - chunk.len();
            if room > 0 {
                let take = room.min(remaining.len());
                chunk.extend_from_slice(&remaining[..take]);
                remaining = &remaining[take..];
            }
        }
        if !remaining.is_empty() {
            // An oversized remainder gets one exactly-sized chunk.
            let capacity = self.chunk_capacity.max(remaining.len());
            self.begin_chunk(capacity).extend_from_slice(remaining);
        }
        self.len += values.len();
    }

    /// Appends the full contents of another fragmented buffer by moving its
    /// chunks; no element is copied.
    pub fn append(&mut self, other: FragmentedBuffer<T>) {
        for chunk in other.chunks {
            if chunk.is_empty() {
                continue;
            }
            self.starts.push(self.len);
            self.len += chunk.len();
            self.chunks.push(chunk);
        }
    }

    /// Positional read. Returns `None` when `index` is out of range.
    pub fn get(&self, index: usize) -> Option<T> {
        let (chunk, within) = self.locate(index)?;
        Some(self.chunks[chunk][within])
    }

    /// Positional write. Returns `false` when `index` is out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.locate(index) {
            Some((chunk, within)) => {
                self.chunks[chunk][within] = value;
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
        let mut cursor = offset;
        for chunk in &self.chunks {
            dest[cursor..cursor + chunk.len()].copy_from_slice(chunk);
            cursor += chunk.len();
        }
    }

    /// Flattens the contents into one contiguous vector.
    pub fn combine(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Adds `delta` to every element.
    pub fn offset(&mut self, delta: T) {
        for chunk in &mut self.chunks {
            for value in chunk.iter_mut() {
                *value = *value + delta;
            }
        }
    }

    /// The number of elements pushed so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no elements have been pushed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// An iterator over the elements in logical order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.chunks.iter().flat_map(|chunk| chunk.iter().copied())
    }

    fn begin_chunk(&mut self, capacity: usize) -> &mut Vec<T> {
        self.starts.push(self.len);
        self.chunks.push(Vec::with_capacity(capacity));
        self.chunks.last_mut().unwrap()
    }

    /// Maps a logical index to `(chunk, index_within_chunk)` using the
    /// half-open ownership convention.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len {
            return None;
        }
        // partition_point returns the first chunk whose start is past the
        // index; the owner is the one before it.
        let chunk = self.starts.partition_point(|&start| start <= index) - 1;
        Some((chunk, index - self.starts[chunk]))
    }
}
