//! Slab allocator for the fixed-width buffers backing numeric column vectors.

use std::collections::HashMap;

/// A borrowed memory slab: `row_num * width` bytes, owned by exactly one
/// column vector until it is returned to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    bytes: Vec<u8>,
    width: usize,
}

impl Slab {
    fn new(row_num: usize, width: usize) -> Self {
        Self {
            bytes: vec![0u8; row_num * width],
            width,
        }
    }

    /// Build a standalone slab outside of any pool, for one-off storage such
    /// as a literal-scalar column vector.
    pub fn standalone(row_num: usize, width: usize) -> Self {
        Self::new(row_num, width)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len() / self.width
    }

    #[inline]
    fn offset(&self, index: usize) -> usize {
        index * self.width
    }

    pub fn read(&self, index: usize) -> &[u8] {
        let off = self.offset(index);
        &self.bytes[off..off + self.width]
    }

    pub fn write(&mut self, index: usize, value: &[u8]) {
        debug_assert_eq!(value.len(), self.width);
        let off = self.offset(index);
        self.bytes[off..off + self.width].copy_from_slice(value);
    }
}

/// Slab allocator keyed by element width, scoped to the lifetime of one
/// owning row batch. Not thread-safe: batch ownership rules (spec §5) enforce
/// single-threaded access.
#[derive(Debug, Default)]
pub struct MemoryPool {
    row_num: usize,
    free_lists: HashMap<usize, Vec<Slab>>,
}

impl MemoryPool {
    pub fn new(row_num: usize) -> Self {
        Self {
            row_num,
            free_lists: HashMap::new(),
        }
    }

    /// Borrow a slab of the given element width, sized for this pool's row
    /// count. Reuses a freed slab if one of the right width is available.
    pub fn borrow(&mut self, width: usize) -> Slab {
        match self.free_lists.get_mut(&width).and_then(Vec::pop) {
            Some(slab) => slab,
            None => Slab::new(self.row_num, width),
        }
    }

    /// Return a slab to the free list for its width so a later `borrow` can
    /// reuse it.
    pub fn release(&mut self, slab: Slab) {
        let width = slab.width();
        self.free_lists.entry(width).or_default().push(slab);
    }

    /// Drop every slab held by this pool. Must be called exactly once when
    /// the owning row batch is retired.
    pub fn free(&mut self) {
        self.free_lists.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrow_creates_slab_sized_for_row_count() {
        let mut pool = MemoryPool::new(10);
        let slab = pool.borrow(4);
        assert_eq!(slab.capacity(), 10);
        assert_eq!(slab.width(), 4);
    }

    #[test]
    fn released_slab_is_reused_on_next_borrow() {
        let mut pool = MemoryPool::new(4);
        let mut slab = pool.borrow(8);
        slab.write(0, &42i64.to_ne_bytes());
        pool.release(slab);

        let reused = pool.borrow(8);
        // The freelist entry is handed back as-is; the caller is responsible
        // for overwriting stale bytes before trusting them as a fresh buffer.
        assert_eq!(i64::from_ne_bytes(reused.read(0).try_into().unwrap()), 42);
    }

    #[test]
    fn different_widths_use_independent_free_lists() {
        let mut pool = MemoryPool::new(4);
        let a = pool.borrow(4);
        let b = pool.borrow(8);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.borrow(4).width(), 4);
        assert_eq!(pool.borrow(8).width(), 8);
    }
}
