//! Segregated free-list heads and the detach/attach operations that keep
//! each bucket a well-formed, null-terminated doubly-linked list.

use std::ptr;

use crate::size_class::{bucket_of, FIFO_BOUNDARY, LISTS};
use crate::word::{link_next, link_prev};

pub struct FreeLists {
    heads: [*mut u8; LISTS],
}

impl FreeLists {
    pub const fn new() -> Self {
        Self {
            heads: [ptr::null_mut(); LISTS],
        }
    }

    pub fn head(&self, idx: usize) -> *mut u8 {
        self.heads[idx]
    }

    /// # Safety
    /// `block` must be a free block currently linked into bucket
    /// `hint.unwrap_or(bucket_of(size))`.
    pub unsafe fn detach(&mut self, block: *mut u8, hint: Option<usize>, size: usize) {
        unsafe {
            let idx = hint.unwrap_or_else(|| bucket_of(size));
            let pred = *link_prev(block);
            let succ = *link_next(block);
            match (pred.is_null(), succ.is_null()) {
                (false, false) => {
                    *link_next(pred) = succ;
                    *link_prev(succ) = pred;
                }
                (false, true) => {
                    *link_next(pred) = ptr::null_mut();
                }
                (true, false) => {
                    *link_prev(succ) = ptr::null_mut();
                    self.heads[idx] = succ;
                }
                (true, true) => {
                    self.heads[idx] = ptr::null_mut();
                }
            }
        }
    }

    /// # Safety
    /// `block` must be a free block not currently linked into any bucket.
    pub unsafe fn attach(&mut self, block: *mut u8, hint: Option<usize>, size: usize) {
        unsafe {
            let idx = hint.unwrap_or_else(|| bucket_of(size));

            if idx <= FIFO_BOUNDARY {
                let old_head = self.heads[idx];
                *link_next(block) = old_head;
                *link_prev(block) = ptr::null_mut();
                if !old_head.is_null() {
                    *link_prev(old_head) = block;
                }
                self.heads[idx] = block;
                return;
            }

            if self.heads[idx].is_null() {
                *link_next(block) = ptr::null_mut();
                *link_prev(block) = ptr::null_mut();
                self.heads[idx] = block;
                return;
            }

            let mut cur = self.heads[idx];
            let mut prev: *mut u8 = ptr::null_mut();
            while !cur.is_null() && (cur as usize) < (block as usize) {
                prev = cur;
                cur = *link_next(cur);
            }

            if prev.is_null() {
                // New address-order head: block precedes every existing entry.
                *link_next(block) = cur;
                *link_prev(block) = ptr::null_mut();
                *link_prev(cur) = block;
                self.heads[idx] = block;
            } else if cur.is_null() {
                // New tail: block follows every existing entry.
                *link_next(prev) = block;
                *link_prev(block) = prev;
                *link_next(block) = ptr::null_mut();
            } else {
                // Interior insertion between prev and cur.
                *link_next(prev) = block;
                *link_prev(block) = prev;
                *link_next(block) = cur;
                *link_prev(cur) = block;
            }
        }
    }

    /// Linear membership test used only by the self-consistency checker.
    pub unsafe fn contains(&self, idx: usize, block: *mut u8) -> bool {
        unsafe {
            let mut cur = self.heads[idx];
            while !cur.is_null() {
                if cur == block {
                    return true;
                }
                cur = *link_next(cur);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{footer, header, pack};

    const SIZE: usize = 64;

    /// Writes a free block of `SIZE` bytes at `base + slot * SIZE` and
    /// returns its payload pointer. `base` must have at least
    /// `(slot + 1) * SIZE + WSIZE` bytes of room.
    unsafe fn make_block(base: *mut u8, slot: usize) -> *mut u8 {
        unsafe {
            let payload = base.add(slot * SIZE + crate::word::WSIZE);
            header(payload).write(pack(SIZE, false));
            footer(payload, SIZE).write(pack(SIZE, false));
            payload
        }
    }

    #[test]
    fn fifo_bucket_pushes_at_head() {
        let mut buf = vec![0u8; SIZE * 4];
        let base = buf.as_mut_ptr();
        let mut lists = FreeLists::new();
        unsafe {
            let a = make_block(base, 0);
            let b = make_block(base, 1);

            lists.attach(a, Some(0), SIZE);
            lists.attach(b, Some(0), SIZE);

            // Most recently attached block is the new head (LIFO/FIFO-push order).
            assert_eq!(lists.head(0), b);
            assert!(lists.contains(0, a));
            assert!(lists.contains(0, b));

            lists.detach(b, Some(0), SIZE);
            assert_eq!(lists.head(0), a);
            assert!(!lists.contains(0, b));
        }
    }

    #[test]
    fn address_ordered_bucket_stays_sorted() {
        let mut buf = vec![0u8; SIZE * 4];
        let base = buf.as_mut_ptr();
        let mut lists = FreeLists::new();
        let idx = 9; // > FIFO_BOUNDARY

        unsafe {
            let low = make_block(base, 0);
            let high = make_block(base, 1);
            assert!((low as usize) < (high as usize));

            // Insert out of order; attach must re-sort by address.
            lists.attach(high, Some(idx), SIZE);
            lists.attach(low, Some(idx), SIZE);

            assert_eq!(lists.head(idx), low);
            assert_eq!(*link_next(low), high);
            assert_eq!(*link_prev(high), low);
        }
    }

    #[test]
    fn detach_splices_interior_node() {
        let mut buf = vec![0u8; SIZE * 4];
        let base = buf.as_mut_ptr();
        let mut lists = FreeLists::new();
        let idx = 9;

        unsafe {
            let a = make_block(base, 0);
            let b = make_block(base, 1);
            let c = make_block(base, 2);

            lists.attach(a, Some(idx), SIZE);
            lists.attach(b, Some(idx), SIZE);
            lists.attach(c, Some(idx), SIZE);

            lists.detach(b, Some(idx), SIZE);
            assert_eq!(*link_next(a), c);
            assert_eq!(*link_prev(c), a);
            assert!(!lists.contains(idx, b));
        }
    }
}
