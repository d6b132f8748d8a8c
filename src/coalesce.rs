//! Boundary-tag coalescing and sbrk-backed heap growth.

use std::ptr;

use crate::free_list::FreeLists;
use crate::provider::MemoryProvider;
use crate::word::{self, WSIZE};

/// Merges `block` with whichever physical neighbours are free and attaches
/// the result to its free list. Returns the payload of the (possibly
/// relocated) merged block, which is always present in exactly one free
/// list on return.
///
/// # Safety
/// `block` must be a freshly-freed block (allocated flag already cleared
/// in both its header and footer) not yet attached to any free list.
pub unsafe fn coalesce(lists: &mut FreeLists, block: *mut u8) -> *mut u8 {
    unsafe {
        let size = word::size_of(word::header(block).read());
        let prev = word::prev_block(block);
        let next = word::next_block(block, size);

        let prev_word = word::header(prev).read();
        let next_word = word::header(next).read();
        let prev_alloc = word::alloc_of(prev_word);
        let next_alloc = word::alloc_of(next_word);

        if prev_alloc && next_alloc {
            lists.attach(block, None, size);
            return block;
        }

        if prev_alloc && !next_alloc {
            let next_size = word::size_of(next_word);
            lists.detach(next, None, next_size);
            let merged = size + next_size;
            word::header(block).write(word::pack(merged, false));
            word::footer(block, merged).write(word::pack(merged, false));
            lists.attach(block, None, merged);
            return block;
        }

        if !prev_alloc && next_alloc {
            let prev_size = word::size_of(prev_word);
            lists.detach(prev, None, prev_size);
            let merged = size + prev_size;
            word::header(prev).write(word::pack(merged, false));
            word::footer(prev, merged).write(word::pack(merged, false));
            lists.attach(prev, None, merged);
            return prev;
        }

        let prev_size = word::size_of(prev_word);
        let next_size = word::size_of(next_word);
        lists.detach(prev, None, prev_size);
        lists.detach(next, None, next_size);
        let merged = size + prev_size + next_size;
        word::header(prev).write(word::pack(merged, false));
        word::footer(prev, merged).write(word::pack(merged, false));
        lists.attach(prev, None, merged);
        prev
    }
}

/// Grows the heap by at least `words` words (rounded up to an even count)
/// and lays out a fresh free block ending in a new epilogue. Does not
/// coalesce or attach the new block; callers decide.
///
/// # Safety
/// The heap must already be initialized (prologue/epilogue installed) and
/// `provider`'s next `sbrk` call must return the address immediately
/// following the current epilogue header.
pub unsafe fn extend<P: MemoryProvider>(provider: &mut P, words: usize) -> *mut u8 {
    unsafe {
        let words = if words % 2 != 0 { words + 1 } else { words };
        let bytes = words * WSIZE;

        let payload = match provider.sbrk(bytes) {
            Some(p) => p,
            None => return ptr::null_mut(),
        };

        // The old epilogue header occupied this word; it becomes the new
        // block's header.
        word::header(payload).write(word::pack(bytes, false));
        word::footer(payload, bytes).write(word::pack(bytes, false));
        word::header(word::next_block(payload, bytes)).write(word::pack(0, true));

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VecProvider;
    use crate::word::{footer, header, pack, MIN_BLOCK_SIZE};

    unsafe fn lay_block(payload: *mut u8, size: usize, alloc: bool) {
        unsafe {
            header(payload).write(pack(size, alloc));
            footer(payload, size).write(pack(size, alloc));
        }
    }

    #[test]
    fn extend_relays_epilogue() {
        let mut provider = VecProvider::with_capacity(4096);
        unsafe {
            // Seed an epilogue header the way Heap::init would.
            let base = provider.sbrk(WSIZE).unwrap();
            header(base).write(pack(0, true));

            let block = extend(&mut provider, (MIN_BLOCK_SIZE) / WSIZE);
            assert!(!block.is_null());
            assert_eq!(block, base);

            let size = word::size_of(header(block).read());
            assert_eq!(size, MIN_BLOCK_SIZE);
            assert!(!word::alloc_of(header(block).read()));

            let epilogue = word::next_block(block, size);
            let ew = header(epilogue).read();
            assert_eq!(word::size_of(ew), 0);
            assert!(word::alloc_of(ew));
        }
    }

    #[test]
    fn coalesce_both_neighbours_allocated_just_attaches() {
        let mut lists = FreeLists::new();
        let mut arena = vec![0u8; MIN_BLOCK_SIZE * 3 + WSIZE];
        unsafe {
            let base = arena.as_mut_ptr();
            let prev = base.add(WSIZE);
            lay_block(prev, MIN_BLOCK_SIZE, true);
            let block = word::next_block(prev, MIN_BLOCK_SIZE);
            lay_block(block, MIN_BLOCK_SIZE, false);
            let next = word::next_block(block, MIN_BLOCK_SIZE);
            lay_block(next, MIN_BLOCK_SIZE, true);

            let result = coalesce(&mut lists, block);
            assert_eq!(result, block);
            assert!(lists.contains(crate::size_class::bucket_of(MIN_BLOCK_SIZE), block));
        }
    }

    #[test]
    fn coalesce_merges_both_free_neighbours() {
        let mut lists = FreeLists::new();
        let mut arena = vec![0u8; MIN_BLOCK_SIZE * 3 + WSIZE];
        unsafe {
            let base = arena.as_mut_ptr();
            let prev = base.add(WSIZE);
            lay_block(prev, MIN_BLOCK_SIZE, false);
            let block = word::next_block(prev, MIN_BLOCK_SIZE);
            lay_block(block, MIN_BLOCK_SIZE, true);
            let next = word::next_block(block, MIN_BLOCK_SIZE);
            lay_block(next, MIN_BLOCK_SIZE, false);

            lists.attach(prev, None, MIN_BLOCK_SIZE);
            lists.attach(next, None, MIN_BLOCK_SIZE);

            // free `block` in place, as Heap::free would before coalescing
            header(block).write(pack(MIN_BLOCK_SIZE, false));
            footer(block, MIN_BLOCK_SIZE).write(pack(MIN_BLOCK_SIZE, false));

            let result = coalesce(&mut lists, block);
            assert_eq!(result, prev);
            let merged_size = word::size_of(header(prev).read());
            assert_eq!(merged_size, MIN_BLOCK_SIZE * 3);
            assert_eq!(word::size_of(footer(prev, merged_size).read()), merged_size);
            assert!(!lists.contains(crate::size_class::bucket_of(MIN_BLOCK_SIZE), next));
        }
    }
}
