//! Size-class-indexed first-fit placement, split-on-place, and the
//! resize fast paths. This is where the five subsystems described in the
//! crate overview come together behind the client-facing
//! allocate/free/resize surface.

use std::ptr;

use crate::coalesce::{coalesce, extend};
use crate::config::HeapConfig;
use crate::error::AllocError;
use crate::free_list::FreeLists;
use crate::provider::{MemoryProvider, SbrkProvider};
use crate::size_class::{bucket_of, LISTS};
use crate::word::{self, DSIZE, MIN_BLOCK_SIZE, WSIZE};

/// A single-threaded, synchronous segregated-fit heap over one contiguous
/// region obtained from `P`. All state (the 16 free-list heads and the
/// heap origin) lives in this struct; there is no process-wide global.
pub struct Heap<P: MemoryProvider = SbrkProvider> {
    provider: P,
    lists: FreeLists,
    prologue: *mut u8,
    config: HeapConfig,
    initialized: bool,
}

impl Heap<SbrkProvider> {
    pub fn new() -> Self {
        Self::with_provider(SbrkProvider::new())
    }
}

impl Default for Heap<SbrkProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MemoryProvider> Heap<P> {
    pub fn with_provider(provider: P) -> Self {
        Self::with_config(provider, HeapConfig::default())
    }

    pub fn with_config(provider: P, config: HeapConfig) -> Self {
        Self {
            provider,
            lists: FreeLists::new(),
            prologue: ptr::null_mut(),
            config,
            initialized: false,
        }
    }

    /// Installs the prologue, epilogue, and empty free lists. Must be
    /// called exactly once before any other operation.
    pub fn init(&mut self) -> bool {
        unsafe {
            // [ padding | prologue header | prologue footer | epilogue header ]
            let base = match self.provider.sbrk(4 * WSIZE) {
                Some(p) => p,
                None => {
                    log::error!("init: memory provider refused the initial four-word request");
                    return false;
                }
            };

            let prologue_payload = base.add(2 * WSIZE);
            word::header(prologue_payload).write(word::pack(DSIZE, true));
            word::footer(prologue_payload, DSIZE).write(word::pack(DSIZE, true));
            word::header(word::next_block(prologue_payload, DSIZE)).write(word::pack(0, true));

            self.prologue = prologue_payload;
            self.lists = FreeLists::new();
            self.initialized = true;
            true
        }
    }

    fn adjust_request(size: usize) -> usize {
        let rounded = size.div_ceil(DSIZE) * DSIZE;
        (rounded + DSIZE).max(MIN_BLOCK_SIZE)
    }

    unsafe fn find_fit(&mut self, asize: usize) -> *mut u8 {
        unsafe {
            let mut idx = bucket_of(asize);
            while idx < LISTS {
                let mut cur = self.lists.head(idx);
                while !cur.is_null() {
                    let size = word::size_of(word::header(cur).read());
                    if size >= asize {
                        self.lists.detach(cur, Some(idx), size);
                        return cur;
                    }
                    cur = *word::link_next(cur);
                }
                idx += 1;
            }
            ptr::null_mut()
        }
    }

    /// `block` must already be detached from its free list.
    unsafe fn place(&mut self, block: *mut u8, asize: usize) {
        unsafe {
            let size = word::size_of(word::header(block).read());
            let remain = size - asize;
            if remain >= MIN_BLOCK_SIZE {
                word::header(block).write(word::pack(asize, true));
                word::footer(block, asize).write(word::pack(asize, true));
                let next = word::next_block(block, asize);
                word::header(next).write(word::pack(remain, false));
                word::footer(next, remain).write(word::pack(remain, false));
                self.lists.attach(next, None, remain);
            } else {
                word::header(block).write(word::pack(size, true));
                word::footer(block, size).write(word::pack(size, true));
            }
        }
    }

    /// Returns a payload pointer aligned to `DSIZE` and usable for at
    /// least `size` bytes, or null on zero-size requests or heap
    /// exhaustion.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        if size == 0 || !self.initialized {
            return ptr::null_mut();
        }
        unsafe {
            let asize = Self::adjust_request(size);

            let fit = self.find_fit(asize);
            if !fit.is_null() {
                self.place(fit, asize);
                return fit;
            }

            let chunk = asize.max(self.config.initial_chunk_bytes);
            let extended = extend(&mut self.provider, chunk / WSIZE);
            if extended.is_null() {
                log::warn!("allocate: heap exhausted requesting {chunk} bytes");
                return ptr::null_mut();
            }
            self.place(extended, asize);
            extended
        }
    }

    /// `Result`-returning convenience wrapper around [`Heap::allocate`].
    pub fn try_allocate(&mut self, size: usize) -> Result<*mut u8, AllocError> {
        if !self.initialized {
            return Err(AllocError::NotInitialized);
        }
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let p = self.allocate(size);
        if p.is_null() {
            Err(AllocError::HeapExhausted)
        } else {
            Ok(p)
        }
    }

    /// Null payload is a no-op. Otherwise `payload` must have been
    /// returned by `allocate` or `resize` and not yet freed.
    pub fn free(&mut self, payload: *mut u8) {
        if payload.is_null() || !self.initialized {
            return;
        }
        unsafe {
            let header = word::header(payload);
            let size = word::size_of(header.read());
            header.write(word::pack(size, false));
            word::footer(payload, size).write(word::pack(size, false));
            coalesce(&mut self.lists, payload);
        }
    }

    /// See the module-level design notes for the five-case priority order:
    /// shrink-in-place, merge-with-next, extend-the-epilogue,
    /// merge-with-previous, fallback copy.
    pub fn resize(&mut self, payload: *mut u8, size: usize) -> *mut u8 {
        if size == 0 {
            self.free(payload);
            return ptr::null_mut();
        }
        if payload.is_null() {
            return self.allocate(size);
        }
        if !self.initialized {
            return ptr::null_mut();
        }

        unsafe {
            let asize = Self::adjust_request(size);
            let cur_size = word::size_of(word::header(payload).read());

            // Case 1: shrink in place.
            if asize < cur_size {
                let remain = cur_size - asize;
                if remain >= MIN_BLOCK_SIZE {
                    word::header(payload).write(word::pack(asize, true));
                    word::footer(payload, asize).write(word::pack(asize, true));
                    let tail = word::next_block(payload, asize);
                    word::header(tail).write(word::pack(remain, false));
                    word::footer(tail, remain).write(word::pack(remain, false));
                    self.lists.attach(tail, None, remain);
                }
                return payload;
            }

            let next = word::next_block(payload, cur_size);
            let next_word = word::header(next).read();
            let next_size = word::size_of(next_word);
            let next_alloc = word::alloc_of(next_word);
            let next_is_epilogue = next_size == 0;

            // Case 2: merge with a free next neighbour.
            if !next_alloc && !next_is_epilogue && cur_size + next_size >= asize {
                self.lists.detach(next, None, next_size);
                let combined = cur_size + next_size;
                let remain = combined - asize;
                if remain >= MIN_BLOCK_SIZE {
                    word::header(payload).write(word::pack(asize, true));
                    word::footer(payload, asize).write(word::pack(asize, true));
                    let tail = word::next_block(payload, asize);
                    word::header(tail).write(word::pack(remain, false));
                    word::footer(tail, remain).write(word::pack(remain, false));
                    self.lists.attach(tail, None, remain);
                } else {
                    word::header(payload).write(word::pack(combined, true));
                    word::footer(payload, combined).write(word::pack(combined, true));
                }
                return payload;
            }

            // Case 3: grow into the epilogue. This case is chosen purely on
            // adjacency (next block is the epilogue), matching the reference
            // priority order: a failed grow here is heap exhaustion, not a
            // fallthrough to cases 4/5.
            if next_is_epilogue {
                let grow = asize - cur_size;
                let extended = extend(&mut self.provider, grow / WSIZE);
                if extended.is_null() {
                    log::warn!("resize: heap exhausted extending epilogue by {grow} bytes");
                    return ptr::null_mut();
                }
                let extended_size = word::size_of(word::header(extended).read());
                let combined = cur_size + extended_size;
                word::header(payload).write(word::pack(combined, true));
                word::footer(payload, combined).write(word::pack(combined, true));
                return payload;
            }

            // Case 4: merge with a free previous neighbour. The prologue is
            // always allocated, so this never walks before the heap origin.
            let prev = word::prev_block(payload);
            let prev_word = word::header(prev).read();
            let prev_size = word::size_of(prev_word);
            let prev_alloc = word::alloc_of(prev_word);
            if !prev_alloc && cur_size + prev_size >= asize {
                self.lists.detach(prev, None, prev_size);
                let combined = cur_size + prev_size;
                let usable = cur_size - DSIZE;
                // Overlap-safe: `prev` and `payload` may abut directly.
                ptr::copy(payload, prev, usable);
                word::header(prev).write(word::pack(combined, true));
                word::footer(prev, combined).write(word::pack(combined, true));
                return prev;
            }

            // Case 5: fallback — allocate fresh, copy, free the original.
            let new_payload = self.allocate(size);
            if new_payload.is_null() {
                return ptr::null_mut();
            }
            let usable = (cur_size - DSIZE).min(size);
            ptr::copy_nonoverlapping(payload, new_payload, usable);
            self.free(payload);
            new_payload
        }
    }

    /// `Result`-returning convenience wrapper around [`Heap::resize`].
    pub fn try_resize(&mut self, payload: *mut u8, size: usize) -> Result<*mut u8, AllocError> {
        if !self.initialized {
            return Err(AllocError::NotInitialized);
        }
        let p = self.resize(payload, size);
        if p.is_null() && size != 0 {
            Err(AllocError::HeapExhausted)
        } else {
            Ok(p)
        }
    }

    /// Side-effect-free audit of the four invariants in the module
    /// overview. Logs each violation and returns `false` if any are
    /// found; never mutates state.
    pub fn check(&self) -> bool {
        if !self.initialized {
            return true;
        }
        let mut ok = true;
        unsafe {
            for idx in 0..LISTS {
                let mut cur = self.lists.head(idx);
                while !cur.is_null() {
                    let w = word::header(cur).read();
                    if word::alloc_of(w) {
                        log::error!("check: bucket {idx} holds an allocated block at {cur:p}");
                        ok = false;
                    }
                    let expected = bucket_of(word::size_of(w));
                    if expected != idx {
                        log::error!(
                            "check: block at {cur:p} sits in bucket {idx}, expected {expected}"
                        );
                        ok = false;
                    }
                    let lo = self.provider.heap_lo() as usize;
                    let hi = self.provider.heap_hi() as usize;
                    let addr = cur as usize;
                    if addr < lo || addr > hi {
                        log::error!("check: free block at {cur:p} lies outside [{lo:#x}, {hi:#x}]");
                        ok = false;
                    }
                    cur = *word::link_next(cur);
                }
            }

            let mut blk = self.prologue;
            let mut prev_was_free = false;
            loop {
                let w = word::header(blk).read();
                let size = word::size_of(w);
                if size == 0 {
                    break; // epilogue
                }
                let is_free = !word::alloc_of(w);
                if is_free {
                    if prev_was_free {
                        log::error!("check: adjacent free blocks meet at {blk:p}");
                        ok = false;
                    }
                    if !self.lists.contains(bucket_of(size), blk) {
                        log::error!("check: free block at {blk:p} missing from its free list");
                        ok = false;
                    }
                }
                prev_was_free = is_free;
                blk = word::next_block(blk, size);
            }
        }
        ok
    }
}
