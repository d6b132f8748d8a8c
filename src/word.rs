//! Header/footer word format and address arithmetic between neighbouring
//! blocks. Every function here is pure pointer arithmetic; none of them
//! know about free lists or the heap as a whole.

use std::mem;

/// Size in bytes of one machine word. All block metadata is stored in
/// units of this size.
pub const WSIZE: usize = mem::size_of::<usize>();

/// Size in bytes of a pointer pair. This is the allocator's alignment
/// granularity and the unit `adjust_request` rounds payload sizes up to.
pub const DSIZE: usize = 2 * WSIZE;

/// Smallest block that can hold a header, footer, and two link words.
pub const MIN_BLOCK_SIZE: usize = 2 * DSIZE;

/// Packs a block size and its allocated flag into one header/footer word.
///
/// `size` must be a multiple of `DSIZE` so its low bits are free for the
/// flag; callers never pack an odd-granularity size.
#[inline]
pub fn pack(size: usize, alloc: bool) -> usize {
    size | (alloc as usize)
}

#[inline]
pub fn size_of(word: usize) -> usize {
    word & !1
}

#[inline]
pub fn alloc_of(word: usize) -> bool {
    word & 1 != 0
}

/// # Safety
/// `payload` must address the payload of an in-heap block.
#[inline]
pub unsafe fn header(payload: *mut u8) -> *mut usize {
    unsafe { payload.sub(WSIZE) as *mut usize }
}

/// # Safety
/// `payload` must address the payload of an in-heap block of total size `size`.
#[inline]
pub unsafe fn footer(payload: *mut u8, size: usize) -> *mut usize {
    unsafe { payload.add(size - DSIZE) as *mut usize }
}

/// # Safety
/// `payload` must address the payload of an in-heap block of total size `size`.
#[inline]
pub unsafe fn next_block(payload: *mut u8, size: usize) -> *mut u8 {
    unsafe { payload.add(size) }
}

/// # Safety
/// `payload` must not be the heap's first block (the prologue guards this).
#[inline]
pub unsafe fn prev_block(payload: *mut u8) -> *mut u8 {
    unsafe {
        let prev_footer = payload.sub(DSIZE) as *mut usize;
        let prev_size = size_of(prev_footer.read());
        payload.sub(prev_size)
    }
}

/// Address of a free block's forward link (word 0 of the payload area).
///
/// # Safety
/// `payload` must address a free block's payload, never an allocated one.
#[inline]
pub unsafe fn link_next(payload: *mut u8) -> *mut *mut u8 {
    unsafe { payload as *mut *mut u8 }
}

/// Address of a free block's backward link (word 1 of the payload area).
///
/// # Safety
/// `payload` must address a free block's payload, never an allocated one.
#[inline]
pub unsafe fn link_prev(payload: *mut u8) -> *mut *mut u8 {
    unsafe { (payload as *mut *mut u8).add(1) }
}
