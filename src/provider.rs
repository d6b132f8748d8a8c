//! The allocator's only external dependency: monotonic heap growth plus
//! bounds queries for the self-consistency checker.

use std::ptr;

use libc::{c_void, intptr_t};

/// Downward interface the core allocator consumes. `sbrk`-style: each call
/// extends the heap and returns the base of the newly-added region.
pub trait MemoryProvider {
    /// # Safety
    /// Must only be called by the allocator core, which relies on the
    /// returned region abutting the previous high-water mark exactly.
    unsafe fn sbrk(&mut self, bytes: usize) -> Option<*mut u8>;

    /// Lowest address ever handed out by this provider.
    fn heap_lo(&self) -> *mut u8;

    /// Highest valid byte currently owned by this provider.
    fn heap_hi(&self) -> *mut u8;
}

/// Production provider: thin wrapper over the libc `sbrk` syscall, the same
/// one the teacher crate's bump allocator calls directly.
pub struct SbrkProvider {
    lo: Option<*mut u8>,
}

impl SbrkProvider {
    pub const fn new() -> Self {
        Self { lo: None }
    }
}

impl Default for SbrkProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider for SbrkProvider {
    unsafe fn sbrk(&mut self, bytes: usize) -> Option<*mut u8> {
        unsafe {
            let prev = libc::sbrk(bytes as intptr_t);
            if prev == usize::MAX as *mut c_void {
                return None;
            }
            let addr = prev as *mut u8;
            if self.lo.is_none() {
                self.lo = Some(addr);
            }
            Some(addr)
        }
    }

    fn heap_lo(&self) -> *mut u8 {
        self.lo.unwrap_or(ptr::null_mut())
    }

    fn heap_hi(&self) -> *mut u8 {
        unsafe { (libc::sbrk(0) as *mut u8).wrapping_sub(1) }
    }
}

/// Test-only provider backed by a fixed, non-reallocating arena so that
/// pointers handed out across several `sbrk` calls stay stable for the
/// lifetime of a test.
///
/// Backed by `[usize]` rather than `[u8]` so the base address is
/// word-aligned, matching the real `sbrk`'s contract that `Heap::init`'s
/// single padding word relies on to reach `DSIZE` alignment.
#[cfg(test)]
pub struct VecProvider {
    backing: Box<[usize]>,
    used_bytes: usize,
}

#[cfg(test)]
impl VecProvider {
    pub fn with_capacity(cap_bytes: usize) -> Self {
        use crate::word::DSIZE;

        // `Box<[usize]>` is only guaranteed word-aligned, not necessarily
        // DSIZE-aligned. Real `sbrk` heaps start page-aligned, which is far
        // stronger than DSIZE; reproduce that guarantee here with a single
        // optional guard word rather than leaving it to chance.
        let words = cap_bytes.div_ceil(std::mem::size_of::<usize>()) + 1;
        let backing = vec![0usize; words].into_boxed_slice();
        let base = backing.as_ptr() as usize;
        let used_bytes = if base % DSIZE == 0 {
            0
        } else {
            std::mem::size_of::<usize>()
        };
        Self { backing, used_bytes }
    }
}

#[cfg(test)]
impl MemoryProvider for VecProvider {
    unsafe fn sbrk(&mut self, bytes: usize) -> Option<*mut u8> {
        let cap_bytes = self.backing.len() * std::mem::size_of::<usize>();
        if self.used_bytes + bytes > cap_bytes {
            return None;
        }
        let ptr = unsafe { (self.backing.as_mut_ptr() as *mut u8).add(self.used_bytes) };
        self.used_bytes += bytes;
        Some(ptr)
    }

    fn heap_lo(&self) -> *mut u8 {
        self.backing.as_ptr() as *mut u8
    }

    fn heap_hi(&self) -> *mut u8 {
        unsafe {
            (self.backing.as_ptr() as *mut u8).add(self.used_bytes.saturating_sub(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_provider_grows_contiguously() {
        let mut p = VecProvider::with_capacity(256);
        unsafe {
            let a = p.sbrk(64).unwrap();
            let b = p.sbrk(64).unwrap();
            assert_eq!(b, a.add(64));
        }
    }

    #[test]
    fn vec_provider_refuses_past_capacity() {
        let mut p = VecProvider::with_capacity(16);
        unsafe {
            assert!(p.sbrk(32).is_none());
        }
    }
}
