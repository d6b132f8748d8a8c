//! # segalloc — a segregated-fit heap allocator
//!
//! A user-space dynamic memory allocator over a single contiguous heap
//! obtained from a memory provider (`sbrk` by default). No garbage
//! collection, no thread safety, no metadata outside the heap itself.
//!
//! ## Layout
//!
//! Every block is a contiguous span of words: a one-word header, a
//! payload region, and a one-word footer, both boundary tags packing the
//! block's total size and its allocated flag. Free blocks additionally
//! store two link words inside their own payload area — there is no
//! metadata kept outside the heap.
//!
//! ```text
//!   allocated block:            free block:
//!   ┌────────┬─────────┬────────┐   ┌────────┬──────┬──────┬─────────┬────────┐
//!   │ header │ payload │ footer │   │ header │ fwd  │ back │  ...    │ footer │
//!   └────────┴─────────┴────────┘   └────────┴──────┴──────┴─────────┴────────┘
//! ```
//!
//! Blocks too small to find a fit are split, and freed blocks are merged
//! with their free physical neighbours (boundary-tag coalescing) before
//! being re-indexed into one of 16 segregated free-list buckets: small
//! buckets are FIFO for locality of reuse, large buckets are kept in
//! address order so coalescing opportunities are found without a scan.
//!
//! ## Crate structure
//!
//! ```text
//!   segalloc
//!   ├── word        - header/footer word format, neighbour arithmetic
//!   ├── size_class   - size -> free-list bucket mapping
//!   ├── free_list    - detach/attach on the 16 segregated buckets
//!   ├── coalesce     - boundary-tag merging, sbrk-backed heap growth
//!   ├── provider     - the sbrk-style memory provider interface
//!   ├── config       - tunable knobs (initial chunk size)
//!   ├── error        - error type for the Result-returning convenience API
//!   └── heap         - placement policy and the public Heap type
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use segalloc::Heap;
//!
//! let mut heap = Heap::new();
//! assert!(heap.init());
//!
//! let p = heap.allocate(64);
//! assert!(!p.is_null());
//!
//! let p = heap.resize(p, 256);
//! heap.free(p);
//! ```
//!
//! ## Safety
//!
//! This crate manages raw memory directly; most of its internals are
//! `unsafe`. Callers must uphold the contracts documented on each public
//! method — in particular, never pass a pointer to `free`/`resize` that
//! wasn't returned by this same `Heap`, and never call these methods
//! reentrantly from inside a memory-provider callback.

pub mod coalesce;
pub mod config;
pub mod error;
pub mod free_list;
mod heap;
pub mod provider;
pub mod size_class;
pub mod word;

pub use config::HeapConfig;
pub use error::AllocError;
pub use heap::Heap;
pub use provider::{MemoryProvider, SbrkProvider};
