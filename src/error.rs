//! Error type for the `try_*` convenience API layered over the raw
//! pointer ABI. The raw API itself never returns `Result` — it collapses
//! every failure to a null pointer, per the external interface contract.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
    #[error("requested allocation size is zero")]
    ZeroSize,
    #[error("memory provider refused to grow the heap")]
    HeapExhausted,
    #[error("heap not initialized; call Heap::init first")]
    NotInitialized,
}
