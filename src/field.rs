//! Finite fields.
//!
//! This module re-exports the two backend-provided rings used by the
//! curve: `GFp` (integers modulo the field prime `p = 2^256 - 2^32 - 977`)
//! and `Scalar` (integers modulo the prime group order `n`).

pub use crate::backend::GFp;
pub use crate::backend::Scalar;
