//! Circuit gadgets backing the in-process R1CS lowering.

pub mod compare;
pub mod hash;

pub use compare::{is_zero, less_than};
pub use hash::poseidon_hash2_gadget;
