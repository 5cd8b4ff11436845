//! Test utilities for the devmem crates.
//!
//! Tests never touch `/dev/mem`. Instead, [`fake_memory::FakeMemory`] provides a
//! sparse temporary file whose offsets play the role of physical addresses, so a
//! region can be mapped at realistic peripheral addresses and the bytes that reach
//! the backing store can be inspected afterwards.

pub mod fake_memory;

pub use fake_memory::FakeMemory;
