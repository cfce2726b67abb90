//! Bump allocation for front-end data.
//!
//! The arena hands out byte ranges from a growing list of page-sized
//! chunks and releases them all at once. Handles are plain indices, so a
//! handle taken early stays readable no matter how many chunks follow.

pub mod arena;

pub use arena::{Arena, ArenaConfig, ArenaError, ArenaHandle, Chunk};

#[cfg(test)]
mod tests;
