use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const DEFAULT_PAGES_PER_CHUNK: usize = 10;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("out of memory: could not reserve a chunk for {requested} bytes")]
    OutOfMemory { requested: usize },
    #[error("invalid arena configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("handle does not refer to live memory in this arena")]
    StaleHandle,
    #[error("allocation does not hold valid UTF-8")]
    NotUtf8,
}

/// Sizing for an [`Arena`]. The default chunk is `pages_per_chunk` pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
    pub page_size: usize,
    pub pages_per_chunk: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            page_size: DEFAULT_PAGE_SIZE,
            pages_per_chunk: DEFAULT_PAGES_PER_CHUNK,
        }
    }
}

impl ArenaConfig {
    pub fn chunk_size(&self) -> Result<usize, ArenaError> {
        if self.page_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: String::from("page size must be non-zero"),
            });
        }

        if self.pages_per_chunk == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: String::from("a chunk must span at least one page"),
            });
        }

        self.page_size
            .checked_mul(self.pages_per_chunk)
            .ok_or_else(|| ArenaError::InvalidConfig {
                reason: format!(
                    "{} pages of {} bytes overflow the address space",
                    self.pages_per_chunk, self.page_size
                ),
            })
    }

    pub fn validate(&self) -> Result<(), ArenaError> {
        self.chunk_size().map(|_| ())
    }
}

/// One fixed-capacity block. Its buffer is never resized or moved.
#[derive(Debug)]
pub struct Chunk {
    data: Box<[u8]>,
    used: usize,
}

impl Chunk {
    fn reserve(capacity: usize) -> Result<Chunk, ArenaError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: capacity,
            })?;
        data.resize(capacity, 0);

        Ok(Chunk {
            data: data.into_boxed_slice(),
            used: 0,
        })
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.used
    }
}

/// A reference to bytes handed out by [`Arena::alloc`]. Handles stay valid
/// across later allocations and become stale on [`Arena::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaHandle {
    arena: u64,
    generation: u64,
    chunk: usize,
    offset: usize,
    len: usize,
}

impl ArenaHandle {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the chunk holding this allocation, in allocation order.
    pub fn chunk_index(&self) -> usize {
        self.chunk
    }
}

/// Chunked bump allocator with bulk release.
///
/// Allocations bump the tail chunk; when it cannot fit a request a new
/// chunk of `max(chunk_size, round_up(size, chunk_size))` bytes is appended.
/// Nothing is freed individually.
#[derive(Debug)]
pub struct Arena {
    /// Distinguishes this arena's handles from those of every other arena.
    id: u64,
    chunk_size: usize,
    chunks: Vec<Chunk>,
    total: usize,
    generation: u64,
}

impl Arena {
    pub fn new() -> Result<Arena, ArenaError> {
        Arena::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Result<Arena, ArenaError> {
        Arena::with_capacity(config, 0)
    }

    /// Creates an arena whose first chunk holds at least `capacity` bytes.
    pub fn with_capacity(config: ArenaConfig, capacity: usize) -> Result<Arena, ArenaError> {
        let chunk_size = config.chunk_size()?;

        let mut arena = Arena {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            chunk_size,
            chunks: vec![],
            total: 0,
            generation: 0,
        };
        arena.push_chunk(capacity)?;
        Ok(arena)
    }

    /// Reserves `size` bytes. A zero-sized request returns an empty handle
    /// without touching the tail chunk's usage.
    pub fn alloc(&mut self, size: usize) -> Result<ArenaHandle, ArenaError> {
        let fits = self
            .chunks
            .last()
            .is_some_and(|chunk| chunk.remaining() >= size);

        if !fits {
            self.push_chunk(size)?;
        }

        let index = self.chunks.len() - 1;
        let chunk = &mut self.chunks[index];
        let offset = chunk.used;
        chunk.used += size;

        Ok(ArenaHandle {
            arena: self.id,
            generation: self.generation,
            chunk: index,
            offset,
            len: size,
        })
    }

    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<ArenaHandle, ArenaError> {
        let handle = self.alloc(bytes.len())?;
        self.get_mut(handle)?.copy_from_slice(bytes);
        Ok(handle)
    }

    pub fn alloc_str(&mut self, text: &str) -> Result<ArenaHandle, ArenaError> {
        self.alloc_bytes(text.as_bytes())
    }

    pub fn get(&self, handle: ArenaHandle) -> Result<&[u8], ArenaError> {
        self.check_owner(handle)?;

        let chunk = self.chunks.get(handle.chunk).ok_or(ArenaError::StaleHandle)?;
        chunk
            .data
            .get(handle.offset..handle.offset + handle.len)
            .ok_or(ArenaError::StaleHandle)
    }

    pub fn get_mut(&mut self, handle: ArenaHandle) -> Result<&mut [u8], ArenaError> {
        self.check_owner(handle)?;

        let chunk = self
            .chunks
            .get_mut(handle.chunk)
            .ok_or(ArenaError::StaleHandle)?;
        chunk
            .data
            .get_mut(handle.offset..handle.offset + handle.len)
            .ok_or(ArenaError::StaleHandle)
    }

    pub fn get_str(&self, handle: ArenaHandle) -> Result<&str, ArenaError> {
        std::str::from_utf8(self.get(handle)?).map_err(|_| ArenaError::NotUtf8)
    }

    /// Releases every chunk. Handles issued before this call become stale.
    /// Calling it again is a no-op apart from the generation bump, and the
    /// arena may keep allocating afterwards.
    pub fn destroy(&mut self) {
        let released = self.chunks.len();
        let bytes = self.total;

        self.chunks = Vec::new();
        self.total = 0;
        // u64 cannot wrap in practice, so a stale handle never revalidates.
        self.generation += 1;

        debug!(chunks = released, bytes, "arena destroyed");
    }

    /// Total bytes reserved across all chunks.
    pub fn total_capacity(&self) -> usize {
        self.total
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn current_used(&self) -> usize {
        self.chunks.last().map_or(0, Chunk::used)
    }

    pub fn current_capacity(&self) -> usize {
        self.chunks.last().map_or(0, Chunk::capacity)
    }

    fn check_owner(&self, handle: ArenaHandle) -> Result<(), ArenaError> {
        if handle.arena != self.id || handle.generation != self.generation {
            return Err(ArenaError::StaleHandle);
        }
        Ok(())
    }

    fn push_chunk(&mut self, size: usize) -> Result<(), ArenaError> {
        let capacity = size
            .div_ceil(self.chunk_size)
            .checked_mul(self.chunk_size)
            .map(|rounded| rounded.max(self.chunk_size));

        let result = capacity
            .ok_or(ArenaError::OutOfMemory { requested: size })
            .and_then(|capacity| {
                self.chunks
                    .try_reserve(1)
                    .map_err(|_| ArenaError::OutOfMemory { requested: size })?;
                Chunk::reserve(capacity)
            });

        match result {
            Ok(chunk) => {
                debug!(
                    capacity = chunk.capacity(),
                    chunks = self.chunks.len() + 1,
                    "arena chunk committed"
                );
                self.total += chunk.capacity();
                self.chunks.push(chunk);
                Ok(())
            }
            Err(error) => {
                warn!(requested = size, %error, "arena allocation failed");
                Err(error)
            }
        }
    }
}
