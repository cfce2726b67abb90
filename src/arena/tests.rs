//! Unit tests for the arena allocator.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::arena::{
    Arena, ArenaConfig, ArenaError, DEFAULT_PAGES_PER_CHUNK, DEFAULT_PAGE_SIZE,
};

const CHUNK_SIZE: usize = DEFAULT_PAGES_PER_CHUNK * DEFAULT_PAGE_SIZE;

fn small_config() -> ArenaConfig {
    ArenaConfig {
        page_size: 64,
        pages_per_chunk: 2,
    }
}

#[test]
fn test_arena_init() {
    let arena = Arena::new().unwrap();

    assert_eq!(arena.chunk_size(), CHUNK_SIZE);
    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.total_capacity(), CHUNK_SIZE);
    assert_eq!(arena.current_used(), 0);
    assert_eq!(arena.current_capacity(), CHUNK_SIZE);
}

#[test]
fn test_arena_init_with_capacity_override() {
    let arena = Arena::with_capacity(small_config(), 300).unwrap();

    assert_eq!(arena.chunk_size(), 128);
    assert_eq!(arena.current_capacity(), 384);
    assert_eq!(arena.total_capacity(), 384);
}

#[test]
fn test_arena_rejects_bad_config() {
    let zero_page = ArenaConfig {
        page_size: 0,
        pages_per_chunk: 10,
    };
    assert!(matches!(
        Arena::with_config(zero_page),
        Err(ArenaError::InvalidConfig { .. })
    ));

    let zero_pages = ArenaConfig {
        page_size: 4096,
        pages_per_chunk: 0,
    };
    assert!(zero_pages.validate().is_err());

    let overflowing = ArenaConfig {
        page_size: usize::MAX,
        pages_per_chunk: 2,
    };
    assert!(overflowing.chunk_size().is_err());
    assert!(ArenaConfig::default().validate().is_ok());
}

#[test]
fn test_arena_alloc_small() {
    let mut arena = Arena::new().unwrap();

    let handle = arena.alloc(100).unwrap();
    arena.get_mut(handle).unwrap().fill(0xAA);

    assert_eq!(handle.len(), 100);
    assert_eq!(arena.current_used(), 100);
    assert!(arena.get(handle).unwrap().iter().all(|byte| *byte == 0xAA));
}

#[test]
fn test_arena_alloc_multiple() {
    let mut arena = Arena::new().unwrap();

    let first = arena.alloc(50).unwrap();
    let second = arena.alloc(75).unwrap();
    let third = arena.alloc(25).unwrap();
    arena.get_mut(first).unwrap().fill(0xBB);
    arena.get_mut(second).unwrap().fill(0xCC);
    arena.get_mut(third).unwrap().fill(0xDD);

    assert_eq!(arena.current_used(), 150);
    assert_eq!(arena.get(first).unwrap(), &[0xBB; 50][..]);
    assert_eq!(arena.get(second).unwrap(), &[0xCC; 75][..]);
    assert_eq!(arena.get(third).unwrap(), &[0xDD; 25][..]);
}

#[test]
fn test_arena_exact_fill_stays_in_first_chunk() {
    let mut arena = Arena::new().unwrap();

    arena.alloc(CHUNK_SIZE - 100).unwrap();
    arena.alloc(100).unwrap();

    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.current_used(), CHUNK_SIZE);
}

#[test]
fn test_arena_alloc_new_chunk() {
    let mut arena = Arena::new().unwrap();

    let first = arena.alloc(CHUNK_SIZE - 100).unwrap();
    let second = arena.alloc(101).unwrap();

    assert_eq!(arena.chunk_count(), 2);
    assert_eq!(first.chunk_index(), 0);
    assert_eq!(second.chunk_index(), 1);
    assert_eq!(arena.current_used(), 101);
    assert_eq!(arena.total_capacity(), CHUNK_SIZE + CHUNK_SIZE);

    let used: Vec<usize> = arena.chunks().map(|chunk| chunk.used()).collect();
    assert_eq!(used, vec![CHUNK_SIZE - 100, 101]);
}

#[test]
fn test_arena_alloc_large() {
    let mut arena = Arena::new().unwrap();
    let size = CHUNK_SIZE + 1000;
    let expected_capacity = CHUNK_SIZE * 2;

    let handle = arena.alloc(size).unwrap();
    arena.get_mut(handle).unwrap().fill(0x11);

    assert_eq!(arena.current_used(), size);
    assert_eq!(arena.current_capacity(), expected_capacity);
    assert_eq!(arena.total_capacity(), CHUNK_SIZE + expected_capacity);
}

#[test]
fn test_arena_alloc_zero() {
    let mut arena = Arena::new().unwrap();
    arena.alloc(10).unwrap();

    let handle = arena.alloc(0).unwrap();

    assert!(handle.is_empty());
    assert_eq!(arena.get(handle).unwrap(), &[] as &[u8]);
    assert_eq!(arena.current_used(), 10);
    assert_eq!(arena.chunk_count(), 1);
}

#[test]
fn test_arena_alloc_zero_on_full_chunk() {
    let mut arena = Arena::with_config(small_config()).unwrap();
    arena.alloc(128).unwrap();

    let handle = arena.alloc(0).unwrap();

    assert!(handle.is_empty());
    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.current_used(), 128);
}

#[test]
fn test_arena_handles_are_stable() {
    let mut arena = Arena::with_config(small_config()).unwrap();

    let name = arena.alloc_str("identifier").unwrap();
    let address = arena.get(name).unwrap().as_ptr();

    for i in 0..10_000 {
        arena.alloc(1 + i % 200).unwrap();
    }

    assert!(arena.chunk_count() > 100);
    assert_eq!(arena.get_str(name).unwrap(), "identifier");
    assert_eq!(arena.get(name).unwrap().as_ptr(), address);
}

#[test]
fn test_arena_out_of_memory_is_recoverable() {
    let mut arena = Arena::new().unwrap();
    let kept = arena.alloc_str("kept").unwrap();

    assert_eq!(
        arena.alloc(usize::MAX),
        Err(ArenaError::OutOfMemory {
            requested: usize::MAX
        })
    );
    assert!(matches!(
        arena.alloc(usize::MAX / 2),
        Err(ArenaError::OutOfMemory { .. })
    ));

    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.get_str(kept).unwrap(), "kept");
    assert!(arena.alloc(16).is_ok());

    arena.destroy();
    assert_eq!(arena.chunk_count(), 0);
}

#[test]
fn test_arena_destroy() {
    let mut arena = Arena::new().unwrap();
    let handle = arena.alloc(100).unwrap();
    arena.alloc(CHUNK_SIZE).unwrap();
    assert_eq!(arena.chunk_count(), 2);

    arena.destroy();

    assert_eq!(arena.chunk_count(), 0);
    assert_eq!(arena.total_capacity(), 0);
    assert_eq!(arena.current_used(), 0);
    assert_eq!(arena.get(handle), Err(ArenaError::StaleHandle));

    arena.destroy();
    assert_eq!(arena.chunk_count(), 0);
}

#[test]
fn test_arena_reusable_after_destroy() {
    let mut arena = Arena::new().unwrap();
    let old = arena.alloc_str("old").unwrap();
    arena.destroy();

    let new = arena.alloc_str("new").unwrap();

    assert_eq!(arena.chunk_count(), 1);
    assert_eq!(arena.total_capacity(), CHUNK_SIZE);
    assert_eq!(arena.get_str(new).unwrap(), "new");
    assert_eq!(arena.get_str(old), Err(ArenaError::StaleHandle));
}

#[test]
fn test_arena_get_str_rejects_invalid_utf8() {
    let mut arena = Arena::new().unwrap();
    let handle = arena.alloc_bytes(&[0xFF, 0xFE]).unwrap();

    assert_eq!(arena.get_str(handle), Err(ArenaError::NotUtf8));
}

#[test]
fn test_handle_from_other_arena_is_rejected() {
    let mut big = Arena::new().unwrap();
    big.alloc(10).unwrap();
    let handle = big.alloc(CHUNK_SIZE * 3).unwrap();

    let small = Arena::new().unwrap();
    assert_eq!(small.get(handle), Err(ArenaError::StaleHandle));
}

#[test]
fn test_handle_into_same_chunk_of_other_arena_is_rejected() {
    let mut first = Arena::new().unwrap();
    let mut second = Arena::new().unwrap();

    let secret = first.alloc_str("secret").unwrap();
    let public = second.alloc_str("public").unwrap();
    assert_eq!(secret.chunk_index(), public.chunk_index());

    assert_eq!(second.get_str(secret), Err(ArenaError::StaleHandle));
    assert_eq!(second.get_mut(secret), Err(ArenaError::StaleHandle));
    assert_eq!(first.get_str(public), Err(ArenaError::StaleHandle));
    assert_eq!(first.get_str(secret).unwrap(), "secret");
}

#[test]
fn test_stale_handle_stays_stale_across_many_destroys() {
    let mut arena = Arena::with_config(small_config()).unwrap();
    let old = arena.alloc_str("old").unwrap();

    for _ in 0..1000 {
        arena.destroy();
    }
    let new = arena.alloc_str("new").unwrap();

    assert_eq!(new.chunk_index(), old.chunk_index());
    assert_eq!(arena.get_str(old), Err(ArenaError::StaleHandle));
    assert_eq!(arena.get_str(new).unwrap(), "new");
}

proptest! {
    #[test]
    fn allocations_keep_their_contents(sizes in prop::collection::vec(0usize..300, 1..200)) {
        let mut arena = Arena::with_config(small_config()).unwrap();
        let mut handles = vec![];

        for (i, size) in sizes.iter().enumerate() {
            let handle = arena.alloc(*size).unwrap();
            arena.get_mut(handle).unwrap().fill(i as u8);
            handles.push((handle, i as u8));
        }

        for (handle, byte) in handles {
            let bytes = arena.get(handle).unwrap();
            prop_assert_eq!(bytes.len(), handle.len());
            prop_assert!(bytes.iter().all(|b| *b == byte));
        }

        let reserved: usize = arena.chunks().map(|chunk| chunk.capacity()).sum();
        prop_assert_eq!(reserved, arena.total_capacity());
        prop_assert!(arena.chunks().all(|chunk| chunk.used() <= chunk.capacity()));
    }
}
