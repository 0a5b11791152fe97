use crate::game::Game;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    Exact,
    /// The true score is at least `score`
    Lower,
    /// The true score is at most `score`
    Upper,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CacheEntry {
    /// Remaining search depth the score was computed with
    pub depth: u32,
    pub score: i32,
    pub bound: Bound,
}

struct PositionCache<G: Game> {
    map: HashMap<G::Position, CacheEntry>,
    deque: VecDeque<G::Position>,
}

/// Bounded transposition table shared between searches, oldest entries are evicted first
pub struct SearchCache<G: Game> {
    lock: RwLock<PositionCache<G>>,
    max_size: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<G: Game> SearchCache<G> {
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0);
        Self {
            lock: RwLock::new(PositionCache {
                map: HashMap::new(),
                deque: VecDeque::new(),
            }),
            max_size,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Entry for `position` if it was searched at least `depth` plies deep
    pub fn get(&self, position: &G::Position, depth: u32) -> Option<CacheEntry> {
        let cache = self.lock.read().unwrap_or_else(|e| e.into_inner());
        match cache.map.get(position) {
            Some(entry) if entry.depth >= depth => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*entry)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, position: &G::Position, entry: CacheEntry) {
        let mut cache = self.lock.write().unwrap_or_else(|e| e.into_inner());

        // Keep the deeper of two searches of the same position
        if let Some(existing) = cache.map.get_mut(position) {
            if existing.depth <= entry.depth {
                *existing = entry;
            }
            return;
        }

        // Remove oldest cached elements if needed
        while cache.deque.len() >= self.max_size {
            match cache.deque.pop_front() {
                Some(pos) => {
                    cache.map.remove(&pos);
                }
                None => break,
            }
        }

        cache.map.insert(position.clone(), entry);
        cache.deque.push_back(position.clone());
    }

    pub fn len(&self) -> usize {
        self.lock.read().unwrap_or_else(|e| e.into_inner()).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
