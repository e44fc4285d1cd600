use serde::Serialize;

use crate::color::Rgb;

/// Default number of cache slots
pub const DEFAULT_CACHE_SLOTS: usize = 4096;

/// Hit/miss counters of a [`ColorCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Bounded, direct-mapped memo from a packed color key to its final RGB.
///
/// Every key maps to exactly one slot; a colliding insert replaces the
/// previous occupant, so lookups and inserts are O(1) and memory is fixed.
#[derive(Debug, Clone)]
pub struct ColorCache {
    slots: Box<[Option<(u32, Rgb)>]>,
    shift: u32,
    stats: CacheStats,
}

impl ColorCache {
    /// Create a cache with at least `slots` entries (rounded up to a power of two)
    pub fn new(slots: usize) -> Self {
        let slots = slots.max(2).next_power_of_two();
        Self {
            slots: vec![None; slots].into_boxed_slice(),
            shift: 32 - slots.trailing_zeros(),
            stats: CacheStats::default(),
        }
    }

    #[inline]
    fn slot(&self, key: u32) -> usize {
        // Fibonacci hashing spreads neighbouring keys over the table
        (key.wrapping_mul(0x9E37_79B9) >> self.shift) as usize
    }

    pub fn get(&mut self, key: u32) -> Option<Rgb> {
        match self.slots[self.slot(key)] {
            Some((stored, color)) if stored == key => {
                self.stats.hits += 1;
                Some(color)
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: u32, color: Rgb) {
        let slot = self.slot(key);
        self.slots[slot] = Some((key, color));
    }

    /// Drop every entry; counters are kept
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_insert_replaces_slot() {
        let mut cache = ColorCache::new(2);
        let red = Rgb { r: 255, g: 0, b: 0 };
        cache.insert(7, red);
        assert_eq!(cache.get(7), Some(red));
        for key in 0..64 {
            cache.insert(key, red);
        }
        assert!(cache.len() <= cache.capacity());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(7), None);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }
}
