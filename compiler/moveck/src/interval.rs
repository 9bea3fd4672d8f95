//! Field-sensitive interval sets and the pooled allocator that owns them.
//!
//! A noncopyable aggregate's top-level fields are numbered `0..fields`.
//! Liveness facts ("which fields may be consumed here") are sets of
//! half-open field ranges. Checking many markers in one body creates and
//! discards a lot of these sets, so they live in an [`IntervalAllocator`]
//! slot pool shared by both engines for one function and reset when the
//! function-level check completes.

use std::fmt;

use smallvec::SmallVec;

/// Half-open range of top-level field indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRange {
    pub start: u32,
    pub end: u32,
}

impl FieldRange {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        FieldRange { start, end }
    }

    /// Every field of a value with `fields` top-level fields.
    #[inline]
    pub const fn whole(fields: u32) -> Self {
        FieldRange::new(0, fields)
    }

    /// Just field `field`.
    #[inline]
    pub const fn single(field: u32) -> Self {
        FieldRange::new(field, field + 1)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(self, other: FieldRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Debug for FieldRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A set of fields, stored as sorted, disjoint, non-adjacent ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntervalSet {
    ranges: SmallVec<[FieldRange; 2]>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_range(range: FieldRange) -> Self {
        let mut set = Self::new();
        set.insert(range);
        set
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[FieldRange] {
        &self.ranges
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Whether any field of `range` is in the set.
    pub fn overlaps(&self, range: FieldRange) -> bool {
        self.ranges.iter().any(|r| r.overlaps(range))
    }

    /// Whether every field of `range` is in the set.
    pub fn contains_range(&self, range: FieldRange) -> bool {
        range.is_empty()
            || self
                .ranges
                .iter()
                .any(|r| r.start <= range.start && range.end <= r.end)
    }

    /// Add `range`. Returns whether the set changed.
    pub fn insert(&mut self, range: FieldRange) -> bool {
        if range.is_empty() || self.contains_range(range) {
            return false;
        }
        let mut merged = range;
        let mut placed = false;
        let mut out: SmallVec<[FieldRange; 2]> = SmallVec::with_capacity(self.ranges.len() + 1);
        for &r in &self.ranges {
            if r.end < merged.start {
                out.push(r);
            } else if merged.end < r.start {
                if !placed {
                    out.push(merged);
                    placed = true;
                }
                out.push(r);
            } else {
                merged = FieldRange::new(merged.start.min(r.start), merged.end.max(r.end));
            }
        }
        if !placed {
            out.push(merged);
        }
        self.ranges = out;
        true
    }

    /// Remove `range`. Returns whether the set changed.
    pub fn remove(&mut self, range: FieldRange) -> bool {
        if range.is_empty() || !self.overlaps(range) {
            return false;
        }
        let mut out: SmallVec<[FieldRange; 2]> = SmallVec::with_capacity(self.ranges.len() + 1);
        for &cur in &self.ranges {
            if !cur.overlaps(range) {
                out.push(cur);
                continue;
            }
            if cur.start < range.start {
                out.push(FieldRange::new(cur.start, range.start));
            }
            if range.end < cur.end {
                out.push(FieldRange::new(range.end, cur.end));
            }
        }
        self.ranges = out;
        true
    }

    /// `self ∪= other`. Returns whether the set changed.
    pub fn union_with(&mut self, other: &IntervalSet) -> bool {
        let mut changed = false;
        for &r in &other.ranges {
            changed |= self.insert(r);
        }
        changed
    }

    /// `self ∩= other`. Returns whether the set changed.
    pub fn intersect_with(&mut self, other: &IntervalSet) -> bool {
        let mut out: SmallVec<[FieldRange; 2]> = SmallVec::new();
        for &a in &self.ranges {
            for &b in &other.ranges {
                let r = FieldRange::new(a.start.max(b.start), a.end.min(b.end));
                if !r.is_empty() {
                    out.push(r);
                }
            }
        }
        if out == self.ranges {
            return false;
        }
        self.ranges = out;
        true
    }
}

/// Handle to an [`IntervalSet`] owned by an [`IntervalAllocator`].
///
/// Handles carry the generation of the slot they were issued from; once
/// the slot is released or the allocator reset, the handle resolves to
/// nothing instead of aliasing whatever reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntervalId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    set: IntervalSet,
    generation: u32,
    live: bool,
}

/// Slot pool of interval sets, scoped to one function-level check.
#[derive(Debug, Default)]
pub struct IntervalAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl IntervalAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a set holding `range` (empty ranges give an empty set).
    pub fn allocate(&mut self, range: FieldRange) -> IntervalId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            slot.set.clear();
            slot.set.insert(range);
            return IntervalId {
                index,
                generation: slot.generation,
            };
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "interval slot counts fit in u32"
        )]
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            set: IntervalSet::from_range(range),
            generation: 0,
            live: true,
        });
        IntervalId {
            index,
            generation: 0,
        }
    }

    /// Allocate an empty set.
    pub fn allocate_empty(&mut self) -> IntervalId {
        self.allocate(FieldRange::new(0, 0))
    }

    fn slot(&self, id: IntervalId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.live && s.generation == id.generation)
    }

    /// Whether `id` still refers to a live set.
    pub fn is_valid(&self, id: IntervalId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: IntervalId) -> Option<&IntervalSet> {
        self.slot(id).map(|s| &s.set)
    }

    pub fn get_mut(&mut self, id: IntervalId) -> Option<&mut IntervalSet> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.live && s.generation == id.generation)
            .map(|s| &mut s.set)
    }

    /// Return a set to the pool. Returns `false` for stale handles.
    pub fn release(&mut self, id: IntervalId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        true
    }

    /// Invalidate every outstanding handle, keeping slot storage for reuse.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            if slot.live {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.set.clear();
        }
        self.free.clear();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "interval slot counts fit in u32"
        )]
        self.free.extend((0..self.slots.len() as u32).rev());
    }

    /// Number of live sets.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    /// Number of slots ever created.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Borrow `dst` mutably and `src` shared. `None` if either is stale or
    /// both name the same slot.
    fn pair_mut(
        &mut self,
        dst: IntervalId,
        src: IntervalId,
    ) -> Option<(&mut IntervalSet, &IntervalSet)> {
        if !self.is_valid(dst) || !self.is_valid(src) || dst.index == src.index {
            return None;
        }
        let (d, s) = (dst.index as usize, src.index as usize);
        if d < s {
            let (lo, hi) = self.slots.split_at_mut(s);
            Some((&mut lo[d].set, &hi[0].set))
        } else {
            let (lo, hi) = self.slots.split_at_mut(d);
            Some((&mut hi[0].set, &lo[s].set))
        }
    }

    /// `dst = src`. Returns whether `dst` changed.
    pub fn copy_into(&mut self, dst: IntervalId, src: IntervalId) -> bool {
        let Some((d, s)) = self.pair_mut(dst, src) else {
            return false;
        };
        if *d == *s {
            return false;
        }
        d.clone_from(s);
        true
    }

    /// `dst ∪= src`. Returns whether `dst` changed.
    pub fn union_into(&mut self, dst: IntervalId, src: IntervalId) -> bool {
        self.pair_mut(dst, src).is_some_and(|(d, s)| d.union_with(s))
    }

    /// `dst ∩= src`. Returns whether `dst` changed.
    pub fn intersect_into(&mut self, dst: IntervalId, src: IntervalId) -> bool {
        self.pair_mut(dst, src)
            .is_some_and(|(d, s)| d.intersect_with(s))
    }
}
