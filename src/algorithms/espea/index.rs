//! Stable small-integer indices for archive members.

use std::collections::HashMap;

use crate::IndividualId;

/// An occupied slot: the member's id and the value stored alongside it.
#[derive(Debug, Clone)]
pub struct Slot<V> {
    pub id: IndividualId,
    pub value: V,
}

/// Maps individuals to indices in `0..=capacity` and back.
///
/// Holds `capacity + 1` slots so one individual can be admitted provisionally
/// on top of a full archive. Released indices go onto a LIFO free list and are
/// handed out again before untouched ones. Iteration visits occupied slots in
/// ascending index order, optionally restricted to a sub-range, which is what
/// the triangular energy table needs.
#[derive(Debug, Clone)]
pub struct IndexAllocator<V> {
    indices: HashMap<IndividualId, usize>,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
}

impl<V> IndexAllocator<V> {
    pub fn new(capacity: usize) -> Self {
        let slot_count = capacity + 1;
        Self {
            indices: HashMap::with_capacity(slot_count),
            slots: (0..slot_count).map(|_| None).collect(),
            // Popped from the back, so index 0 comes first.
            free: (0..slot_count).rev().collect(),
        }
    }

    /// Total number of slots (`capacity + 1`).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Assigns the next free index to `id`.
    ///
    /// # Panics
    ///
    /// Panics if every slot is taken or `id` already holds an index. Callers
    /// enforce the capacity bound before assigning.
    pub fn assign(&mut self, id: IndividualId, value: V) -> usize {
        assert!(
            !self.indices.contains_key(&id),
            "individual {id} already holds an index"
        );
        let Some(index) = self.free.pop() else {
            panic!("index allocator is full ({} slots)", self.slots.len());
        };
        debug_assert!(self.slots[index].is_none(), "free index {index} is occupied");
        self.indices.insert(id, index);
        self.slots[index] = Some(Slot { id, value });
        debug_assert_eq!(self.free.len() + self.indices.len(), self.slots.len());
        index
    }

    /// Releases the index held by `id`, returning it together with the
    /// stored value.
    pub fn release(&mut self, id: IndividualId) -> Option<(usize, V)> {
        let index = self.indices.remove(&id)?;
        let slot = self.slots[index].take()?;
        self.free.push(index);
        debug_assert_eq!(self.free.len() + self.indices.len(), self.slots.len());
        Some((index, slot.value))
    }

    pub fn lookup(&self, id: IndividualId) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    pub fn contains(&self, id: IndividualId) -> bool {
        self.indices.contains_key(&id)
    }

    /// Reverse lookup.
    pub fn get(&self, index: usize) -> Option<&Slot<V>> {
        self.slots.get(index)?.as_ref()
    }

    /// Occupied slots with index in `[start, end)`, ascending.
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = (usize, &Slot<V>)> {
        let end = end.min(self.slots.len());
        let start = start.min(end);
        self.slots[start..end]
            .iter()
            .enumerate()
            .filter_map(move |(offset, slot)| slot.as_ref().map(|s| (start + offset, s)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot<V>)> {
        self.range(0, self.slots.len())
    }

    /// Occupied slots below `end`.
    pub fn iter_to(&self, end: usize) -> impl Iterator<Item = (usize, &Slot<V>)> {
        self.range(0, end)
    }

    /// Occupied slots from `start` on.
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = (usize, &Slot<V>)> {
        self.range(start, self.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> IndividualId {
        IndividualId::new(n)
    }

    #[test]
    fn test_assigns_ascending_then_reuses_last_released() {
        let mut map = IndexAllocator::new(3);
        assert_eq!(map.slot_count(), 4);
        assert_eq!(map.assign(id(10), ()), 0);
        assert_eq!(map.assign(id(11), ()), 1);
        assert_eq!(map.assign(id(12), ()), 2);

        assert_eq!(map.release(id(11)).map(|(i, _)| i), Some(1));
        assert_eq!(map.lookup(id(11)), None);
        assert!(map.get(1).is_none());

        assert_eq!(map.assign(id(13), ()), 1);
        assert_eq!(map.get(1).map(|s| s.id), Some(id(13)));
        assert_eq!(map.lookup(id(13)), Some(1));
    }

    #[test]
    fn test_tolerates_one_provisional_member() {
        let mut map = IndexAllocator::new(2);
        for n in 0..3 {
            map.assign(id(n), ());
        }
        assert!(map.is_full());
        assert_eq!(map.len(), 3);
    }

    #[test]
    #[should_panic(expected = "index allocator is full")]
    fn test_assign_past_slots_panics() {
        let mut map = IndexAllocator::new(1);
        for n in 0..3 {
            map.assign(id(n), ());
        }
    }

    #[test]
    #[should_panic(expected = "already holds an index")]
    fn test_double_assign_panics() {
        let mut map = IndexAllocator::new(3);
        map.assign(id(1), ());
        map.assign(id(1), ());
    }

    #[test]
    fn test_range_iteration_skips_free_slots() {
        let mut map = IndexAllocator::new(5);
        for n in 0..5 {
            map.assign(id(n), n * 10);
        }
        map.release(id(1));
        map.release(id(3));

        let all: Vec<usize> = map.iter().map(|(i, _)| i).collect();
        assert_eq!(all, vec![0, 2, 4]);
        let below: Vec<usize> = map.iter_to(3).map(|(i, _)| i).collect();
        assert_eq!(below, vec![0, 2]);
        let above: Vec<u64> = map.iter_from(2).map(|(_, s)| s.value).collect();
        assert_eq!(above, vec![20, 40]);
    }

    #[test]
    fn test_release_unknown_is_none() {
        let mut map: IndexAllocator<()> = IndexAllocator::new(2);
        assert!(map.release(id(7)).is_none());
    }
}
