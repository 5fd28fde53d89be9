//! Generational slot arena for scene objects
//!
//! Handles carry (index, generation); a removed slot bumps its generation
//! so stale handles are rejected instead of silently aliasing whatever
//! object reuses the index. Insertion always picks the smallest free index
//! to keep the workspace matrix dense.

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub(crate) struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    capacity: usize,
    len: usize,
}

impl<T> SlotArena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Insert at the smallest free index. Returns `None` when full.
    pub(crate) fn insert(&mut self, value: T) -> Option<(usize, u32)> {
        if self.is_full() {
            return None;
        }
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_none() {
                slot.value = Some(value);
                self.len += 1;
                return Some((index, slot.generation));
            }
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.len += 1;
        Some((index, 0))
    }

    pub(crate) fn get(&self, index: usize, generation: u32) -> Option<&T> {
        let slot = self.slots.get(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, index: usize, generation: u32) -> Option<&mut T> {
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Remove and bump the slot generation so the handle goes dead
    pub(crate) fn remove(&mut self, index: usize, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        if slot.generation != generation || slot.value.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        slot.value.take()
    }

    /// Occupied slots, in index order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_picks_smallest_free_index() {
        let mut arena = SlotArena::with_capacity(4);
        let (i0, _) = arena.insert("a").unwrap();
        let (i1, g1) = arena.insert("b").unwrap();
        let (i2, _) = arena.insert("c").unwrap();
        assert_eq!((i0, i1, i2), (0, 1, 2));

        arena.remove(i1, g1).unwrap();
        let (i, g) = arena.insert("d").unwrap();
        assert_eq!(i, 1);
        assert_eq!(g, g1 + 1);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut arena = SlotArena::with_capacity(2);
        let (i, g) = arena.insert(7).unwrap();
        arena.remove(i, g).unwrap();
        arena.insert(8).unwrap();

        assert!(arena.get(i, g).is_none());
        assert!(arena.remove(i, g).is_none());
        assert_eq!(arena.get(i, g + 1), Some(&8));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut arena = SlotArena::with_capacity(2);
        arena.insert(1).unwrap();
        arena.insert(2).unwrap();
        assert!(arena.insert(3).is_none());
        assert!(arena.is_full());
    }
}
