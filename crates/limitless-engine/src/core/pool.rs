/// Fixed-capacity object pool.
/// Slots are recycled through a free-index stack instead of being allocated and dropped,
/// so steady-state spawning never touches the allocator.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

struct Slot<T> {
    active: bool,
    value: T,
}

impl<T: Default> Pool<T> {
    /// Create a pool with `capacity` inactive slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                active: false,
                value: T::default(),
            })
            .collect();
        // Reverse so the lowest index is handed out first.
        let free = (0..capacity).rev().collect();
        Self { slots, free }
    }
}

impl<T> Pool<T> {
    /// Activate a free slot holding `value`. Returns its index, or `None` when full.
    pub fn acquire(&mut self, value: T) -> Option<usize> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index];
        slot.active = true;
        slot.value = value;
        Some(index)
    }

    /// Deactivate a slot. Releasing an inactive slot is a no-op and returns false.
    pub fn release(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.active => {
                slot.active = false;
                self.free.push(index);
                true
            }
            _ => false,
        }
    }

    /// Get an active slot's value.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots
            .get(index)
            .filter(|slot| slot.active)
            .map(|slot| &slot.value)
    }

    /// Get an active slot's value mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots
            .get_mut(index)
            .filter(|slot| slot.active)
            .map(|slot| &mut slot.value)
    }

    /// Iterate over active slots as `(index, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(i, slot)| (i, &slot.value))
    }

    /// Iterate over active slots mutably as `(index, value)`.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(i, slot)| (i, &mut slot.value))
    }

    /// Number of active slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no slot is active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Deactivate every slot.
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.active = false;
            self.free.push(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_get() {
        let mut pool: Pool<u32> = Pool::with_capacity(4);
        let i = pool.acquire(7).unwrap();
        assert_eq!(i, 0);
        assert_eq!(pool.get(i), Some(&7));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn released_slots_are_recycled() {
        let mut pool: Pool<u32> = Pool::with_capacity(2);
        let a = pool.acquire(1).unwrap();
        pool.acquire(2).unwrap();
        assert!(pool.acquire(3).is_none());
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert_eq!(pool.acquire(4), Some(a));
        assert_eq!(pool.get(a), Some(&4));
    }

    #[test]
    fn clear_deactivates_everything() {
        let mut pool: Pool<u32> = Pool::with_capacity(3);
        pool.acquire(1);
        pool.acquire(2);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.iter().count(), 0);
        assert_eq!(pool.acquire(9), Some(0));
    }
}
