//! Reusable limb controllers

use crate::ids::LimbId;
use crate::limb::LimbController;

#[derive(Debug)]
struct Slot {
    generation: u32,
    live: bool,
    limb: LimbController,
}

/// Per-creature pool of limb controllers.
///
/// Slots are never dropped; a released slot goes on the free list with its
/// generation bumped so outstanding [`LimbId`]s stop resolving.
#[derive(Debug)]
pub struct LimbPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    resolution: usize,
    update_divisor: u32,
    live: usize,
    peak_live: usize,
}

impl LimbPool {
    /// Create a pool, constructing `prewarm` controllers up front
    pub fn new(resolution: usize, update_divisor: u32, prewarm: usize) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(prewarm),
            free: Vec::with_capacity(prewarm),
            resolution,
            update_divisor: update_divisor.max(1),
            live: 0,
            peak_live: 0,
        };
        for _ in 0..prewarm {
            let index = pool.construct();
            pool.free.push(index);
        }
        // acquire pops from the back, hand out low slots first
        pool.free.reverse();
        pool
    }

    fn construct(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        let frame_phase = index % self.update_divisor;
        self.slots.push(Slot {
            generation: 0,
            live: false,
            limb: LimbController::new(frame_phase, self.resolution),
        });
        index
    }

    /// Take a controller from the free list, constructing one if it is empty
    pub fn acquire(&mut self) -> (LimbId, &mut LimbController) {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                log::trace!("limb pool empty, constructing slot {}", self.slots.len());
                self.construct()
            }
        };

        self.live += 1;
        self.peak_live = self.peak_live.max(self.live);

        let slot = &mut self.slots[index as usize];
        slot.live = true;
        (LimbId::new(index, slot.generation), &mut slot.limb)
    }

    /// Return a controller to the pool. Returns `false` for stale handles.
    pub fn release(&mut self, id: LimbId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return false;
        };
        if !slot.live || slot.generation != id.generation() {
            return false;
        }

        slot.limb.deactivate();
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        true
    }

    /// Resolve a live handle
    pub fn get(&self, id: LimbId) -> Option<&LimbController> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.live && slot.generation == id.generation())
            .map(|slot| &slot.limb)
    }

    /// Resolve a live handle mutably
    pub fn get_mut(&mut self, id: LimbId) -> Option<&mut LimbController> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.live && slot.generation == id.generation())
            .map(|slot| &mut slot.limb)
    }

    /// Iterate live controllers
    pub fn iter(&self) -> impl Iterator<Item = (LimbId, &LimbController)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.live)
            .map(|(index, slot)| (LimbId::new(index as u32, slot.generation), &slot.limb))
    }

    /// Iterate live controllers mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LimbId, &mut LimbController)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.live)
            .map(|(index, slot)| (LimbId::new(index as u32, slot.generation), &mut slot.limb))
    }

    /// Controllers currently handed out
    pub fn live(&self) -> usize {
        self.live
    }

    /// Highest `live` ever observed
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    /// Controllers ever constructed
    pub fn constructed(&self) -> usize {
        self.slots.len()
    }

    /// Controllers waiting on the free list
    pub fn available(&self) -> usize {
        self.free.len()
    }
}
