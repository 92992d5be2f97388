//! Identifiers for creatures, limbs and query receivers

use std::fmt;

/// Identifies one creature in a [`CrawlerWorld`](crate::world::CrawlerWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub u32);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "creature#{}", self.0)
    }
}

/// Generational handle to a limb slot in a creature's pool.
///
/// The generation is bumped every time the slot goes back to the pool, so a
/// handle held across a recycle no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LimbId {
    index: u32,
    generation: u32,
}

impl LimbId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for LimbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limb#{}v{}", self.index, self.generation)
    }
}

/// Who a batched query result is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryReceiver {
    /// A limb's clearance check
    Limb { creature: CreatureId, limb: LimbId },
    /// A creature's body ground probe
    Creature(CreatureId),
}

impl QueryReceiver {
    /// The creature that owns the receiver
    pub fn creature(&self) -> CreatureId {
        match self {
            Self::Limb { creature, .. } => *creature,
            Self::Creature(creature) => *creature,
        }
    }
}
