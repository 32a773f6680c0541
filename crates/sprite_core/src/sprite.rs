//! Sprite records and their classification tags.
//!
//! A [`Sprite`] is one fixed-size slot of the pool. Besides its payload it
//! carries three intrusive links: `prev`/`next` thread it into exactly one
//! [`SpriteList`], and `next_in_cell` threads it into one spatial bucket.
//! Link fields are crate-private; they only change through the list and
//! spatial entry points on [`SpritePool`](crate::pool::SpritePool).

use serde::{Deserialize, Serialize};

use crate::coords::CoordsXYZ;
use crate::viewport::{ScreenRect, SpriteBounds};

/// Stable handle of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpriteIndex(pub u16);

impl SpriteIndex {
    /// Slot position as a `usize` for array access.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SpriteIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type list a slot currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteList {
    /// Unallocated slots; the allocation source.
    Free,
    /// Lead vehicle of each train, moved here by ride logic.
    TrainHead,
    /// Guests and staff.
    Peep,
    /// Short-lived effects.
    Misc,
    /// Dropped rubbish.
    Litter,
    /// Ride vehicles.
    Vehicle,
}

impl SpriteList {
    /// Number of lists.
    pub const COUNT: usize = 6;

    /// All lists in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Free,
        Self::TrainHead,
        Self::Peep,
        Self::Misc,
        Self::Litter,
        Self::Vehicle,
    ];

    /// Position of this list in head/count tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Free => 0,
            Self::TrainHead => 1,
            Self::Peep => 2,
            Self::Misc => 3,
            Self::Litter => 4,
            Self::Vehicle => 5,
        }
    }
}

/// Coarse identity of a sprite, fixed for the lifetime of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteIdentifier {
    /// Ride vehicle.
    Vehicle,
    /// Guest or staff member.
    Peep,
    /// Effect sprite.
    Misc,
    /// Litter.
    Litter,
    /// Free slot.
    Null,
}

impl SpriteIdentifier {
    /// List a new allocation with this identifier joins.
    #[must_use]
    pub const fn home_list(self) -> Option<SpriteList> {
        match self {
            Self::Vehicle => Some(SpriteList::Vehicle),
            Self::Peep => Some(SpriteList::Peep),
            Self::Misc => Some(SpriteList::Misc),
            Self::Litter => Some(SpriteList::Litter),
            Self::Null => None,
        }
    }
}

/// Concrete effect kinds in the misc list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiscKind {
    /// Rising steam puff.
    SteamParticle,
    /// Floating price text.
    MoneyEffect,
    /// Debris from a crashed vehicle.
    CrashedVehicleParticle,
    /// Smoke cloud.
    ExplosionCloud,
    /// Splash from a vehicle landing in water.
    CrashSplash,
    /// Bright explosion flash.
    ExplosionFlare,
    /// Jumping fountain, water.
    JumpingFountainWater,
    /// Jumping fountain, snow.
    JumpingFountainSnow,
    /// Escaped balloon.
    Balloon,
    /// Duck.
    Duck,
}

/// Kinds of litter, in display-name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LitterKind {
    /// Vomit.
    Vomit,
    /// Vomit, alternative sprite.
    VomitAlt,
    /// Empty can.
    EmptyCan,
    /// Rubbish.
    Rubbish,
    /// Empty burger box.
    EmptyBurgerBox,
    /// Empty cup.
    EmptyCup,
    /// Empty box.
    EmptyBox,
    /// Empty bottle.
    EmptyBottle,
    /// Empty bowl, red.
    EmptyBowlRed,
    /// Empty drink carton.
    EmptyDrinkCarton,
    /// Empty juice cup.
    EmptyJuiceCup,
    /// Empty bowl, blue.
    EmptyBowlBlue,
}

/// Full type tag of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpriteKind {
    /// Free slot.
    #[default]
    Null,
    /// Ride vehicle.
    Vehicle,
    /// Guest or staff member.
    Peep,
    /// Litter of the given kind.
    Litter(LitterKind),
    /// Effect of the given kind.
    Misc(MiscKind),
}

impl SpriteKind {
    /// Coarse identifier for this kind.
    #[must_use]
    pub const fn identifier(self) -> SpriteIdentifier {
        match self {
            Self::Null => SpriteIdentifier::Null,
            Self::Vehicle => SpriteIdentifier::Vehicle,
            Self::Peep => SpriteIdentifier::Peep,
            Self::Litter(_) => SpriteIdentifier::Litter,
            Self::Misc(_) => SpriteIdentifier::Misc,
        }
    }

    /// Effect kind, if this is a misc sprite.
    #[must_use]
    pub const fn misc_kind(self) -> Option<MiscKind> {
        match self {
            Self::Misc(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Sprite is airborne (ducks taking off, etc).
pub const SPRITE_FLAG_AIRBORNE: u8 = 1 << 0;

/// One pool slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sprite {
    pub(crate) index: SpriteIndex,
    pub(crate) list: SpriteList,
    pub(crate) prev: Option<SpriteIndex>,
    pub(crate) next: Option<SpriteIndex>,
    pub(crate) next_in_cell: Option<SpriteIndex>,
    pub(crate) position: CoordsXYZ,
    pub(crate) screen: Option<ScreenRect>,
    /// Type tag.
    pub kind: SpriteKind,
    /// Image extents used to derive the screen rectangle.
    pub bounds: SpriteBounds,
    /// Behaviour flags (`SPRITE_FLAG_*`).
    pub flags: u8,
    /// Facing, in 1/32 turns.
    pub direction: u8,
    /// Animation frame counter.
    pub frame: u16,
    /// Generic per-kind timer.
    pub timer: u16,
    /// Tick the sprite was created on.
    pub creation_tick: u32,
}

impl Sprite {
    /// A scrubbed slot at `index`, not linked anywhere.
    #[must_use]
    pub(crate) fn vacant(index: SpriteIndex) -> Self {
        Self {
            index,
            list: SpriteList::Free,
            prev: None,
            next: None,
            next_in_cell: None,
            position: CoordsXYZ::NULL,
            screen: None,
            kind: SpriteKind::Null,
            bounds: SpriteBounds::DEFAULT,
            flags: 0,
            direction: 0,
            frame: 0,
            timer: 0,
            creation_tick: 0,
        }
    }

    /// Reset every field except identity and links.
    pub(crate) fn scrub(&mut self) {
        let index = self.index;
        let list = self.list;
        let prev = self.prev;
        let next = self.next;
        let next_in_cell = self.next_in_cell;

        *self = Self::vacant(index);

        self.list = list;
        self.prev = prev;
        self.next = next;
        self.next_in_cell = next_in_cell;
    }

    /// Slot handle.
    #[must_use]
    pub const fn index(&self) -> SpriteIndex {
        self.index
    }

    /// Current type list.
    #[must_use]
    pub const fn list(&self) -> SpriteList {
        self.list
    }

    /// Previous slot in the type list.
    #[must_use]
    pub const fn prev(&self) -> Option<SpriteIndex> {
        self.prev
    }

    /// Next slot in the type list.
    #[must_use]
    pub const fn next(&self) -> Option<SpriteIndex> {
        self.next
    }

    /// Next slot in the same spatial bucket.
    #[must_use]
    pub const fn next_in_cell(&self) -> Option<SpriteIndex> {
        self.next_in_cell
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> CoordsXYZ {
        self.position
    }

    /// Screen rectangle from the last placement, `None` when off-world.
    #[must_use]
    pub const fn screen(&self) -> Option<ScreenRect> {
        self.screen
    }

    /// Whether the slot is in use.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.list != SpriteList::Free
    }

    /// Whether a behaviour flag is set.
    #[must_use]
    pub const fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}
