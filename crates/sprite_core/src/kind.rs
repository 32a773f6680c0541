//! Typed views over sprite tags.
//!
//! Each marker type answers "is this slot one of mine?" from the slot's
//! [`SpriteKind`] alone, so checks are a tag comparison rather than a
//! runtime type lookup.

use crate::sprite::{MiscKind, SpriteKind, SpriteList};

/// A class of sprite that can be tested for and iterated.
pub trait SpriteType {
    /// Lists sprites of this class live in, walked in this order.
    const LISTS: &'static [SpriteList];

    /// Whether `kind` belongs to this class.
    fn matches(kind: SpriteKind) -> bool;
}

/// Any ride vehicle, including train heads.
#[derive(Debug, Clone, Copy)]
pub struct Vehicle;

impl SpriteType for Vehicle {
    const LISTS: &'static [SpriteList] = &[SpriteList::TrainHead, SpriteList::Vehicle];

    fn matches(kind: SpriteKind) -> bool {
        kind == SpriteKind::Vehicle
    }
}

/// Guest or staff.
#[derive(Debug, Clone, Copy)]
pub struct Peep;

impl SpriteType for Peep {
    const LISTS: &'static [SpriteList] = &[SpriteList::Peep];

    fn matches(kind: SpriteKind) -> bool {
        kind == SpriteKind::Peep
    }
}

/// Litter of any kind.
#[derive(Debug, Clone, Copy)]
pub struct Litter;

impl SpriteType for Litter {
    const LISTS: &'static [SpriteList] = &[SpriteList::Litter];

    fn matches(kind: SpriteKind) -> bool {
        matches!(kind, SpriteKind::Litter(_))
    }
}

macro_rules! misc_marker {
    ($($(#[$doc:meta])* $name:ident => $kind:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl SpriteType for $name {
                const LISTS: &'static [SpriteList] = &[SpriteList::Misc];

                fn matches(kind: SpriteKind) -> bool {
                    kind == SpriteKind::Misc(MiscKind::$kind)
                }
            }
        )*
    };
}

misc_marker! {
    /// Rising steam puff.
    SteamParticle => SteamParticle;
    /// Floating price text.
    MoneyEffect => MoneyEffect;
    /// Smoke cloud.
    ExplosionCloud => ExplosionCloud;
    /// Explosion flash.
    ExplosionFlare => ExplosionFlare;
    /// Escaped balloon.
    Balloon => Balloon;
    /// Duck.
    Duck => Duck;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::LitterKind;

    #[test]
    fn test_markers_match_tags() {
        assert!(Litter::matches(SpriteKind::Litter(LitterKind::Rubbish)));
        assert!(!Litter::matches(SpriteKind::Peep));
        assert!(Balloon::matches(SpriteKind::Misc(MiscKind::Balloon)));
        assert!(!Balloon::matches(SpriteKind::Misc(MiscKind::Duck)));
        assert!(!SteamParticle::matches(SpriteKind::Null));
        assert_eq!(ExplosionFlare::LISTS, &[SpriteList::Misc]);
    }
}
