//! Error types for the sprite pool.

use thiserror::Error;

use crate::sprite::SpriteList;

/// Result type alias using [`PoolError`].
pub type Result<T> = std::result::Result<T, PoolError>;

/// Top-level error type for all sprite pool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No slot could be handed out for the requested list.
    ///
    /// Returned both when the free list is empty and when the misc-effect
    /// soft cap refuses the request; callers skip spawning either way.
    #[error("No sprite capacity for list {list:?}")]
    NoCapacity {
        /// List the allocation was requested for.
        list: SpriteList,
    },

    /// Slot index outside the pool.
    #[error("Invalid sprite index: {0}")]
    InvalidIndex(u16),

    /// Operation requires an allocated sprite but the slot is free.
    #[error("Sprite {0} is not allocated")]
    NotAllocated(u16),

    /// Sprites cannot be allocated into this list (the free list, or a
    /// `Null` identifier).
    #[error("Cannot allocate into list {0:?}")]
    InvalidList(Option<SpriteList>),

    /// Configuration values are out of range.
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text failed to parse.
    #[error("Failed to parse pool configuration: {message}")]
    ConfigParse {
        /// Parser error message.
        message: String,
    },

    /// Save blob could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
