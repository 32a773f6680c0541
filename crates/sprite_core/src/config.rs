//! Pool configuration.
//!
//! Pure data, deserialized from RON. File loading is left to the caller.
//!
//! # Example RON
//!
//! ```ron
//! PoolConfig(
//!     capacity: 10000,
//!     misc_soft_cap: 300,
//!     litter_cap: 500,
//!     map_size: 256,
//!     littering_enabled: true,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::coords::{MapBounds, MAXIMUM_MAP_SIZE};
use crate::error::{PoolError, Result};

/// Largest pool the 16-bit slot handles can address.
pub const MAX_CAPACITY: u16 = 0xFFFE;

/// Sizing and policy knobs for a [`SpritePool`](crate::pool::SpritePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of slots.
    pub capacity: u16,
    /// Most misc effects allowed at once; also the free-slot headroom they
    /// must leave for gameplay sprites.
    pub misc_soft_cap: u16,
    /// Litter count at which the newest litter is recycled.
    pub litter_cap: u16,
    /// Map edge length in tiles.
    pub map_size: u16,
    /// Whether guests may drop litter.
    pub littering_enabled: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            misc_soft_cap: 300,
            litter_cap: 500,
            map_size: MAXIMUM_MAP_SIZE,
            littering_enabled: true,
        }
    }
}

impl PoolConfig {
    /// Default configuration with a different capacity and misc cap.
    #[must_use]
    pub fn with_capacity(capacity: u16, misc_soft_cap: u16) -> Self {
        Self {
            capacity,
            misc_soft_cap,
            ..Self::default()
        }
    }

    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| PoolError::ConfigParse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(PoolError::InvalidConfig(format!(
                "capacity must be in 1..={MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }
        if self.misc_soft_cap >= self.capacity {
            return Err(PoolError::InvalidConfig(format!(
                "misc_soft_cap ({}) must be below capacity ({})",
                self.misc_soft_cap, self.capacity
            )));
        }
        if self.map_size == 0 || self.map_size > MAXIMUM_MAP_SIZE {
            return Err(PoolError::InvalidConfig(format!(
                "map_size must be in 1..={MAXIMUM_MAP_SIZE}, got {}",
                self.map_size
            )));
        }
        Ok(())
    }

    /// World bounds implied by `map_size`.
    #[must_use]
    pub const fn map_bounds(&self) -> MapBounds {
        MapBounds::new(self.map_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_ron() {
        let config = PoolConfig::from_ron_str("(capacity: 64, misc_soft_cap: 8)").unwrap();
        assert_eq!(config.capacity, 64);
        assert_eq!(config.misc_soft_cap, 8);
        assert_eq!(config.litter_cap, 500);
        assert!(config.littering_enabled);
    }

    #[test]
    fn test_rejects_cap_above_capacity() {
        let err = PoolConfig::with_capacity(10, 10).validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(PoolConfig::with_capacity(0, 0).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_ron() {
        let err = PoolConfig::from_ron_str("(capacity: \"lots\")").unwrap_err();
        assert!(matches!(err, PoolError::ConfigParse { .. }));
    }

    #[test]
    fn test_rejects_oversized_map() {
        let config = PoolConfig {
            map_size: 300,
            ..PoolConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
