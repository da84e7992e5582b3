//! Orthogonal capability components an [`crate::entity::Entity`] can carry.
//!
//! Instead of an inheritance chain ("healthy", "harmful", "healing",
//! "path finding"), an entity holds an optional component per concern. The
//! overlap pass asks "does this occupant expose [`Health`]?" and applies every
//! [`OverlapEffect`] the acting occupant carries.

/// Hit points with a change flag for the visual layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Health {
    health: f64,
    max_health: f64,
    updated: bool,
}

impl Health {
    /// Full health, with `max_health == health`.
    pub fn new(health: f64) -> Self {
        Health::with_max(health, health)
    }

    /// Explicit current and maximum health.
    pub fn with_max(health: f64, max_health: f64) -> Self {
        Health {
            health,
            max_health,
            updated: false,
        }
    }

    /// Current health.
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Upper bound applied by healing.
    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    /// Sets the current health, flagging the change if the value differs.
    pub fn set(&mut self, value: f64) {
        if value != self.health {
            self.health = value;
            self.updated = true;
        }
    }

    /// Subtracts `amount`.
    pub fn damage(&mut self, amount: f64) {
        self.set(self.health - amount);
    }

    /// Adds `amount`, never raising health above `max_health`. Health that is
    /// already above the maximum is left alone.
    pub fn heal(&mut self, amount: f64) {
        if self.health < self.max_health {
            self.set((self.health + amount).min(self.max_health));
        }
    }

    /// Health is above zero.
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Health is zero or below.
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Health changed since the last reset.
    pub fn updated(&self) -> bool {
        self.updated
    }

    /// Clears the change flag.
    pub fn reset_updated(&mut self) {
        self.updated = false;
    }
}

/// Something applied every tick to each co-located occupant with [`Health`].
pub trait OverlapEffect {
    /// Applies the effect to one target.
    fn apply(&self, target: &mut Health);
}

/// Harmful: removes the wrapped amount of hit points per tick from every
/// co-located occupant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Damage(pub f64);

impl OverlapEffect for Damage {
    fn apply(&self, target: &mut Health) {
        target.damage(self.0);
    }
}

/// Healing: restores the wrapped amount of hit points per tick, capped at the
/// target's maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Healing(pub f64);

impl OverlapEffect for Healing {
    fn apply(&self, target: &mut Health) {
        target.heal(self.0);
    }
}
