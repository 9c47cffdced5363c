//! Bounded resource pools and derived attributes.

use std::ops::{Add, Sub};

/// Numeric types usable inside a [`Pool`].
pub trait PoolValue: Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> {
    const ZERO: Self;
}

impl PoolValue for i32 {
    const ZERO: Self = 0;
}

impl PoolValue for f64 {
    const ZERO: Self = 0.0;
}

fn clamp<T: PoolValue>(value: T, lo: T, hi: T) -> T {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// `{current, max}` pair with the invariant `0 ≤ current ≤ max`.
///
/// Fields are private so every mutation goes through a clamping method.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool<T> {
    current: T,
    max: T,
}

impl<T: PoolValue> Pool<T> {
    pub fn new(current: T, max: T) -> Self {
        let max = if max < T::ZERO { T::ZERO } else { max };
        Self {
            current: clamp(current, T::ZERO, max),
            max,
        }
    }

    /// Pool filled to `max`.
    pub fn full(max: T) -> Self {
        Self::new(max, max)
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn set_current(&mut self, value: T) {
        self.current = clamp(value, T::ZERO, self.max);
    }

    /// Changes the maximum and clips `current` to it.
    pub fn set_max(&mut self, max: T) {
        self.max = if max < T::ZERO { T::ZERO } else { max };
        self.current = clamp(self.current, T::ZERO, self.max);
    }

    /// Adds `amount`, saturating at `max`.
    pub fn restore(&mut self, amount: T) {
        self.set_current(self.current + amount);
    }

    /// Subtracts `amount`, saturating at zero.
    pub fn deplete(&mut self, amount: T) {
        self.set_current(self.current - amount);
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current <= T::ZERO
    }
}

impl<T: PoolValue> Default for Pool<T> {
    fn default() -> Self {
        Self {
            current: T::ZERO,
            max: T::ZERO,
        }
    }
}

/// `{base, modifier, total}` with `total = base + modifier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub base: i32,
    pub modifier: i32,
    pub total: i32,
}

impl Attribute {
    pub const fn new(base: i32) -> Self {
        Self {
            base,
            modifier: 0,
            total: base,
        }
    }

    /// Drops every modifier, back to `base`.
    pub fn reset(&mut self) {
        self.modifier = 0;
        self.recompute();
    }

    pub fn add_modifier(&mut self, amount: i32) {
        self.modifier += amount;
        self.recompute();
    }

    pub fn recompute(&mut self) {
        self.total = self.base + self.modifier;
    }
}

/// The character attribute block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    pub vitality: Attribute,
    pub strength: Attribute,
    pub sensation: Attribute,
    pub dexterity: Attribute,
    pub agility: Attribute,
    pub defense: Attribute,
}

impl Attributes {
    pub fn new(
        vitality: i32,
        strength: i32,
        sensation: i32,
        dexterity: i32,
        agility: i32,
        defense: i32,
    ) -> Self {
        Self {
            vitality: Attribute::new(vitality),
            strength: Attribute::new(strength),
            sensation: Attribute::new(sensation),
            dexterity: Attribute::new(dexterity),
            agility: Attribute::new(agility),
            defense: Attribute::new(defense),
        }
    }

    pub fn reset_modifiers(&mut self) {
        for attribute in self.iter_mut() {
            attribute.reset();
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        [
            &mut self.vitality,
            &mut self.strength,
            &mut self.sensation,
            &mut self.dexterity,
            &mut self.agility,
            &mut self.defense,
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_clamps_on_every_mutation() {
        let mut pool = Pool::new(150, 100);
        assert_eq!(pool.current(), 100);

        pool.deplete(250);
        assert_eq!(pool.current(), 0);

        pool.restore(30);
        pool.set_max(20);
        assert_eq!(pool.current(), 20);
        assert_eq!(pool.max(), 20);

        pool.set_current(-5);
        assert_eq!(pool.current(), 0);
    }

    #[test]
    fn float_pool_clamps() {
        let mut weight = Pool::new(0.0, 14.0);
        weight.set_current(20.5);
        assert_eq!(weight.current(), 14.0);
        assert!(weight.is_full());
    }

    #[test]
    fn attribute_total_tracks_modifier() {
        let mut attr = Attribute::new(6);
        attr.add_modifier(3);
        assert_eq!(attr.total, 9);
        attr.reset();
        assert_eq!(attr.total, attr.base);
    }
}
