//! Weighted random selection.
//!
//! Sum the weights, draw a uniform variate in `[0, total)`, then walk the list
//! accumulating weights until the variate is exceeded. A list whose total
//! weight is zero (or empty) yields `None`, which callers treat as "nothing to
//! place" rather than an error.

use crate::rng::GameRng;

/// Anything carrying a selection weight.
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

impl<T> Weighted for (T, f64) {
    fn weight(&self) -> f64 {
        self.1
    }
}

/// Picks the index of one entry proportionally to its weight.
pub fn choose_index<T: Weighted>(rng: &mut GameRng, entries: &[T]) -> Option<usize> {
    let total: f64 = entries.iter().map(|e| e.weight().max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }

    let variate = rng.float64() * total;
    let mut acc = 0.0;
    let mut last_positive = None;
    for (i, entry) in entries.iter().enumerate() {
        let weight = entry.weight().max(0.0);
        if weight == 0.0 {
            continue;
        }
        acc += weight;
        last_positive = Some(i);
        if variate < acc {
            return Some(i);
        }
    }
    // Floating point rounding can leave the variate a hair above the sum.
    last_positive
}

/// Picks one entry proportionally to its weight.
pub fn choose<'a, T: Weighted>(rng: &mut GameRng, entries: &'a [T]) -> Option<&'a T> {
    choose_index(rng, entries).map(|i| &entries[i])
}
