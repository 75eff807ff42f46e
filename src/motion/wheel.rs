//! Wheel identifiers and per-wheel storage

use core::ops::{Index, IndexMut};

/// One side of the differential drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wheel {
    Left,
    Right,
}

impl Wheel {
    /// Both wheels, left first
    pub const ALL: [Wheel; 2] = [Wheel::Left, Wheel::Right];
}

/// Selection of wheels driven by a motion phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wheels {
    Both,
    Left,
    Right,
}

impl Wheels {
    /// Whether `wheel` is part of this selection
    pub fn contains(self, wheel: Wheel) -> bool {
        match self {
            Wheels::Both => true,
            Wheels::Left => wheel == Wheel::Left,
            Wheels::Right => wheel == Wheel::Right,
        }
    }

    /// Selection made of the flagged wheels, `None` if neither is flagged
    pub fn from_flags(left: bool, right: bool) -> Option<Self> {
        match (left, right) {
            (true, true) => Some(Wheels::Both),
            (true, false) => Some(Wheels::Left),
            (false, true) => Some(Wheels::Right),
            (false, false) => None,
        }
    }

    /// Selected wheels, left first
    pub fn iter(self) -> impl Iterator<Item = Wheel> {
        Wheel::ALL.into_iter().filter(move |w| self.contains(*w))
    }
}

/// A value kept for each wheel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PerWheel<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerWheel<T> {
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Apply `f` to both values
    pub fn map<U>(self, mut f: impl FnMut(Wheel, T) -> U) -> PerWheel<U> {
        PerWheel {
            left: f(Wheel::Left, self.left),
            right: f(Wheel::Right, self.right),
        }
    }
}

impl<T: Copy> PerWheel<T> {
    /// Same value for both wheels
    pub const fn splat(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }
}

impl<T> Index<Wheel> for PerWheel<T> {
    type Output = T;

    fn index(&self, wheel: Wheel) -> &T {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Wheel> for PerWheel<T> {
    fn index_mut(&mut self, wheel: Wheel) -> &mut T {
        match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        }
    }
}
