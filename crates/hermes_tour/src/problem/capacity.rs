use std::{
    fmt,
    ops::{AddAssign, Index, Neg, SubAssign},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[f64; 2]>;

/// Multi-dimensional amount. Missing trailing dimensions read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Capacity(Vector);

impl Capacity {
    pub const EMPTY: Capacity = Capacity(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0.0);
        Capacity(vec)
    }

    pub fn from_vec(vec: Vec<f64>) -> Self {
        Capacity(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == 0.0)
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn update_max(&mut self, other: &Capacity) {
        let max_len = self.len().max(other.len());
        self.0.resize(max_len, 0.0);
        for i in 0..max_len {
            self.0[i] = self.0[i].max(other.get(i));
        }
    }

    pub fn update_min(&mut self, other: &Capacity) {
        let max_len = self.len().max(other.len());
        self.0.resize(max_len, 0.0);
        for i in 0..max_len {
            self.0[i] = self.0[i].min(other.get(i));
        }
    }

    pub fn negated(&self) -> Capacity {
        Capacity(self.0.iter().map(|value| -value).collect())
    }

    pub fn has_negative_dimension(&self) -> bool {
        self.0.iter().any(|&value| value < 0.0)
    }

    /// Whether `self` fits within `limit` on every dimension.
    pub fn is_capacity_satisfied(&self, limit: &Capacity) -> bool {
        let max_len = self.len().max(limit.len());
        (0..max_len).all(|i| self.get(i) <= limit.get(i))
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PartialEq for Capacity {
    fn eq(&self, other: &Self) -> bool {
        let max_len = self.len().max(other.len());
        (0..max_len).all(|i| self.get(i) == other.get(i))
    }
}

impl Index<usize> for Capacity {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AddAssign<&Capacity> for Capacity {
    fn add_assign(&mut self, rhs: &Capacity) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl SubAssign<&Capacity> for Capacity {
    fn sub_assign(&mut self, rhs: &Capacity) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}

impl Neg for &Capacity {
    type Output = Capacity;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}
