use std::{collections::HashSet, fmt};

/// A global state: for every process, the index of its event in the state.
///
/// Indices are hashed as one value, so frontier de-duplication is a set
/// lookup rather than a scan.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cut(Box<[usize]>);

impl Cut {
    /// The all-zero cut spanning `n_procs` processes.
    pub fn initial(n_procs: usize) -> Self {
        Self(vec![0; n_procs].into_boxed_slice())
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices.into_boxed_slice())
    }

    pub fn index(&self, pid: usize) -> usize {
        self.0[pid]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Same cut with `pid` one event further along its log.
    pub fn advance(&self, pid: usize) -> Self {
        let mut next = self.0.clone();
        next[pid] += 1;
        Self(next)
    }

    /// `self` is at or beyond `other` on every process and strictly beyond on one.
    pub fn dominates(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(s, o)| s >= o)
            && self.0 != other.0
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (n, idx) in self.0.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{idx}")?;
        }
        f.write_str(")")
    }
}

/// One lattice level: a duplicate-free set of cuts, in first-seen order.
///
/// Frontiers are values: each phase of the search takes one and returns a
/// new one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frontier {
    cuts: Vec<Cut>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cut> {
        self.cuts.iter()
    }
}

impl FromIterator<Cut> for Frontier {
    fn from_iter<T: IntoIterator<Item = Cut>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let cuts = iter
            .into_iter()
            .filter(|cut| seen.insert(cut.clone()))
            .collect();
        Self { cuts }
    }
}

impl IntoIterator for Frontier {
    type Item = Cut;
    type IntoIter = std::vec::IntoIter<Cut>;

    fn into_iter(self) -> Self::IntoIter {
        self.cuts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Frontier {
    type Item = &'a Cut;
    type IntoIter = std::slice::Iter<'a, Cut>;

    fn into_iter(self) -> Self::IntoIter {
        self.cuts.iter()
    }
}
