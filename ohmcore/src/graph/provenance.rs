//! Tracing derived nodes back to the nodes the front-end created.
use bit_set::BitSet;

use crate::graph::NodeId;

/// Dense identifier of one generation-0 node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin(pub u32);

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Set of origins a node derives from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Provenance(BitSet);

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(origin: Origin) -> Self {
        let mut bits = BitSet::new();
        bits.insert(origin.0 as usize);
        Self(bits)
    }

    /// Add every origin of `other`. Returns `true` if anything was added.
    pub fn merge(&mut self, other: &Provenance) -> bool {
        let added = !other.0.is_subset(&self.0);
        self.0.union_with(&other.0);
        added
    }

    pub fn union(&self, other: &Provenance) -> Provenance {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    #[inline]
    pub fn contains(&self, origin: Origin) -> bool {
        self.0.contains(origin.0 as usize)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.iter().count()
    }

    /// Earliest origin, which orders derived nodes by declaration.
    #[inline]
    pub fn first(&self) -> Option<Origin> {
        self.origins().next()
    }

    /// Origins in ascending order.
    pub fn origins(&self) -> impl Iterator<Item = Origin> + '_ {
        self.0.iter().map(|bit| Origin(bit as u32))
    }
}

impl FromIterator<Origin> for Provenance {
    fn from_iter<T: IntoIterator<Item = Origin>>(iter: T) -> Self {
        Self(iter.into_iter().map(|o| o.0 as usize).collect())
    }
}

#[derive(Debug, Clone)]
struct OriginEntry {
    node: NodeId,
    label: Option<String>,
}

/// Maps every origin to its generation-0 node and an optional human label.
///
/// One table is shared by all generations of a solve.
#[derive(Debug, Clone, Default)]
pub struct OriginTable {
    entries: Vec<OriginEntry>,
}

impl OriginTable {
    pub(crate) fn push(&mut self, node: NodeId, label: Option<String>) -> Origin {
        let origin = Origin(self.entries.len() as u32);
        self.entries.push(OriginEntry { node, label });
        origin
    }

    pub(crate) fn set_label(&mut self, origin: Origin, label: String) {
        if let Some(entry) = self.entries.get_mut(origin.0 as usize) {
            entry.label = Some(label);
        }
    }

    /// Generation-0 node of an origin.
    pub fn node(&self, origin: Origin) -> Option<NodeId> {
        self.entries.get(origin.0 as usize).map(|e| e.node)
    }

    pub fn label(&self, origin: Origin) -> Option<&str> {
        self.entries
            .get(origin.0 as usize)
            .and_then(|e| e.label.as_deref())
    }

    /// Origin of a generation-0 node.
    pub fn origin_of(&self, node: NodeId) -> Option<Origin> {
        self.entries
            .iter()
            .position(|e| e.node == node)
            .map(|index| Origin(index as u32))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_reports_growth() {
        let mut a = Provenance::of(Origin(1));
        assert!(a.merge(&Provenance::of(Origin(4))));
        assert!(!a.merge(&Provenance::of(Origin(1))));
        assert_eq!(a.origins().collect::<Vec<_>>(), [Origin(1), Origin(4)]);
        assert_eq!(a.union(&Provenance::new()), a);
    }

    #[test]
    fn collects_from_origins() {
        let p: Provenance = [Origin(3), Origin(0)].into_iter().collect();
        assert_eq!(p.len(), 2);
        assert!(p.contains(Origin(0)));
        assert!(!p.contains(Origin(1)));
        assert_eq!(p.first(), Some(Origin(0)));
        assert_eq!(Provenance::new().first(), None);
    }
}
