use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// An abstract domain which forms a join-semilattice of finite height
///
/// `join` must be commutative, associative, and idempotent, with `bottom()`
/// as its identity. Equality (`Eq`) is the convergence test of the fixpoint
/// engine and must agree with `join`: `a.join(&b) == a` iff `b` adds nothing
/// to `a`.
pub trait AbstractDomain: Clone + Eq + Debug {
    /// Get the Bottom value of this lattice
    fn bottom() -> Self;

    /// Join two abstract values into a new one
    fn join(&self, other: &Self) -> Self;

    /// Partial ordering comparison between two abstract values, `None` when
    /// the two are incomparable
    fn partial_order(&self, other: &Self) -> Option<Ordering>;
}

/// Combine the orderings of independent components
fn combine_order(lhs: Option<Ordering>, rhs: Option<Ordering>) -> Option<Ordering> {
    match (lhs?, rhs?) {
        (Ordering::Equal, o) | (o, Ordering::Equal) => Some(o),
        (Ordering::Less, Ordering::Less) => Some(Ordering::Less),
        (Ordering::Greater, Ordering::Greater) => Some(Ordering::Greater),
        (Ordering::Less, Ordering::Greater) | (Ordering::Greater, Ordering::Less) => None,
    }
}

//
// Abstract Domain Combinators
//

/// Powerset of a finite universe, ordered by inclusion
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FiniteSetDomain<A: Ord + Clone + Debug> {
    elements: BTreeSet<A>,
}

impl<A: Ord + Clone + Debug> FiniteSetDomain<A> {
    pub fn insert(&mut self, element: A) -> bool {
        self.elements.insert(element)
    }

    pub fn contains(&self, element: &A) -> bool {
        self.elements.contains(element)
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<A: Ord + Clone + Debug> FromIterator<A> for FiniteSetDomain<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<A: Ord + Clone + Debug> AbstractDomain for FiniteSetDomain<A> {
    fn bottom() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    fn join(&self, other: &Self) -> Self {
        let mut new_elements = self.elements.clone();
        new_elements.extend(other.elements.iter().cloned());
        Self {
            elements: new_elements,
        }
    }

    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        let le = self.elements.is_subset(&other.elements);
        let ge = other.elements.is_subset(&self.elements);
        match (le, ge) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

/// Point-wise lifting of a domain over a finite key space, where an absent
/// key stands for the bottom value
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MapDomain<K: Ord + Clone + Debug, V: AbstractDomain> {
    map: BTreeMap<K, V>,
}

impl<K: Ord + Clone + Debug, V: AbstractDomain> MapDomain<K, V> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Join `value` into whatever `key` currently maps to
    pub fn join_at(&mut self, key: K, value: &V) {
        match self.map.get_mut(&key) {
            None => {
                self.map.insert(key, value.clone());
            }
            Some(existing) => {
                *existing = existing.join(value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Ord + Clone + Debug, V: AbstractDomain> FromIterator<(K, V)> for MapDomain<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut result = Self::bottom();
        for (k, v) in iter {
            result.join_at(k, &v);
        }
        result
    }
}

impl<K: Ord + Clone + Debug, V: AbstractDomain> AbstractDomain for MapDomain<K, V> {
    fn bottom() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    fn join(&self, other: &Self) -> Self {
        let mut new_map = self.map.clone();
        for (k, v) in &other.map {
            new_map
                .entry(k.clone())
                .and_modify(|e| *e = e.join(v))
                .or_insert_with(|| v.clone());
        }
        Self { map: new_map }
    }

    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        let bottom = V::bottom();
        let mut order = Some(Ordering::Equal);
        for (k, v) in &self.map {
            let other_v = other.map.get(k).unwrap_or(&bottom);
            order = combine_order(order, v.partial_order(other_v));
        }
        for (k, v) in &other.map {
            if !self.map.contains_key(k) {
                order = combine_order(order, bottom.partial_order(v));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Set = FiniteSetDomain<u32>;
    type Map = MapDomain<char, Set>;

    fn set(items: &[u32]) -> Set {
        items.iter().copied().collect()
    }

    fn map(items: Vec<(char, Vec<u32>)>) -> Map {
        items.into_iter().map(|(k, v)| (k, set(&v))).collect()
    }

    fn samples() -> Vec<Map> {
        vec![
            Map::bottom(),
            map(vec![('a', vec![1])]),
            map(vec![('a', vec![2]), ('b', vec![1, 3])]),
            map(vec![('b', vec![3]), ('c', vec![])]),
            map(vec![('a', vec![1, 2]), ('c', vec![4])]),
        ]
    }

    #[test]
    fn join_is_commutative_and_idempotent() {
        for a in samples() {
            assert_eq!(a.join(&a), a);
            for b in samples() {
                assert_eq!(a.join(&b), b.join(&a));
            }
        }
    }

    #[test]
    fn join_is_associative() {
        for a in samples() {
            for b in samples() {
                for c in samples() {
                    assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
                }
            }
        }
    }

    #[test]
    fn bottom_is_identity() {
        for a in samples() {
            assert_eq!(a.join(&Map::bottom()), a);
            assert_eq!(Map::bottom().join(&a), a);
        }
    }

    #[test]
    fn join_unions_value_sets() {
        let joined =
            map(vec![('a', vec![1])]).join(&map(vec![('a', vec![2]), ('b', vec![3])]));
        assert_eq!(joined, map(vec![('a', vec![1, 2]), ('b', vec![3])]));
    }

    #[test]
    fn equality_requires_identical_keys() {
        assert_ne!(
            map(vec![('a', vec![1])]),
            map(vec![('a', vec![1]), ('b', vec![2])])
        );
        assert_ne!(map(vec![('a', vec![1])]), map(vec![('a', vec![1, 2])]));
        assert_eq!(
            map(vec![('b', vec![2]), ('a', vec![1])]),
            map(vec![('a', vec![1]), ('b', vec![2])])
        );
    }

    #[test]
    fn join_is_an_upper_bound() {
        for a in samples() {
            for b in samples() {
                let joined = a.join(&b);
                assert!(matches!(
                    a.partial_order(&joined),
                    Some(Ordering::Less | Ordering::Equal)
                ));
                assert!(matches!(
                    joined.partial_order(&b),
                    Some(Ordering::Greater | Ordering::Equal)
                ));
            }
        }
    }

    #[test]
    fn incomparable_values() {
        assert_eq!(set(&[1]).partial_order(&set(&[2])), None);
        assert_eq!(
            map(vec![('a', vec![1])]).partial_order(&map(vec![('b', vec![1])])),
            None
        );
        assert_eq!(
            map(vec![('a', vec![1])])
                .partial_order(&map(vec![('a', vec![1]), ('b', vec![1])])),
            Some(Ordering::Less)
        );
    }
}
