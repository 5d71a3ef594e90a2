//! Entity trait: records that keep their identity while their fields change.

use std::collections::HashSet;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Collect the identifiers of a slice of entities.
pub fn identity_set<E: Entity>(entities: &[E]) -> HashSet<E::Id> {
    entities.iter().map(|e| *e.id()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row(u32);

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.0
        }
    }

    #[test]
    fn identity_set_collapses_duplicates() {
        let rows = vec![Row(1), Row(2), Row(1)];
        let ids = identity_set(&rows);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
    }
}
