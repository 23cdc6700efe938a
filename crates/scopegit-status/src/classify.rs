//! The triple -> classification table.

use scopegit_types::StatusTriple;
use serde::Serialize;

/// How one status triple is shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// `U`, `A`, `M`, `D`, or `UM` for unmodified.
    pub symbol: &'static str,
    pub is_staged: bool,
    pub description: &'static str,
}

const fn entry(
    triple: (u8, u8, u8),
    symbol: &'static str,
    is_staged: bool,
    description: &'static str,
) -> (StatusTriple, Classification) {
    (
        StatusTriple::new(triple.0, triple.1, triple.2),
        Classification {
            symbol,
            is_staged,
            description,
        },
    )
}

/// Every mapped triple. Anything else is excluded from status views.
pub const CLASSIFICATIONS: [(StatusTriple, Classification); 12] = [
    entry((0, 2, 0), "U", false, "New, Untracked"),
    entry((0, 2, 2), "A", true, "Added, staged"),
    entry((0, 0, 3), "D", true, "Added, deleted"),
    entry((0, 2, 3), "M", true, "Added, staged, with unstaged changes"),
    entry((1, 1, 1), "UM", false, "Unmodified"),
    entry((1, 2, 1), "M", false, "Modified, unstaged"),
    entry((1, 2, 2), "M", true, "Modified, staged"),
    entry((1, 2, 3), "M", true, "Modified, staged, with unstaged changes"),
    entry((1, 0, 1), "D", false, "Deleted, unstaged"),
    entry((1, 0, 0), "D", true, "Deleted, staged"),
    entry(
        (1, 2, 0),
        "D",
        true,
        "Deleted, staged, with unstaged-modified changes",
    ),
    entry((1, 1, 0), "D", true, "Deleted, staged, with unstaged changes"),
];

/// The table entry for `triple`, unmodified included.
pub fn lookup(triple: StatusTriple) -> Option<Classification> {
    CLASSIFICATIONS
        .iter()
        .find(|(key, _)| *key == triple)
        .map(|(_, classification)| *classification)
}

/// The classification to display, or `None` for unmodified and unmapped
/// triples.
pub fn classify(triple: StatusTriple) -> Option<Classification> {
    if triple.is_unmodified() {
        return None;
    }
    lookup(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn documented_examples() {
        let untracked = classify((0, 2, 0).into()).unwrap();
        assert_eq!(untracked.symbol, "U");
        assert!(!untracked.is_staged);

        let added = classify((0, 2, 2).into()).unwrap();
        assert_eq!(added.symbol, "A");
        assert!(added.is_staged);

        let modified = classify((1, 2, 1).into()).unwrap();
        assert_eq!(modified.symbol, "M");
        assert!(!modified.is_staged);
    }

    #[test]
    fn unmodified_is_mapped_but_not_shown() {
        assert_eq!(lookup(StatusTriple::UNMODIFIED).unwrap().symbol, "UM");
        assert_eq!(classify(StatusTriple::UNMODIFIED), None);
    }

    #[test]
    fn table_keys_are_unique() {
        for (i, (a, _)) in CLASSIFICATIONS.iter().enumerate() {
            for (b, _) in &CLASSIFICATIONS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unmapped_triples_are_excluded() {
        assert_eq!(classify((3, 3, 3).into()), None);
        assert_eq!(classify((0, 1, 0).into()), None);
    }

    proptest! {
        #[test]
        fn classification_is_total(h in 0u8..=3, w in 0u8..=3, s in 0u8..=3) {
            let triple = StatusTriple::new(h, w, s);
            let shown = classify(triple);
            if triple.is_unmodified() {
                prop_assert!(shown.is_none());
            } else {
                prop_assert_eq!(shown, lookup(triple));
            }
        }
    }
}
