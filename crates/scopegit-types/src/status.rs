//! The three-state status tuple reported by the Git engine.
//!
//! Each column is a small integer describing the path in one tree:
//!
//! - `head`: 0 = absent from the committed snapshot, 1 = present
//! - `workdir`: 0 = absent, 1 = identical to HEAD, 2 = different from HEAD
//! - `stage`: 0 = absent, 1 = identical to HEAD, 2 = identical to workdir,
//!   3 = different from both

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `(head, workdir, stage)` for a single path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusTriple {
    pub head: u8,
    pub workdir: u8,
    pub stage: u8,
}

impl StatusTriple {
    /// The triple of a tracked, untouched file.
    pub const UNMODIFIED: Self = Self::new(1, 1, 1);

    pub const fn new(head: u8, workdir: u8, stage: u8) -> Self {
        Self {
            head,
            workdir,
            stage,
        }
    }

    /// `true` for `1-1-1`.
    pub fn is_unmodified(&self) -> bool {
        *self == Self::UNMODIFIED
    }

    /// `true` if the working copy still has the file.
    pub fn workdir_present(&self) -> bool {
        self.workdir != 0
    }
}

impl fmt::Display for StatusTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.head, self.workdir, self.stage)
    }
}

impl FromStr for StatusTriple {
    type Err = String;

    /// Parse the `head-workdir-stage` key form, e.g. `"1-2-1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(format!("expected head-workdir-stage, got {s:?}"));
        }
        let mut values = [0u8; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid status column {part:?} in {s:?}"))?;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

impl From<(u8, u8, u8)> for StatusTriple {
    fn from((head, workdir, stage): (u8, u8, u8)) -> Self {
        Self::new(head, workdir, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_uses_dash_key() {
        assert_eq!(StatusTriple::new(1, 2, 3).to_string(), "1-2-3");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!("1-2".parse::<StatusTriple>().is_err());
        assert!("1-x-2".parse::<StatusTriple>().is_err());
        assert!("".parse::<StatusTriple>().is_err());
    }

    #[test]
    fn unmodified_constant() {
        assert!(StatusTriple::new(1, 1, 1).is_unmodified());
        assert!(!StatusTriple::new(1, 2, 1).is_unmodified());
    }

    proptest! {
        #[test]
        fn key_parses_back(h in 0u8..4, w in 0u8..4, s in 0u8..4) {
            let triple = StatusTriple::new(h, w, s);
            prop_assert_eq!(triple.to_string().parse::<StatusTriple>(), Ok(triple));
        }
    }
}
