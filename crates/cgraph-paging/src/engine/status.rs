//! Engine status.

use std::fmt;

/// Where a [`PaginationEngine`](super::PaginationEngine) stands.
///
/// `Unknown → Paginating → { Idle(false), Idle(true), Error }`.
/// `Idle { reached_end: true }` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Nothing has been requested yet.
    #[default]
    Unknown,
    /// A round is in flight.
    Paginating,
    /// The last round failed; see `last_error()`.
    Error,
    /// No round is in flight.
    Idle {
        /// Every source is exhausted and nothing is pending.
        reached_end: bool,
    },
}

impl Status {
    pub const fn is_paginating(self) -> bool {
        matches!(self, Self::Paginating)
    }

    /// Whether `paginate()` can never do anything again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Idle { reached_end: true })
    }

    /// Whether no round is in flight.
    pub const fn is_settled(self) -> bool {
        !self.is_paginating()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Paginating => f.write_str("paginating"),
            Self::Error => f.write_str("error"),
            Self::Idle { reached_end: false } => f.write_str("idle"),
            Self::Idle { reached_end: true } => f.write_str("idle (end)"),
        }
    }
}
