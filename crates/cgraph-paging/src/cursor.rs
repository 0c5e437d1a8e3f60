//! Per-source pagination cursor.

use cgraph_core::ContinuationToken;

/// Where a source resumes, and whether it can resume at all.
///
/// Starts at `{ token: None, can_continue: true }`. Once `can_continue` is
/// false it stays false: [`advance`](Self::advance) on a finished cursor is
/// a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationCursor {
    token: Option<ContinuationToken>,
    can_continue: bool,
}

impl Default for ContinuationCursor {
    fn default() -> Self {
        Self::start()
    }
}

impl ContinuationCursor {
    /// Cursor before the first page.
    pub const fn start() -> Self {
        Self {
            token: None,
            can_continue: true,
        }
    }

    /// Token to send with the next request, `None` for the first page.
    pub const fn token(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    pub const fn can_continue(&self) -> bool {
        self.can_continue
    }

    /// Cursor after a page that returned `next`.
    #[must_use]
    pub fn advance(&self, next: Option<ContinuationToken>) -> Self {
        if !self.can_continue {
            return self.clone();
        }
        Self {
            can_continue: next.is_some(),
            token: next,
        }
    }
}
