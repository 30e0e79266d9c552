/// Run state definitions for the scrape pipeline
///
/// A run walks `Idle -> Fetching(1) -> Parsing(1) -> Accumulating(1) ->
/// Fetching(2) -> ... -> Finalizing -> Done`. A page whose fetch exhausts its
/// retries (or whose body has no listing) jumps straight to the next page.
use std::fmt;

/// Represents the current state of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Nothing requested yet
    Idle,

    /// Requesting listing page `page`, retries included
    Fetching { page: u32 },

    /// Extracting records from the body of page `page`
    Parsing { page: u32 },

    /// Appending the records of page `page` to the run
    Accumulating { page: u32 },

    /// Writing the CSV file
    Finalizing,

    /// Run complete
    Done,
}

impl RunState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Page the state refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Fetching { page } | Self::Parsing { page } | Self::Accumulating { page } => {
                Some(*page)
            }
            _ => None,
        }
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// Pages advance strictly by one, and a page may be abandoned from
    /// `Fetching` or `Parsing` without passing through `Accumulating`.
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        use RunState::*;

        match (*self, *next) {
            (Idle, Fetching { page }) => page == 1,
            (Fetching { page: a }, Parsing { page: b }) => a == b,
            (Parsing { page: a }, Accumulating { page: b }) => a == b,
            (from, Fetching { page }) => from.page().is_some_and(|a| page == a + 1),
            (Fetching { .. } | Parsing { .. } | Accumulating { .. }, Finalizing) => true,
            (Finalizing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching { page } => write!(f, "fetching(page={})", page),
            Self::Parsing { page } => write!(f, "parsing(page={})", page),
            Self::Accumulating { page } => write!(f, "accumulating(page={})", page),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
        }
    }
}
