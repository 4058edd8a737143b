//! # Loaders
//!
//! A [`LoaderCell`] owns one piece of remotely-fetched state together with
//! the bookkeeping that makes concurrent fetches safe: a monotonic sequence
//! number identifies each started load, and only the most recently started
//! load is allowed to commit. Anything older resolves as stale and is
//! discarded without touching the value.
//!
//! The cell lives inside scene state and is only ever mutated from the
//! reducer. The flow is:
//!
//! 1. A "requested" action calls [`LoaderCell::begin`] in the reducer and
//!    the listener starts the fetch, carrying the returned [`LoadTicket`].
//! 2. The fetch completes and re-enters the store as a "loaded" action
//!    holding the ticket and the outcome.
//! 3. That action's reducer calls [`LoaderCell::resolve`]. A ticket that is
//!    no longer current yields [`Resolution::Stale`] and changes nothing.

/// Identifies one started load. Compared against the cell's current
/// sequence number at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Outcome of [`LoaderCell::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The ticket was current and the value was committed.
    Committed,
    /// The ticket was current but the load failed; the value is untouched.
    Failed,
    /// A newer load superseded this one. Nothing changed.
    Stale,
}

impl Resolution {
    /// True when the value was committed, for reducers that follow up a
    /// successful load with derived-state updates.
    pub fn committed(self) -> bool {
        matches!(self, Resolution::Committed)
    }
}

/// Remotely-loaded state with last-write-wins-by-recency semantics.
///
/// ```
/// use scene_store::{LoaderCell, Resolution};
///
/// let mut cell: LoaderCell<Vec<&str>> = LoaderCell::new(Vec::new());
///
/// let first = cell.begin();
/// let second = cell.begin();
///
/// // The second request returns first and commits.
/// assert_eq!(cell.resolve::<()>(second, Ok(vec!["fresh"])), Resolution::Committed);
/// // The first request straggles in afterwards and is discarded.
/// assert_eq!(cell.resolve::<()>(first, Ok(vec!["stale"])), Resolution::Stale);
///
/// assert_eq!(cell.value(), &vec!["fresh"]);
/// assert!(!cell.loading());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderCell<T> {
    value: T,
    seq: u64,
    inflight: Option<u64>,
}

impl<T> LoaderCell<T> {
    /// A cell holding `initial` with no load in flight.
    pub fn new(initial: T) -> Self {
        Self { value: initial, seq: 0, inflight: None }
    }

    /// The last committed value. Never cleared by a failed or stale load.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the committed value, for reducers that patch
    /// loaded collections in place (append on create, retain on delete).
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// True while a load is in flight and unresolved.
    pub fn loading(&self) -> bool {
        self.inflight.is_some()
    }

    /// Starts a new load, superseding any in-flight one, and returns the
    /// ticket the eventual completion must present.
    pub fn begin(&mut self) -> LoadTicket {
        self.seq += 1;
        self.inflight = Some(self.seq);
        LoadTicket(self.seq)
    }

    /// The ticket of the in-flight load, if any.
    pub fn ticket(&self) -> Option<LoadTicket> {
        self.inflight.map(LoadTicket)
    }

    /// Whether `ticket` still identifies the most recent load. Listeners
    /// use this after the reducer ran to tell a current failure (worth a
    /// notification) from a superseded one (silent).
    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.seq
    }

    /// Applies a completed load.
    ///
    /// Commits the value only when `ticket` is still current. A stale
    /// ticket leaves value, sequence and in-flight marker untouched, so a
    /// superseded request can never clobber a newer result, whatever order
    /// the responses arrive in.
    pub fn resolve<E>(&mut self, ticket: LoadTicket, outcome: Result<T, E>) -> Resolution {
        if ticket.0 != self.seq {
            return Resolution::Stale;
        }
        self.inflight = None;
        match outcome {
            Ok(value) => {
                self.value = value;
                Resolution::Committed
            }
            Err(_) => Resolution::Failed,
        }
    }
}

impl<T: Default> Default for LoaderCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
