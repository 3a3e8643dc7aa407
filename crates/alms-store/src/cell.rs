//! Shared action lifecycle for the domain stores.
//!
//! Every store keeps its state behind a [`StoreCell`]. An action calls
//! [`StoreCell::start`] (loading on, error cleared, ticket issued for the
//! slice it will write) and hands its result to [`StoreCell::finish`], which
//! commits only if the ticket is still current. `is_loading` stays on until
//! every started action has finished, whatever slice it wrote.

use std::sync::{Mutex, MutexGuard, PoisonError};

use alms_core::{StoreState, Ticket, TicketBook};
use alms_http::ErrorRecord;

/// Loading/error bookkeeping a store state exposes to [`StoreCell`].
pub trait Lifecycle {
    fn begin(&mut self);
    fn succeed(&mut self);
    fn fail(&mut self, message: Option<String>);
    fn set_loading(&mut self, loading: bool);
}

impl<T> Lifecycle for StoreState<T> {
    fn begin(&mut self) {
        Self::begin(self);
    }

    fn succeed(&mut self) {
        Self::succeed(self);
    }

    fn fail(&mut self, message: Option<String>) {
        Self::fail(self, message);
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }
}

/// The message a failed action leaves in `error`. Connectivity loss leaves
/// none so the last good state keeps rendering.
#[must_use]
pub fn failure_message(error: &ErrorRecord) -> Option<String> {
    (!error.is_network()).then(|| error.message().to_string())
}

struct Inner<S> {
    state: S,
    tickets: TicketBook,
    in_flight: usize,
}

pub(crate) struct StoreCell<S> {
    inner: Mutex<Inner<S>>,
}

impl<S: Lifecycle + Clone + Default> StoreCell<S> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: S::default(),
                tickets: TicketBook::default(),
                in_flight: 0,
            }),
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.lock().state.clone()
    }

    pub(crate) fn start(&self, slice: &'static str) -> Ticket {
        let mut inner = self.lock();
        inner.in_flight += 1;
        inner.state.begin();
        inner.tickets.issue(slice)
    }

    /// Commit `result` if `ticket` is still the newest for its slice, then
    /// hand the result back to the caller either way.
    pub(crate) fn finish<T>(
        &self,
        ticket: Ticket,
        result: Result<T, ErrorRecord>,
        commit: impl FnOnce(&mut S, &T),
    ) -> Result<T, ErrorRecord> {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        let pending = inner.in_flight > 0;
        if !inner.tickets.is_current(ticket) {
            tracing::debug!(slice = ticket.slice(), "dropping superseded response");
            if !pending {
                inner.state.set_loading(false);
            }
            return result;
        }
        match &result {
            Ok(value) => {
                commit(&mut inner.state, value);
                inner.state.succeed();
            }
            Err(error) => {
                if error.is_network() {
                    tracing::warn!(slice = ticket.slice(), "backend unreachable");
                }
                inner.state.fail(failure_message(error));
            }
        }
        if pending {
            inner.state.set_loading(true);
        }
        result
    }

    /// Direct mutation outside an action (session changes observed elsewhere).
    pub(crate) fn update(&self, apply: impl FnOnce(&mut S)) {
        apply(&mut self.lock().state);
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Percent-encode one path segment (ids, coupon codes).
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use alms_http::classify;

    use super::*;

    #[test]
    fn stale_ticket_does_not_commit() {
        let cell = StoreCell::<StoreState<u32>>::new();
        let older = cell.start("items");
        let newer = cell.start("items");

        let fresh = cell.finish(newer, Ok(vec![2]), |s, v| s.items.clone_from(v));
        assert!(fresh.is_ok());
        let stale = cell.finish(older, Ok(vec![1]), |s, v| s.items.clone_from(v));

        assert_eq!(stale.unwrap(), vec![1]);
        assert_eq!(cell.snapshot().items, vec![2]);
        assert!(!cell.snapshot().is_loading);
    }

    #[test]
    fn loading_holds_until_every_slice_finishes() {
        let cell = StoreCell::<StoreState<u32>>::new();
        let items = cell.start("items");
        let featured = cell.start("featured");

        cell.finish(items, Ok(vec![1]), |s, v| s.items.clone_from(v)).unwrap();
        assert!(cell.snapshot().is_loading);

        let failed: Result<(), _> = cell.finish(featured, Err(classify::invalid_payload("bad")), |_, _| {});
        assert!(failed.is_err());
        let state = cell.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.items, vec![1]);
        assert_eq!(state.error.as_deref(), Some("bad"));
    }

    #[test]
    fn superseded_response_finishing_last_clears_loading() {
        let cell = StoreCell::<StoreState<u32>>::new();
        let older = cell.start("items");
        let newer = cell.start("items");

        cell.finish(newer, Ok(vec![2]), |s, v| s.items.clone_from(v)).unwrap();
        assert!(cell.snapshot().is_loading);

        cell.finish(older, Ok(vec![1]), |s, v| s.items.clone_from(v)).unwrap();
        assert!(!cell.snapshot().is_loading);
        assert_eq!(cell.snapshot().items, vec![2]);
    }

    #[test]
    fn non_network_failure_sets_error() {
        let cell = StoreCell::<StoreState<u32>>::new();
        let ticket = cell.start("items");

        let result: Result<(), _> = cell.finish(ticket, Err(classify::invalid_payload("bad")), |_, _| {});

        assert!(result.is_err());
        let state = cell.snapshot();
        assert_eq!(state.error.as_deref(), Some("bad"));
        assert!(!state.is_loading);
    }

    #[test]
    fn segments_are_encoded() {
        assert_eq!(segment("SAVE 10/now"), "SAVE%2010%2Fnow");
    }
}
