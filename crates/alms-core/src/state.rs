//! Per-store state and request tickets.
//!
//! `StoreState<T>` is the shape every domain store exposes. Tickets resolve
//! overlapping requests against the same slice: each action takes a ticket
//! when it starts and may only commit if its ticket is still the newest one
//! issued for that slice.

use std::collections::HashMap;

use serde::Serialize;

use crate::Pagination;

/// List/detail state for one entity family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState<T> {
    pub items: Vec<T>,
    pub current: Option<T>,
    pub pagination: Pagination,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            pagination: Pagination::default(),
            is_loading: false,
            error: None,
        }
    }
}

impl<T> StoreState<T> {
    /// Mark an action as started: loading on, previous error cleared.
    pub fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// Mark an action as finished successfully.
    pub const fn succeed(&mut self) {
        self.is_loading = false;
    }

    /// Mark an action as failed. `message` is `None` for failures that must
    /// not block rendering (connectivity loss).
    pub fn fail(&mut self, message: Option<String>) {
        self.is_loading = false;
        self.error = message;
    }
}

/// A claim on a state slice, issued when an action starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slice: &'static str,
    generation: u64,
}

impl Ticket {
    #[must_use]
    pub const fn slice(&self) -> &'static str {
        self.slice
    }
}

/// Issues and validates tickets, one generation counter per slice.
#[derive(Debug, Default)]
pub struct TicketBook {
    generations: HashMap<&'static str, u64>,
}

impl TicketBook {
    /// Issue a ticket for `slice`, superseding every earlier one.
    pub fn issue(&mut self, slice: &'static str) -> Ticket {
        let generation = self.generations.entry(slice).or_insert(0);
        *generation += 1;
        Ticket {
            slice,
            generation: *generation,
        }
    }

    /// Whether `ticket` is still the newest for its slice.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generations.get(ticket.slice) == Some(&ticket.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_clears_previous_error() {
        let mut state = StoreState::<u32>::default();
        state.fail(Some("boom".into()));
        assert_eq!(state.error.as_deref(), Some("boom"));

        state.begin();
        assert!(state.is_loading);
        assert!(state.error.is_none());

        state.succeed();
        assert!(!state.is_loading);
    }

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut book = TicketBook::default();
        let first = book.issue("items");
        let second = book.issue("items");
        assert!(!book.is_current(first));
        assert!(book.is_current(second));
    }

    #[test]
    fn slices_are_independent() {
        let mut book = TicketBook::default();
        let items = book.issue("items");
        let featured = book.issue("featured");
        assert!(book.is_current(items));
        assert!(book.is_current(featured));
        assert_eq!(featured.slice(), "featured");
    }
}
