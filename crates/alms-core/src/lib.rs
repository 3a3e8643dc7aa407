//! # alms-core
//!
//! Foundational types shared by every Almoner crate:
//! - Entity structs for the platform's domain objects (users, campaigns,
//!   donations, coupons, partners) in the backend's wire format
//! - Request payloads sent by the domain stores
//! - Pagination metadata
//! - `StoreState<T>` and request tickets used by the domain stores

pub mod entities;
pub mod pagination;
pub mod state;

pub use pagination::Pagination;
pub use state::{StoreState, Ticket, TicketBook};
