//! # alms-store
//!
//! Domain stores for the Almoner client. Each store owns one state object
//! (`items`, `current`, `pagination`, `is_loading`, `error` plus
//! store-specific slices) and mutates it only through its own actions:
//!
//! - [`AuthStore`]: session status, login/registration, profile updates
//! - [`CampaignStore`]: listings, featured and own campaigns, management
//! - [`DonationStore`]: giving and donation history
//! - [`AdminStore`]: dashboard counters, approvals, coupons, partners
//!
//! Actions return `Result<_, ErrorRecord>`. A connectivity failure is still
//! returned but leaves `error` unset so the last good state keeps rendering.
//! Overlapping actions on the same slice resolve to the newest one.

pub mod admin;
pub mod auth;
pub mod campaign;
mod cell;
pub mod donation;
pub mod error;
pub mod stores;

pub use admin::{AdminState, AdminStore};
pub use auth::{AuthState, AuthStore};
pub use campaign::{CampaignState, CampaignStore};
pub use cell::{Lifecycle, failure_message};
pub use donation::{DonationState, DonationStore};
pub use error::BuildError;
pub use stores::Stores;
