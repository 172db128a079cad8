//! Core business logic for vidtube.
//!
//! - [`view`]: declarative joins and the read models built from them
//! - [`pagination`]: paging parameters, windows and page metadata
//! - [`toggle`]: like and subscription toggles
//! - [`cascade`]: cleanup after a parent entity is deleted
//! - [`services`]: per-entity operations composed from the above

pub mod cascade;
pub mod ownership;
pub mod pagination;
pub mod services;
pub mod toggle;
pub mod view;

pub use cascade::{CascadeCoordinator, CascadeReport, ParentKind};
pub use pagination::{Page, PageComposer, PageRequest};
pub use services::*;
pub use toggle::{EdgeTarget, ToggleManager, ToggleOutcome, ToggleState};
pub use view::{EdgeView, Listing, View, ViewBuilder, ViewService};
