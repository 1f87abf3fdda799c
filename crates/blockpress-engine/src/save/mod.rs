//! # Saving
//!
//! The [`SaveCoordinator`] decides when the open post is written to the
//! [`PostStore`]; [`PostListController`] handles list-level actions on the
//! dashboard with optimistic updates.

pub mod backend;
pub mod coordinator;
pub mod optimistic;
pub mod record;
pub mod state;

pub use backend::{MutationResponse, PostStore, SaveResponse};
pub use coordinator::SaveCoordinator;
pub use optimistic::{
    ListActionKind, ListItem, ListTicket, OptimisticList, PostListController, PostSummary,
};
pub use record::{PostRecord, PostStatus, slugify};
pub use state::{
    AutosaveOutcome, AutosaveSkip, AutosaveState, ContentHash, SaveConfig, SavePhase, SaveStatus,
};
