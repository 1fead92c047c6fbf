//! Entry storage for projtree.
//!
//! Each project owns a tree of files and folders. This crate persists that
//! tree in SQLite and exposes it through [`EntryRepository`], which enforces
//! ownership on every call and keeps the tree consistent under concurrent
//! writers.
//!
//! # Architecture
//!
//! - [`RecordStore`] owns the connection, the schema and transactions
//! - [`ProjectRegistry`] reads and touches project records inside a transaction
//! - [`AuthorizationGate`] resolves the caller and checks project ownership
//! - [`CascadePlan`] loads a subtree for recursive deletes
//! - [`EntryRepository`] ties them together, one transaction per operation

mod cascade;
mod error;
mod gate;
mod identity;
mod records;
mod registry;
mod repository;

pub use cascade::CascadePlan;
pub use error::{StoreError, StoreResult};
pub use gate::AuthorizationGate;
pub use identity::{ContextIdentityResolver, IdentityResolver, RequestContext};
pub use records::{RecordStore, RecordTx};
pub use registry::ProjectRegistry;
pub use repository::{EntryRepository, NewFile, NewFolder};
