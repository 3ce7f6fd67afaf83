//! `holding-client` — blocking API client and local state store for the
//! holding formation backend.
//!
//! Two layers:
//!
//! - [`api::ApiClient`] speaks the REST API directly: bearer-token auth,
//!   `{success, data}` envelope handling, typed views of the wire shapes.
//! - [`store::Store`] keeps an in-memory mirror of the visible projects and
//!   users, edited optimistically through [`store::Mutation`] commands.
//!   Every mutation is an apply/commit/rollback triple invoked uniformly,
//!   so a failed backend call always leaves the mirror consistent with a
//!   reload of canonical state.

pub mod api;
pub mod error;
pub mod store;

pub use api::{ApiClient, LoginOutcome, NewClient, NewProject, ProjectSummary, ProjectView, UserView};
pub use error::ClientError;
pub use store::{Mutation, Store};

pub type Result<T> = std::result::Result<T, ClientError>;
