pub mod action;
pub mod activity;
pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod handoff;
pub mod io;
pub mod notification;
pub mod paths;
pub mod phase;
pub mod phases;
pub mod project;
pub mod review;
pub mod seed;
pub mod task;
pub mod types;
pub mod user;

pub use error::{HoldingError, Result};
