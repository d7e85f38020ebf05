//! Core modules for the index gate pipeline.
//!
//! The validation logic lives here; external collaborators (object storage,
//! git history) are reached only through the narrow traits in [`fetch`] and
//! [`history`].

pub mod diag;
pub mod error;
pub mod fetch;
pub mod history;
pub mod index;
pub mod validate;
