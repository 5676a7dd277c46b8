//! docinsight: document analysis client.
//!
//! Submits documents to a remote analysis API and renders the returned
//! insight reports in the terminal, an interactive shell, or a locally
//! served HTML viewer, with filtering, sorting, theming and JSON/HTML export.

pub mod analytics;
pub mod api;
pub mod cancel;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod session;
pub mod theme;
pub mod view;
pub mod web;

pub use error::ClientError;
