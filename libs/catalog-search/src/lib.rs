//! Component catalog search
//!
//! Full-text search over catalog components stored in CouchDB, with:
//! - a fixed Nouveau index over component fields, registered at startup
//! - free text combined with per-field restrictions
//! - engine-side paging with optional in-page sorting
//! - per-record permission filtering or annotation

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use access::{AccessFilter, PermissionEvaluator};
pub use crate::config::Config;
pub use db::search::{ComponentSortColumn, SubQueryRestrictions};
pub use error::{Error, Result};
pub use models::{Component, PaginationData, Principal, RequestedAction};
pub use services::ComponentSearchService;
