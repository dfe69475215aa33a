//! Domain models for the component catalog

pub mod component;
pub mod pagination;
pub mod user;

pub use component::{Component, COMPONENT_DOCUMENT_TYPE};
pub use pagination::PaginationData;
pub use user::{Principal, RequestedAction};
