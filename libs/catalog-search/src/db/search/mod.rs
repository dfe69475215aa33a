//! Query building, execution and result ordering

pub mod executor;
pub mod query;
pub mod sort;

pub use executor::QueryExecutor;
pub use query::{SearchQuery, SubQueryRestrictions};
pub use sort::{ComparatorGenerator, ComponentSortColumn, ResolvedSort};
