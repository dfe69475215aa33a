//! Engine access: the backend seam, the index schema and query execution

pub mod backend;
pub mod design;
pub mod memory;
pub mod nouveau;
pub mod search;

pub use backend::{PageWindow, SearchBackend, SearchHits, SearchRequest};
pub use design::{IndexDefinition, IndexFieldSpec};
pub use memory::InMemorySearchBackend;
pub use nouveau::NouveauConnector;
