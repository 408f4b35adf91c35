//! Domain model shared by the client and the engine.

pub mod candidate;
pub mod range;
pub mod record;
pub mod repository;

pub use candidate::{Candidate, OriginKind};
pub use range::SearchRange;
pub use record::{Chapter, ValidatedRecord};
pub use repository::RepositoryCoordinate;
