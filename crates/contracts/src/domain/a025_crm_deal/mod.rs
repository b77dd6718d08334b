pub mod aggregate;

pub use aggregate::{DealRow, EntityId, EntityType, StageStatus};
