pub mod dto;
pub mod filters;

pub use dto::*;
pub use filters::{FilterAction, FilterSet, NamedRange};
