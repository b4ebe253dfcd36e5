//! Loading and persistence for the gacha: the post pool, tuning config and
//! the JSON-file quota store.

pub mod load;
pub mod schema;
pub mod store;

pub use load::*;
pub use schema::*;
pub use store::*;
