//! Gacha core: daily draw quota, dice-driven card selection and the draw
//! session. Keep this crate free of IO and platform concerns.

pub mod clock;
pub mod config;
pub mod drawer;
pub mod events;
pub mod gacha;
pub mod post;
pub mod quota;
pub mod rng;
pub mod storage;

pub use clock::*;
pub use config::*;
pub use drawer::*;
pub use events::*;
pub use gacha::*;
pub use post::*;
pub use quota::*;
pub use rng::*;
pub use storage::*;
