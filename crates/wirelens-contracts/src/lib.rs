pub mod config;
pub mod error;
pub mod room;
pub mod verdict;

pub use config::RelayConfig;
pub use error::RelayError;
pub use room::{ContextId, RoomRefs};
pub use verdict::{Judgment, Verdict};
