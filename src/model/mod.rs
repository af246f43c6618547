pub mod case;
pub mod config;
pub mod enums;
pub mod session;

pub use case::*;
pub use config::{Config, DatabaseConfig};
pub use enums::*;
pub use session::{SessionAttachment, SessionState};
