pub mod protocol_config;
pub mod registration;
pub mod tournament;

pub use protocol_config::*;
pub use registration::*;
pub use tournament::*;
