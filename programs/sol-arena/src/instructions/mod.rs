#![allow(ambiguous_glob_reexports)]

pub mod claim_prize;
pub mod create_tournament;
pub mod finalize_tournament;
pub mod initialize_protocol_config;
pub mod register_for_tournament;

pub use claim_prize::*;
pub use create_tournament::*;
pub use finalize_tournament::*;
pub use initialize_protocol_config::*;
pub use register_for_tournament::*;
