pub mod dedup;
pub mod parser;
pub mod types;

pub use dedup::{CooldownState, DedupDecision, Deduplicator};
pub use parser::{parse_signal, ParseError};
pub use types::Signal;
