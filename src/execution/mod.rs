pub mod clock;
pub mod pipeline;
pub mod relay;

pub use clock::{Sleeper, TokioSleeper};
pub use pipeline::{Pipeline, PipelineReport};
pub use relay::{Relay, TickOutcome};
