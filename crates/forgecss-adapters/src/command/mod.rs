//! Command runner adapters.

mod process;
mod recording;

pub use process::{DEFAULT_ALLOWED_COMMANDS, ProcessRunner};
pub use recording::{Invocation, RecordingRunner};
