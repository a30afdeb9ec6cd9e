// Library surface for the binary, headless/integration tests and reuse.
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod logging;
pub mod phrase;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod wordbank;

pub use error::{Error, Result};
pub use session::{Event, Intent, Phase, Session};
