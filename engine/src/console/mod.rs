//! Interactive Console
//!
//! The read-eval-print surface: a dispatcher that tells meta-commands from
//! conversational turns, and the session loop that drives it line by line.

pub mod dispatcher;
pub mod session;

pub use dispatcher::{Command, CommandDispatcher, Flow, HELP_TEXT};
pub use session::{SessionLoop, SessionStatus};
