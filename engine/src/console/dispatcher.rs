//! Command Dispatcher
//!
//! Decides whether an input line is a meta-command or a conversational turn
//! and carries it out. Commands match the whole trimmed line, ignoring case.

use sdk::errors::{EngineError, ParleyErrorExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::agent::{ConversationState, TurnProcessor};

/// Static help listing
pub const HELP_TEXT: &str = "\
Available Commands:
  exit, quit, bye - Exit the application
  clear          - Clear chat history
  help           - Show this help message

Tips:
  - Ask questions, request explanations, or have a conversation
  - The AI remembers the conversation context
  - Use 'clear' to start fresh if needed

Smart Home Features:
  - Ask me to turn lights on/off in any room
  - Example: 'Turn on the lights in the living room'
  - Example: 'Turn off the bedroom lights'
  - I'll automatically call the appropriate functions!
";

/// Classified input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// exit, quit or bye
    Exit,

    /// Reset the conversation
    Clear,

    /// Show the help listing
    Help,

    /// Blank line
    Empty,

    /// Anything else, trimmed
    Message(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "exit" | "quit" | "bye" => Command::Exit,
            "clear" => Command::Clear,
            "help" => Command::Help,
            _ => Command::Message(trimmed.to_string()),
        }
    }
}

/// What the session should do after a line was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Routes classified lines to the conversation or to meta-command handlers
pub struct CommandDispatcher {
    default_preamble: String,
}

impl CommandDispatcher {
    pub fn new(default_preamble: impl Into<String>) -> Self {
        Self {
            default_preamble: default_preamble.into(),
        }
    }

    pub fn default_preamble(&self) -> &str {
        &self.default_preamble
    }

    /// Handle one input line
    ///
    /// Replies go to `out`, failed exchanges are reported on `err`. A
    /// recoverable failure leaves the session running; anything else is
    /// returned to the caller.
    pub async fn dispatch<W, E>(
        &self,
        line: &str,
        state: &mut ConversationState,
        processor: &TurnProcessor,
        out: &mut W,
        err: &mut E,
    ) -> Result<Flow, EngineError>
    where
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let command = Command::parse(line);
        debug!("Dispatching {:?}", command);

        match command {
            Command::Empty => Ok(Flow::Continue),
            Command::Exit => {
                info!("Exit requested");
                write(out, "\nThanks for chatting! Goodbye!\n").await?;
                Ok(Flow::Exit)
            }
            Command::Clear => {
                state.reset(&self.default_preamble);
                info!("Conversation cleared");
                write(out, "Chat history cleared!\n").await?;
                Ok(Flow::Continue)
            }
            Command::Help => {
                write(out, &format!("\n{}\n", HELP_TEXT)).await?;
                Ok(Flow::Continue)
            }
            Command::Message(text) => {
                let registry = std::sync::Arc::clone(state.registry());
                match processor.handle_user_message(&text, state, &registry).await {
                    Ok(reply) => write(out, &format!("AI: {}\n\n", reply)).await?,
                    Err(e) if e.is_recoverable() => {
                        warn!("Exchange failed: {}", e);
                        write(
                            err,
                            &format!("Error processing message: {}\n{}\n\n", e, e.user_hint()),
                        )
                        .await?
                    }
                    Err(e) => return Err(e),
                }
                Ok(Flow::Continue)
            }
        }
    }
}

pub(crate) async fn write<W>(out: &mut W, text: &str) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
