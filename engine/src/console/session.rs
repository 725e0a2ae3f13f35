//! Session Loop
//!
//! Reads one line at a time, hands it to the dispatcher and keeps going until
//! an exit command or end of input.

use std::borrow::Cow;
use std::sync::Arc;

use sdk::errors::EngineError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{info, warn};

use super::dispatcher::{write, CommandDispatcher, Flow};
use crate::agent::{ConversationState, TurnProcessor};
use crate::tools::CapabilityRegistry;

const RULE_WIDTH: usize = 60;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Terminated,
}

/// Top-level read-eval loop owning one conversation
pub struct SessionLoop {
    state: ConversationState,
    processor: TurnProcessor,
    dispatcher: CommandDispatcher,
    status: SessionStatus,
}

impl SessionLoop {
    pub fn new(
        system_preamble: impl Into<String>,
        registry: Arc<CapabilityRegistry>,
        processor: TurnProcessor,
    ) -> Self {
        let dispatcher = CommandDispatcher::new(system_preamble);
        let state = ConversationState::new(dispatcher.default_preamble(), registry);
        Self {
            state,
            processor,
            dispatcher,
            status: SessionStatus::Running,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Run until exit or end of input
    ///
    /// Conversation output goes to `output`, failed exchanges to `errors`.
    pub async fn run<R, W, E>(
        &mut self,
        mut input: R,
        output: &mut W,
        errors: &mut E,
    ) -> Result<(), EngineError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        write(output, &self.banner()).await?;

        let mut buf = Vec::new();
        while self.status == SessionStatus::Running {
            write(output, "You: ").await?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                info!("End of input, closing session");
                write(output, "\n").await?;
                self.status = SessionStatus::Terminated;
                continue;
            }

            let line = decode_line(&buf);
            self.step(&line, output, errors).await?;
        }

        Ok(())
    }

    /// Handle a single line and return the resulting status
    pub async fn step<W, E>(
        &mut self,
        line: &str,
        output: &mut W,
        errors: &mut E,
    ) -> Result<SessionStatus, EngineError>
    where
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        if self.status == SessionStatus::Terminated {
            return Ok(self.status);
        }

        let flow = self
            .dispatcher
            .dispatch(line, &mut self.state, &self.processor, output, errors)
            .await?;

        if flow == Flow::Exit {
            self.status = SessionStatus::Terminated;
        }
        Ok(self.status)
    }

    fn banner(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let capabilities = self.state.registry().names();
        let capabilities = if capabilities.is_empty() {
            "none".to_string()
        } else {
            capabilities.join(", ")
        };

        format!(
            "{rule}\nWelcome to Parley!\n{rule}\n\
             Model: {model}\n\
             Capabilities: {capabilities}\n\n\
             Start chatting! Type 'exit', 'quit', or 'bye' to end the conversation.\n\
             Type 'clear' to clear chat history.\n\
             Type 'help' for available commands.\n\
             {dashes}\n",
            model = self.processor.client().model(),
            dashes = "-".repeat(RULE_WIDTH),
        )
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let line = String::from_utf8_lossy(raw);
    if let Cow::Owned(_) = line {
        warn!("Input line was not valid UTF-8, invalid bytes replaced");
    }
    line.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{self, LlmError, ModelClient, PendingResponse, Role, Turn};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every call with the same text, or fails if `fail` is set
    struct EchoClient {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ModelClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn converse(
            &self,
            transcript: &[Turn],
            _registry: &CapabilityRegistry,
        ) -> llm::Result<PendingResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LlmError::BackendUnavailable("offline".into()));
            }
            let last = transcript.last().map(|t| t.content()).unwrap_or_default();
            Ok(PendingResponse::text(format!("echo: {}", last)))
        }
    }

    fn session(fail: bool) -> (Arc<EchoClient>, SessionLoop) {
        let client = Arc::new(EchoClient {
            calls: AtomicUsize::new(0),
            fail,
        });
        let processor = TurnProcessor::new(client.clone());
        let session = SessionLoop::new(
            "preamble",
            Arc::new(CapabilityRegistry::empty()),
            processor,
        );
        (client, session)
    }

    async fn drive(session: &mut SessionLoop, script: &str) -> (String, String) {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        session
            .run(script.as_bytes(), &mut out, &mut err)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[tokio::test]
    async fn test_exit_stops_reading() {
        let (client, mut session) = session(false);
        let (out, _) = drive(&mut session, "exit\nhello\n").await;

        assert_eq!(session.status(), SessionStatus::Terminated);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state().len(), 1);
        assert!(out.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_end_of_input_terminates() {
        let (_client, mut session) = session(false);
        drive(&mut session, "hello").await;
        assert_eq!(session.status(), SessionStatus::Terminated);
        assert_eq!(session.state().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_line_is_noop() {
        let (client, mut session) = session(false);
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        let status = session.step("", &mut out, &mut err).await.unwrap();

        assert_eq!(status, SessionStatus::Running);
        assert!(out.is_empty());
        assert_eq!(session.state().len(), 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_help_does_not_call_model() {
        let (client, mut session) = session(false);
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        session.step("help", &mut out, &mut err).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state().len(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Available Commands"));
    }

    #[tokio::test]
    async fn test_clear_resets_transcript() {
        let (_client, mut session) = session(false);
        let (out, _) = drive(&mut session, "one\ntwo\nclear\n").await;

        assert_eq!(session.state().len(), 1);
        assert_eq!(session.state().snapshot()[0].role(), Role::System);
        assert_eq!(session.state().snapshot()[0].content(), "preamble");
        assert!(out.contains("Chat history cleared!"));
    }

    #[tokio::test]
    async fn test_backend_error_is_reported_and_session_continues() {
        let (client, mut session) = session(true);
        let (out, err) = drive(&mut session, "first\nsecond\nbye\n").await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert!(err.contains("Error processing message: Backend error"));
        assert!(!out.contains("Error processing message"));
        assert!(out.contains("Goodbye!"));
        // Two user turns, no assistant turns
        let roles: Vec<Role> = session.state().snapshot().iter().map(|t| t.role()).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User]);
    }

    #[tokio::test]
    async fn test_banner_names_model() {
        let (_client, mut session) = session(false);
        let (out, _) = drive(&mut session, "quit\n").await;
        assert!(out.starts_with(&"=".repeat(RULE_WIDTH)));
        assert!(out.contains("Model: echo-1"));
        assert!(out.contains("Capabilities: none"));
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello"), "hello");
    }

    #[test]
    fn test_decode_line_replaces_invalid_bytes() {
        assert_eq!(decode_line(b"caf\xe9 au lait\n"), "caf\u{FFFD} au lait");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let (client, mut session) = session(false);
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        let result = session
            .run(&b"caf\xe9\nnext\nexit\n"[..], &mut out, &mut err)
            .await;

        assert!(result.is_ok());
        assert_eq!(session.status(), SessionStatus::Terminated);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert!(String::from_utf8(out).unwrap().contains("Goodbye!"));
    }
}
