use futures::sink::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_stream::StreamExt;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::ansi;
use crate::codec::DreamerCodec;
use crate::error::SessionError;
use crate::frame::{Command, TelnetFrame, TelnetOption};
use crate::gate::ConnectionGate;

pub const TITLE: &str = "dreamer";
pub const GREETING: &str = "Speak friend and enter";
pub const PROMPT: &str = "> ";
pub const QUIT: &str = "quit";
pub const REJECTION: &str = "YOU ARE NOT FRIEND; BEGONE";
pub const FAREWELL: &str = "BYE";

/// What a completed line means for the session.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Verdict {
    Quit,
    Admitted,
    Rejected,
    Chatter(String),
}

/// How a session ended when it did not end in error.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SessionEnd {
    Quit,
    Rejected,
}

/// Per-connection line assembly and admission state.
#[derive(Debug, Default)]
pub struct SessionState {
    accepted: bool,
    line: Vec<u8>,
    terminator_seen: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Buffers `byte` if it is printable; returns whether it was kept.
    pub fn push(&mut self, byte: u8) -> bool {
        if byte >= 32 {
            self.line.push(byte);
            true
        } else {
            false
        }
    }

    /// Handles a CR or LF. Returns the completed line, or `None` when the
    /// terminator is the first half of a CR/LF pair on an empty line.
    pub fn terminate(&mut self) -> Option<String> {
        if self.line.is_empty() && !self.terminator_seen {
            self.terminator_seen = true;
            return None;
        }
        self.terminator_seen = false;

        let line = std::mem::take(&mut self.line);
        Some(
            String::from_utf8_lossy(&line)
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        )
    }

    /// Classifies a completed line, admitting the session on `secret`.
    pub fn judge(&mut self, line: String, secret: &str) -> Verdict {
        if line == QUIT {
            return Verdict::Quit;
        }

        if !self.accepted {
            if line != secret {
                return Verdict::Rejected;
            }
            self.accepted = true;
            return Verdict::Admitted;
        }

        Verdict::Chatter(line)
    }
}

/// Drives one client connection from greeting to farewell.
pub struct Session<T> {
    stream: Framed<T, DreamerCodec>,
    state: SessionState,
    peer: String,
    secret: Arc<str>,
    gate: Arc<ConnectionGate>,
    idle_timeout: Option<Duration>,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T, peer: String, secret: Arc<str>, gate: Arc<ConnectionGate>) -> Self {
        Self {
            stream: Framed::new(io, DreamerCodec::new()),
            state: SessionState::new(),
            peer,
            secret,
            gate,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn run(mut self) -> Result<SessionEnd, SessionError> {
        self.greet().await?;

        let end = loop {
            let len = self.state.line().len();
            self.send(ansi::rainbow(len)).await?;

            match self.next_frame().await? {
                TelnetFrame::LineTerminator(_) => {
                    let Some(line) = self.state.terminate() else {
                        continue;
                    };
                    if let Some(end) = self.complete_line(line).await? {
                        break end;
                    }
                }

                TelnetFrame::Literal(byte) => {
                    self.state.push(byte);
                    self.send(vec![byte]).await?;
                }

                // Negotiation is logged, never answered
                frame => debug!("{} {}", self.peer, frame),
            }
        };

        let mut farewell = ansi::reset();
        farewell.extend_from_slice(ansi::NEWLINE);
        farewell.extend_from_slice(FAREWELL.as_bytes());
        farewell.extend_from_slice(ansi::NEWLINE);
        self.send(farewell).await?;

        Ok(end)
    }

    /// Option announcements, window title, greeting and the first prompt.
    async fn greet(&mut self) -> Result<(), SessionError> {
        // WILL ECHO directly followed by DONT ECHO is what existing clients
        // have always been sent.
        let announcements = [
            (Command::Do, TelnetOption::SuppressLocalEcho),
            (Command::Will, TelnetOption::Echo),
            (Command::Dont, TelnetOption::Echo),
            (Command::Dont, TelnetOption::Linemode),
            (Command::Dont, TelnetOption::TerminalSpeed),
            (Command::Wont, TelnetOption::TerminalSpeed),
        ];
        for (command, option) in announcements {
            self.stream
                .feed(TelnetFrame::command(command, option))
                .await?;
        }
        self.stream.flush().await?;

        self.send(ansi::title(TITLE)).await?;

        let mut greeting = GREETING.as_bytes().to_vec();
        greeting.extend_from_slice(ansi::NEWLINE);
        greeting.extend_from_slice(PROMPT.as_bytes());
        self.send(greeting).await
    }

    async fn next_frame(&mut self) -> Result<TelnetFrame, SessionError> {
        let next = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.stream.next())
                .await
                .map_err(|_| SessionError::IdleTimeout(limit))?,
            None => self.stream.next().await,
        };

        match next {
            Some(frame) => frame,
            None => Err(SessionError::ConnectionFailure(
                std::io::ErrorKind::UnexpectedEof.into(),
            )),
        }
    }

    /// Acts on a completed line; `Some` ends the session.
    async fn complete_line(&mut self, line: String) -> Result<Option<SessionEnd>, SessionError> {
        debug!(
            "{} said {:?} (accepted: {})",
            self.peer,
            line,
            self.state.is_accepted()
        );

        match self.state.judge(line, &self.secret) {
            Verdict::Quit => Ok(Some(SessionEnd::Quit)),

            Verdict::Rejected => {
                let count = self.gate.record_failure(&self.peer);
                warn!("{} rejected, {} failure(s) on record", self.peer, count);

                let mut rejection = ansi::NEWLINE.to_vec();
                rejection.extend(ansi::colors(ansi::ALARM_FG, ansi::ALARM_BG));
                rejection.extend_from_slice(REJECTION.as_bytes());
                self.send(rejection).await?;

                Ok(Some(SessionEnd::Rejected))
            }

            Verdict::Admitted => {
                info!("{} admitted", self.peer);
                self.prompt().await?;
                Ok(None)
            }

            Verdict::Chatter(line) => {
                info!("{} said {}", self.peer, line);
                self.prompt().await?;
                Ok(None)
            }
        }
    }

    async fn prompt(&mut self) -> Result<(), SessionError> {
        let mut prompt = ansi::reset();
        prompt.extend_from_slice(ansi::NEWLINE);
        prompt.extend_from_slice(PROMPT.as_bytes());
        self.send(prompt).await
    }

    async fn send(&mut self, data: Vec<u8>) -> Result<(), SessionError> {
        self.stream.send(TelnetFrame::Data(data)).await
    }
}
