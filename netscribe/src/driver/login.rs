//! Telnet login state machine.
//!
//! [`LoginState`] is a pure value: it names the prompt it is waiting for and
//! decides, for each [`LoginEvent`], the next state and the line to send.
//! [`login`] performs the reads and writes around it.

use std::time::Duration;

use log::{Level, debug, log};
use secrecy::ExposeSecret;
use tokio::time::Instant;

use super::session::Credentials;
use crate::channel::{Literal, Shell, ShellChannel};
use crate::error::{ChannelError, Error, LoginError, Result};

/// Disables `--More--` paging on Cisco IOS.
pub const DISABLE_PAGING: &str = "terminal length 0";

/// Where the login handshake stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// Waiting for `Username:`.
    AwaitUsernamePrompt,
    /// Username sent, waiting for `Password:`.
    AwaitPasswordPrompt,
    /// Password sent, waiting for the privileged prompt.
    AwaitShellPrompt,
    /// Paging disabled, waiting for the prompt to come back.
    AwaitPagingAck,
    /// Logged in; commands may be sent.
    Authenticated,
    /// The handshake failed.
    Failed(LoginError),
}

/// Something that happened while waiting for a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    /// The expected prompt arrived.
    PromptSeen,
    /// The prompt did not arrive within the wait.
    TimedOut(Duration),
    /// The stream failed.
    Io(String),
}

/// A line the state machine wants written.
#[derive(Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Text without the trailing newline.
    pub text: String,

    /// Kept out of logs.
    pub hidden: bool,
}

impl std::fmt::Debug for Outgoing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = if self.hidden { "<hidden>" } else { &self.text };
        f.debug_struct("Outgoing").field("text", &text).finish()
    }
}

/// Result of [`LoginState::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LoginState,
    pub send: Option<Outgoing>,
}

impl LoginState {
    /// The prompt this state waits for, or `None` in a final state.
    pub fn expected_prompt(&self) -> Option<&'static str> {
        match self {
            LoginState::AwaitUsernamePrompt => Some("Username:"),
            LoginState::AwaitPasswordPrompt => Some("Password:"),
            LoginState::AwaitShellPrompt | LoginState::AwaitPagingAck => Some("#"),
            LoginState::Authenticated | LoginState::Failed(_) => None,
        }
    }

    /// Whether the handshake is over.
    pub fn is_final(&self) -> bool {
        self.expected_prompt().is_none()
    }

    /// Compute the next state for `event`. Final states absorb every event.
    pub fn advance(self, event: LoginEvent, credentials: &Credentials) -> Transition {
        let prompt = match self.expected_prompt() {
            Some(prompt) => prompt,
            None => {
                return Transition {
                    next: self,
                    send: None,
                };
            }
        };

        match event {
            LoginEvent::PromptSeen => match self {
                LoginState::AwaitUsernamePrompt => Transition {
                    next: LoginState::AwaitPasswordPrompt,
                    send: Some(Outgoing {
                        text: credentials.username.clone(),
                        hidden: false,
                    }),
                },
                LoginState::AwaitPasswordPrompt => Transition {
                    next: LoginState::AwaitShellPrompt,
                    send: Some(Outgoing {
                        text: credentials
                            .password
                            .as_ref()
                            .map(|p| p.expose_secret().to_string())
                            .unwrap_or_default(),
                        hidden: true,
                    }),
                },
                LoginState::AwaitShellPrompt => Transition {
                    next: LoginState::AwaitPagingAck,
                    send: Some(Outgoing {
                        text: DISABLE_PAGING.to_string(),
                        hidden: false,
                    }),
                },
                _ => Transition {
                    next: LoginState::Authenticated,
                    send: None,
                },
            },
            LoginEvent::TimedOut(timeout) => Transition {
                next: LoginState::Failed(LoginError::PromptTimeout {
                    prompt: prompt.to_string(),
                    timeout,
                }),
                send: None,
            },
            LoginEvent::Io(message) => Transition {
                next: LoginState::Failed(LoginError::Io(message)),
                send: None,
            },
        }
    }
}

/// How long to wait in each state of the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPolicy {
    pub username_timeout: Duration,
    pub password_timeout: Duration,
    pub shell_timeout: Duration,
    pub paging_timeout: Duration,
}

impl LoginPolicy {
    /// The same timeout for every state.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            username_timeout: timeout,
            password_timeout: timeout,
            shell_timeout: timeout,
            paging_timeout: timeout,
        }
    }

    /// The wait applied in `state`.
    pub fn timeout_for(&self, state: &LoginState) -> Duration {
        match state {
            LoginState::AwaitUsernamePrompt => self.username_timeout,
            LoginState::AwaitPasswordPrompt => self.password_timeout,
            LoginState::AwaitShellPrompt => self.shell_timeout,
            LoginState::AwaitPagingAck => self.paging_timeout,
            LoginState::Authenticated | LoginState::Failed(_) => Duration::ZERO,
        }
    }
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(10))
    }
}

/// Run the login handshake on `channel`.
///
/// Step timings are logged at `info` when `verbose`, otherwise at `debug`.
pub async fn login<S: Shell>(
    channel: &mut ShellChannel<S>,
    credentials: &Credentials,
    policy: &LoginPolicy,
    verbose: bool,
) -> Result<()> {
    let level = if verbose { Level::Info } else { Level::Debug };
    let started = Instant::now();
    let mut state = LoginState::AwaitUsernamePrompt;

    while let Some(prompt) = state.expected_prompt() {
        let wait = policy.timeout_for(&state);
        let step = Instant::now();

        let event = match channel.read_until(&Literal::new(prompt), wait).await {
            Ok(_) => {
                log!(level, "login: saw {:?} after {:.3?}", prompt, step.elapsed());
                LoginEvent::PromptSeen
            }
            Err(Error::Channel(ChannelError::PatternTimeout(waited))) => {
                LoginEvent::TimedOut(waited)
            }
            Err(e) => LoginEvent::Io(e.to_string()),
        };

        let Transition { next, send } = state.advance(event, credentials);
        state = next;

        if let Some(line) = send {
            if line.hidden {
                debug!("login: sending hidden input");
            } else {
                debug!("login: sending {:?}", line.text);
            }
            if let Err(e) = channel.send_line(&line.text).await {
                state = state.advance(LoginEvent::Io(e.to_string()), credentials).next;
            }
        }
    }

    match state {
        LoginState::Failed(cause) => {
            log!(level, "login: failed after {:.3?}: {}", started.elapsed(), cause);
            Err(cause.into())
        }
        _ => {
            log!(level, "login: authenticated in {:.3?}", started.elapsed());
            Ok(())
        }
    }
}
