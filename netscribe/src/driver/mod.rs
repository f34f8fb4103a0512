//! Session driver: login, privilege escalation, command dispatch and
//! output classification on top of the transport and channel layers.

mod builder;
mod classify;
mod dispatch;
pub mod login;
mod privilege;
mod session;

pub use builder::SessionBuilder;
pub use classify::{CommandOutput, FailurePatterns, OutputClassifier, StderrClassifier};
pub use dispatch::{CommandRunner, ExecRunner, ShellRunner, dispatch};
pub use login::{LoginEvent, LoginPolicy, LoginState};
pub use privilege::escalate;
pub use session::{Credentials, Session, SessionConfig};
