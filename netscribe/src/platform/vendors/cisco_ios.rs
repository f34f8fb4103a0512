//! Cisco IOS platform definitions.
//!
//! # Prompt Examples
//!
//! ```text
//! router>                            # user EXEC
//! router#                            # privileged EXEC
//! ```
//!
//! Over SSH the shell may open in user EXEC, so `enable` is sent with the
//! enable password. Over Telnet the login lands directly at `#`.

use std::sync::Arc;

use crate::channel::{ReadPolicy, Settle};
use crate::driver::FailurePatterns;
use crate::platform::{Escalation, ExitPolicy, PlatformDefinition};
use crate::transport::Protocol;

/// Maximum bytes taken per command on the SSH shell.
pub const SSH_READ_LIMIT: usize = 10_000;

/// Error entry content for a rejected command on the SSH shell.
pub const SSH_INVALID_COMMAND: &str = "Invalid command";

/// Create the Cisco IOS over SSH platform definition.
pub fn ssh_platform() -> PlatformDefinition {
    PlatformDefinition::new("cisco-ssh", Protocol::Ssh)
        .with_settle(Settle::seconds(2))
        .with_read_policy(ReadPolicy::Bounded(SSH_READ_LIMIT))
        .with_classifier(Arc::new(
            FailurePatterns::new()
                .with_pattern_ignore_case("invalid")
                .with_error_message(SSH_INVALID_COMMAND),
        ))
        .with_escalation(Escalation::new("enable").with_settle(Settle::seconds(1)))
        .with_exit_policy(ExitPolicy::AlwaysSucceed)
}

/// Create the Cisco IOS over Telnet platform definition.
pub fn telnet_platform() -> PlatformDefinition {
    PlatformDefinition::new("cisco-telnet", Protocol::Telnet)
        .with_settle(Settle::seconds(1))
        .with_read_policy(ReadPolicy::Drain)
        .with_classifier(Arc::new(
            FailurePatterns::new()
                .with_pattern("Invalid")
                .with_pattern("Error"),
        ))
        .with_exit_policy(ExitPolicy::FailOnFatal)
}
