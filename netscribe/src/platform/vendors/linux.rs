//! Linux platform definition.
//!
//! Commands run on their own exec channel, so there is no prompt to find
//! and no settle time: a command is done when its channel closes. Anything
//! written to stderr marks the command as failed.

use std::sync::Arc;

use crate::driver::StderrClassifier;
use crate::platform::{CommandMode, ExitPolicy, PlatformDefinition};
use crate::transport::Protocol;

/// Create the Linux over SSH platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("linux-ssh", Protocol::Ssh)
        .with_command_mode(CommandMode::Exec)
        .with_classifier(Arc::new(StderrClassifier))
        .with_exit_policy(ExitPolicy::AlwaysSucceed)
}
