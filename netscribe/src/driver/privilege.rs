//! Privilege escalation on an interactive shell.

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::channel::{Shell, ShellChannel, last_line};
use crate::error::{LoginError, Result};
use crate::platform::{Escalation, PrivilegeLevel};

/// Bring a freshly opened shell to [`PrivilegeLevel::Elevated`].
///
/// Waits for the banner and escalates if the unprivileged marker shows up
/// anywhere in it: the escalation command, then `enable_password`.
/// Everything read along the way is discarded.
pub async fn escalate<S: Shell>(
    channel: &mut ShellChannel<S>,
    escalation: &Escalation,
    enable_password: Option<&SecretString>,
) -> Result<PrivilegeLevel> {
    channel.settle(&escalation.settle).await?;
    let banner = channel.drain().await?;
    let banner = String::from_utf8_lossy(&banner);

    if PrivilegeLevel::from_banner(&banner, escalation) == PrivilegeLevel::Elevated {
        debug!("no {:?} in banner, already privileged", escalation.unprivileged_marker);
        return Ok(PrivilegeLevel::Elevated);
    }

    debug!(
        "unprivileged marker {:?} seen, sending {:?}",
        escalation.unprivileged_marker, escalation.command
    );
    channel.send_line(&escalation.command).await?;
    channel.settle(&escalation.settle).await?;

    let password = enable_password.ok_or(LoginError::EnablePasswordMissing)?;
    channel.send_line(password.expose_secret()).await?;
    channel.settle(&escalation.settle).await?;

    let after = channel.drain().await?;
    let prompt = last_line(&after);
    if PrivilegeLevel::from_prompt(&prompt, escalation) != Some(PrivilegeLevel::Elevated) {
        warn!("prompt after escalation is {:?}, continuing anyway", prompt);
    }

    Ok(PrivilegeLevel::Elevated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelConfig;
    use crate::channel::testing::{Reply, ScriptedShell};
    use crate::error::Error;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn channel(shell: ScriptedShell) -> ShellChannel<ScriptedShell> {
        ShellChannel::new(shell, ChannelConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_from_user_prompt() {
        let shell = ScriptedShell::new()
            .greeting(["\r\n**** authorized access only ****\r\n\r\nrouter>"])
            .expect("enable\n", Reply::chunks(["enable\r\nPassword: "]))
            .expect("s3cret\n", Reply::chunks(["\r\nrouter#"]));
        let log = shell.log();
        let mut ch = channel(shell);

        let level = escalate(&mut ch, &Escalation::new("enable"), Some(&secret("s3cret")))
            .await
            .unwrap();

        assert_eq!(level, PrivilegeLevel::Elevated);
        assert_eq!(log.lock().unwrap().writes, ["enable\n", "s3cret\n"]);
        assert!(ch.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_privileged_prompt_skips_escalation() {
        let mut ch = channel(ScriptedShell::new().greeting(["router#"]));

        let level = escalate(&mut ch, &Escalation::new("enable"), None).await.unwrap();
        assert_eq!(level, PrivilegeLevel::Elevated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_when_syslog_follows_prompt() {
        let shell = ScriptedShell::new()
            .greeting([
                "\r\nrouter>\r\n",
                "*Mar  1 00:00:07: %SYS-5-CONFIG_I: Configured from console\r\n",
            ])
            .expect("enable\n", Reply::chunks(["Password: "]))
            .expect("s3cret\n", Reply::chunks(["\r\nrouter#"]));
        let log = shell.log();
        let mut ch = channel(shell);

        let level = escalate(&mut ch, &Escalation::new("enable"), Some(&secret("s3cret")))
            .await
            .unwrap();

        assert_eq!(level, PrivilegeLevel::Elevated);
        assert_eq!(log.lock().unwrap().writes, ["enable\n", "s3cret\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_without_marker_skips_escalation() {
        let shell = ScriptedShell::new().greeting(["Last login: Mon from 10.0.0.1\r\nrouter#"]);
        let log = shell.log();
        let mut ch = channel(shell);

        let level = escalate(&mut ch, &Escalation::new("enable"), None).await.unwrap();
        assert_eq!(level, PrivilegeLevel::Elevated);
        assert!(log.lock().unwrap().writes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_enable_password() {
        let shell = ScriptedShell::new()
            .greeting(["router>"])
            .expect("enable\n", Reply::chunks(["Password: "]));
        let mut ch = channel(shell);

        let err = escalate(&mut ch, &Escalation::new("enable"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Login(LoginError::EnablePasswordMissing)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_before_prompt() {
        let mut ch = channel(ScriptedShell::new().hang_up_after_greeting());

        let err = escalate(&mut ch, &Escalation::new("enable"), None)
            .await
            .unwrap_err();
        assert!(err.is_eof());
    }
}
