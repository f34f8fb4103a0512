//! Command dispatch: run commands in order and record each result.

use std::future::Future;

use log::{debug, trace};

use super::classify::{CommandOutput, OutputClassifier};
use crate::channel::{ReadPolicy, Settle, Shell, ShellChannel};
use crate::error::{ChannelError, Result};
use crate::transcript::{Entry, Transcript};
use crate::transport::SshTransport;

/// Runs one command and returns its raw output.
pub trait CommandRunner: Send {
    /// Run `command` to completion.
    fn run(&mut self, command: &str) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Types commands into an interactive shell.
///
/// Each command is written as a line, the shell is given `settle` to
/// finish, and the output is read according to `read_policy`.
pub struct ShellRunner<'a, S> {
    channel: &'a mut ShellChannel<S>,
    settle: Settle,
    read_policy: ReadPolicy,
}

impl<'a, S: Shell> ShellRunner<'a, S> {
    pub fn new(channel: &'a mut ShellChannel<S>, settle: Settle, read_policy: ReadPolicy) -> Self {
        Self {
            channel,
            settle,
            read_policy,
        }
    }
}

impl<S: Shell> CommandRunner for ShellRunner<'_, S> {
    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        if self.channel.is_eof() {
            return Err(ChannelError::Closed.into());
        }
        self.channel.send_line(command).await?;
        self.channel.settle(&self.settle).await?;
        let raw = self.channel.read_available(self.read_policy).await?;
        trace!("{:?} produced {} bytes", command, raw.len());
        Ok(CommandOutput::from_terminal(&raw))
    }
}

/// Runs each command on its own SSH exec channel.
pub struct ExecRunner<'a> {
    transport: &'a SshTransport,
}

impl<'a> ExecRunner<'a> {
    pub fn new(transport: &'a SshTransport) -> Self {
        Self { transport }
    }
}

impl CommandRunner for ExecRunner<'_> {
    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let output = self.transport.exec(command).await?;
        debug!("{:?} exited with {:?}", command, output.exit_status);
        Ok(CommandOutput::from_exec(&output))
    }
}

/// Run `commands` in order, appending a command entry and its classified
/// result for each one.
///
/// The pair for a command is appended only once its output is in, so a
/// failure leaves the transcript holding the completed pairs. The first
/// runner error stops the loop and is returned to the caller.
pub async fn dispatch<R: CommandRunner>(
    runner: &mut R,
    commands: &[String],
    classifier: &dyn OutputClassifier,
    transcript: &mut Transcript,
) -> Result<()> {
    for command in commands {
        debug!("sending {:?}", command);
        let output = runner.run(command).await?;
        transcript.push(Entry::command(command.as_str()));
        transcript.push(classifier.classify(&output));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::channel::ChannelConfig;
    use crate::channel::testing::{Reply, ScriptedShell};
    use crate::driver::{FailurePatterns, StderrClassifier};
    use crate::transcript::EntryKind;

    /// Replays canned results without any I/O.
    struct CannedRunner {
        results: VecDeque<Result<CommandOutput>>,
        seen: Vec<String>,
    }

    impl CannedRunner {
        fn new(results: impl IntoIterator<Item = Result<CommandOutput>>) -> Self {
            Self {
                results: results.into_iter().collect(),
                seen: Vec::new(),
            }
        }
    }

    impl CommandRunner for CannedRunner {
        async fn run(&mut self, command: &str) -> Result<CommandOutput> {
            self.seen.push(command.to_string());
            self.results
                .pop_front()
                .unwrap_or_else(|| Err(ChannelError::Closed.into()))
        }
    }

    fn stdout(text: &str) -> Result<CommandOutput> {
        Ok(CommandOutput {
            stdout: text.into(),
            stderr: String::new(),
        })
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_pairs_in_order() {
        let mut runner = CannedRunner::new([stdout("total 0\ndrwx..."), stdout("/root\n")]);
        let mut transcript = Transcript::new();

        dispatch(
            &mut runner,
            &commands(&["ls -la", "pwd"]),
            &StderrClassifier,
            &mut transcript,
        )
        .await
        .unwrap();

        assert_eq!(
            transcript.entries(),
            [
                Entry::command("ls -la"),
                Entry::output("total 0\ndrwx..."),
                Entry::command("pwd"),
                Entry::output("/root"),
            ]
        );
    }

    #[tokio::test]
    async fn test_classified_errors_do_not_stop_the_loop() {
        let mut runner = CannedRunner::new([
            stdout("% Invalid input detected"),
            stdout("Cisco IOS Software"),
        ]);
        let mut transcript = Transcript::new();
        let classifier = FailurePatterns::new().with_pattern_ignore_case("invalid");

        dispatch(
            &mut runner,
            &commands(&["show bogus", "show version"]),
            &classifier,
            &mut transcript,
        )
        .await
        .unwrap();

        let kinds: Vec<_> = transcript.iter().map(Entry::kind).collect();
        assert_eq!(
            kinds,
            [EntryKind::Command, EntryKind::Error, EntryKind::Command, EntryKind::Output]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_completed_pairs() {
        let mut runner = CannedRunner::new([
            stdout("one"),
            stdout("two"),
            Err(ChannelError::Closed.into()),
        ]);
        let mut transcript = Transcript::new();

        let err = dispatch(
            &mut runner,
            &commands(&["a", "b", "c", "d"]),
            &StderrClassifier,
            &mut transcript,
        )
        .await
        .unwrap_err();

        assert!(err.is_eof());
        assert_eq!(runner.seen, ["a", "b", "c"]);
        assert_eq!(transcript.len(), 4);
        assert!(transcript.iter().all(|e| e.content() != "c" && e.content() != "d"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shell_runner_settles_then_reads() {
        let shell = ScriptedShell::new()
            .expect(
                "show clock\n",
                Reply::chunks(["show clock\r\n*10:00:00.000 UTC Mon\r\nrouter#"]),
            )
            .expect("show users\n", Reply::chunks_then_hang_up(["show users\r\nrouter#"]));
        let mut channel = ShellChannel::new(shell, ChannelConfig::default());
        let mut runner = ShellRunner::new(&mut channel, Settle::seconds(1), ReadPolicy::Drain);

        let out = runner.run("show clock").await.unwrap();
        assert_eq!(out.stdout, "show clock\r\n*10:00:00.000 UTC Mon\r\nrouter#");

        let out = runner.run("show users").await.unwrap();
        assert_eq!(out.stdout, "show users\r\nrouter#");

        let err = runner.run("show ip route").await.unwrap_err();
        assert!(err.is_eof());
    }
}
