//! Command-line front end for netscribe.
//!
//! Parses positional arguments, runs one session and prints the transcript
//! to stdout as a JSON array.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use netscribe::{ExitPolicy, Outcome, Platform, Session, SessionBuilder, Transcript};

/// Run commands on a device and print the transcript as JSON.
#[derive(Parser, Debug)]
#[command(name = "netscribe", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub target: Target,
}

/// Options shared by every target.
#[derive(Args, Debug, Clone)]
pub struct Options {
    /// Port to connect to (default: 22 for SSH, 23 for Telnet)
    #[arg(long)]
    pub port: Option<u16>,

    /// Timeout in seconds for connecting and for each login prompt
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Debug logging on stderr, with login step timings
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where to connect and as whom.
#[derive(Args, Debug, Clone)]
pub struct Login {
    /// Device hostname or IP
    pub host: String,

    /// Login username
    pub username: String,

    /// Login password
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Target {
    /// Linux host over SSH, one exec channel per command
    LinuxSsh {
        #[command(flatten)]
        options: Options,

        #[command(flatten)]
        login: Login,

        /// Commands to run, in order
        commands: Vec<String>,
    },

    /// Cisco IOS over SSH, escalating with `enable` when needed
    CiscoSsh {
        #[command(flatten)]
        options: Options,

        #[command(flatten)]
        login: Login,

        /// Password for `enable`
        enable_password: Option<String>,

        /// Commands to run, in order
        commands: Vec<String>,
    },

    /// Cisco IOS over Telnet
    CiscoTelnet {
        #[command(flatten)]
        options: Options,

        #[command(flatten)]
        login: Login,

        /// Commands to run, in order
        commands: Vec<String>,
    },
}

impl Cli {
    /// Options of the selected target.
    pub fn options(&self) -> &Options {
        match &self.target {
            Target::LinuxSsh { options, .. }
            | Target::CiscoSsh { options, .. }
            | Target::CiscoTelnet { options, .. } => options,
        }
    }

    /// Platform of the selected target.
    pub fn platform(&self) -> Platform {
        match self.target {
            Target::LinuxSsh { .. } => Platform::LinuxSsh,
            Target::CiscoSsh { .. } => Platform::CiscoSsh,
            Target::CiscoTelnet { .. } => Platform::CiscoTelnet,
        }
    }

    /// Build the session and the command list.
    pub fn into_session(self) -> netscribe::Result<(Session, Vec<String>)> {
        let platform = self.platform();
        let (options, login, enable_password, commands) = match self.target {
            Target::LinuxSsh {
                options,
                login,
                commands,
            }
            | Target::CiscoTelnet {
                options,
                login,
                commands,
            } => (options, login, None, commands),
            Target::CiscoSsh {
                options,
                login,
                enable_password,
                commands,
            } => (options, login, enable_password, commands),
        };

        let mut builder = SessionBuilder::new(login.host)
            .username(login.username)
            .platform(platform)
            .timeout(Duration::from_secs(options.timeout))
            .verbose(options.verbose);
        if let Some(port) = options.port {
            builder = builder.port(port);
        }
        if let Some(password) = login.password {
            builder = builder.password(password);
        }
        if let Some(enable) = enable_password {
            builder = builder.enable_password(enable);
        }

        Ok((builder.build()?, commands))
    }
}

/// Serialize the transcript entries as pretty JSON with 4-space indentation.
pub fn render(transcript: &Transcript) -> Result<String> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    transcript
        .entries()
        .serialize(&mut ser)
        .context("serializing transcript")?;
    String::from_utf8(out).context("transcript is not valid UTF-8")
}

/// Process exit status for a finished session.
pub fn exit_code(policy: ExitPolicy, outcome: Outcome) -> ExitCode {
    match (policy, outcome) {
        (ExitPolicy::FailOnFatal, Outcome::Failed) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

/// Run the session described by `cli` and print its transcript.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let (mut session, commands) = cli.into_session()?;
    info!(
        "running {} command(s) on {}:{} as {}",
        commands.len(),
        session.host(),
        session.port(),
        session.platform().name
    );

    let transcript = session.run(&commands).await;
    println!("{}", render(&transcript)?);

    Ok(exit_code(session.platform().exit_policy, transcript.outcome()))
}
