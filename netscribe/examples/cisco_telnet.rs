//! Log in to a Cisco IOS device over Telnet and run a few show commands.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example cisco_telnet -- 192.168.1.1 admin secret "show clock" "show users"
//! ```

use std::env;
use std::time::Duration;

use netscribe::{Platform, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for login step timings
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let (Some(host), Some(user)) = (args.next(), args.next()) else {
        eprintln!("usage: cisco_telnet <host> <user> [password] [command]...");
        std::process::exit(2);
    };
    let password = args.next();
    let commands: Vec<String> = args.collect();

    let mut builder = SessionBuilder::new(&host)
        .username(user)
        .platform(Platform::CiscoTelnet)
        .timeout(Duration::from_secs(10))
        .verbose(true);
    if let Some(password) = password {
        builder = builder.password(password);
    }
    let mut session = builder.build()?;

    println!("Connecting to {}:{}...", session.host(), session.port());
    let transcript = session.run(&commands).await;

    for entry in transcript.iter() {
        println!("[{:?}]\n{}\n", entry.kind(), entry.content());
    }
    println!("Outcome: {:?}", transcript.outcome());
    Ok(())
}
