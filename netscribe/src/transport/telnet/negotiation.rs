//! Telnet command stripping and option refusal (RFC 854).
//!
//! The client supports no options: every `DO` is answered with `WONT` and
//! every `WILL` with `DONT`. Subnegotiations are dropped.

/// Interpret As Command.
pub const IAC: u8 = 255;
/// Refuse to let the peer perform an option.
pub const DONT: u8 = 254;
/// Ask the peer to perform an option.
pub const DO: u8 = 253;
/// Refuse to perform an option.
pub const WONT: u8 = 252;
/// Offer to perform an option.
pub const WILL: u8 = 251;
/// Subnegotiation begin.
pub const SB: u8 = 250;
/// Subnegotiation end.
pub const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Data,
    Iac,
    Option(u8),
    Sub,
    SubIac,
}

/// Stateful decoder separating data bytes from Telnet commands.
///
/// Commands split across reads are handled: the state carries over.
#[derive(Debug, Default)]
pub struct Negotiator {
    state: State,
}

impl Negotiator {
    /// Create a decoder in the data state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `input`, returning the data bytes. Replies owed to the peer
    /// are appended to `replies`.
    pub fn decode(&mut self, input: &[u8], replies: &mut Vec<u8>) -> Vec<u8> {
        let mut data = Vec::with_capacity(input.len());

        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, 0) => State::Data,
                (State::Data, b) => {
                    data.push(b);
                    State::Data
                }

                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, cmd @ (DO | DONT | WILL | WONT)) => State::Option(cmd),
                (State::Iac, SB) => State::Sub,
                (State::Iac, _) => State::Data,

                (State::Option(cmd), option) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    State::Data
                }

                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
            };
        }

        data
    }
}

/// Escape outgoing data: a literal 0xFF is sent as `IAC IAC`.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        if byte == IAC {
            out.push(IAC);
        }
        out.push(byte);
    }
    out
}
