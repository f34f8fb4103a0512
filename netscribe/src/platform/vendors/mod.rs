//! Built-in platform definitions.

pub mod cisco_ios;
pub mod linux;
