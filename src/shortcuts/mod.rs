//! Non-Steam shortcut handling
//!
//! This module handles:
//! - Recovering shortcut records from the binary shortcuts store
//! - Deriving the 64-bit app id Steam assigns to each shortcut
//! - The shared record type that flows into the artwork pipeline

pub mod appid;
pub mod parser;
pub mod record;
