//! # POCSAG TX Library
//!
//! Encode short text pages into the POCSAG paging format and send them
//! through a serial-attached radio modem.
//!
//! The codec in [`pocsag`] is pure and synchronous; everything else is the
//! plumbing around it (operator commands, configuration, the serial link).

pub mod command;
pub mod config;
pub mod error;
pub mod frequency;
pub mod pocsag;
pub mod serial;
pub mod session;
