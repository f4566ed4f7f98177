//! DBC definitions
//!
//! This module contains the message/signal types, the DBC text
//! parser/writer and the in-memory definition file built on top of them.

pub mod dbc;
pub mod definition;
pub mod file;

// Re-export key types for convenience
pub use definition::{ByteOrder, Message, Multiplex, Signal, ValueType};
pub use file::DefinitionFile;
