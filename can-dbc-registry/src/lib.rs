//! CAN DBC Registry Library
//!
//! Keeps track of the DBC files describing the messages on one or more CAN
//! sources, and decides which file applies to which source.
//!
//! # Architecture
//!
//! - `DefinitionFile` holds the messages and signals of one DBC file
//! - `SourceSet` is a set of source ids, or the `ALL` wildcard
//! - `Registry` owns the (SourceSet, DefinitionFile) bindings, resolves
//!   sources to files and notifies subscribers of every edit
//!
//! The library does NOT:
//! - Decode live CAN frames
//! - Talk to CAN hardware
//! - Persist anything beyond producing DBC text
//!
//! # Example Usage
//!
//! ```no_run
//! use can_dbc_registry::{MessageId, Registry, RegistryEvent, Signal, SourceSet};
//!
//! let mut registry = Registry::new();
//! registry.subscribe(|event: &RegistryEvent<'_>| {
//!     println!("{} {:?}", event.kind(), event.message_id());
//! });
//!
//! // Channels 0 and 1 share a powertrain database, everything else uses
//! // the common one
//! registry.open(SourceSet::from([0, 1]), "powertrain.dbc").unwrap();
//! registry.open(SourceSet::ALL, "common.dbc").unwrap();
//! registry.set_active_sources(SourceSet::from([0, 1, 2]));
//!
//! // Emits SignalAdded for source 0 and source 1
//! registry
//!     .add_signal(MessageId::new(0, 0x123), Signal::new("OilTemp", 24, 8))
//!     .unwrap();
//!
//! for (id, msg) in registry.messages_for_source(2) {
//!     println!("{} {}", id, msg.name);
//! }
//! ```

// Public modules
pub mod config;
pub mod events;
pub mod registry;
pub mod signals;
pub mod sources;
pub mod types;

// Re-export main types for convenience
pub use config::RegistryConfig;
pub use events::{RegistryEvent, SubscriptionId};
pub use registry::{Binding, Registry};
pub use signals::{ByteOrder, DefinitionFile, Message, Multiplex, Signal, ValueType};
pub use sources::SourceSet;
pub use types::{MessageId, RegistryError, Result, SourceId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
