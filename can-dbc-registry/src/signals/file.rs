//! In-memory DBC file
//!
//! A `DefinitionFile` owns the messages of one DBC file, keyed by CAN
//! address. Construction either succeeds completely or returns an error;
//! the edit operations never fail loudly and report "no effect" through
//! their return value instead.

use crate::signals::dbc;
use crate::signals::definition::{Message, Signal};
use crate::types::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One parsed DBC file
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionFile {
    /// Identifying name: the file path, or a logical name for content loads
    name: String,
    messages: BTreeMap<u32, Message>,
}

impl DefinitionFile {
    /// Create an empty file with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: BTreeMap::new(),
        }
    }

    /// Load a DBC file from disk; the path becomes the file's name
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading DBC file: {:?}", path);

        let content = dbc::read_dbc_file(path)?;
        Self::from_content(path.display().to_string(), &content)
    }

    /// Parse DBC text held in memory
    pub fn from_content(name: impl Into<String>, content: &str) -> Result<Self> {
        let mut file = Self::new(name);

        for message in dbc::parse_dbc(&file.name, content)? {
            file.insert_parsed(message);
        }

        Ok(file)
    }

    fn insert_parsed(&mut self, mut message: Message) {
        let mut seen = BTreeSet::new();
        message.signals.retain(|sig| {
            let fresh = seen.insert(sig.name.clone());
            if !fresh {
                log::warn!(
                    "{}: dropping duplicate signal '{}' in message 0x{:X}",
                    self.name,
                    sig.name,
                    message.address
                );
            }
            fresh
        });

        if let Some(previous) = self.messages.insert(message.address, message) {
            log::warn!(
                "{}: message 0x{:X} ({}) defined twice, keeping the later definition",
                self.name,
                previous.address,
                previous.name
            );
        }
    }

    /// Identifying name of this file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message at the given address
    pub fn message(&self, address: u32) -> Option<&Message> {
        self.messages.get(&address)
    }

    /// First message (in address order) with the given name
    pub fn message_by_name(&self, name: &str) -> Option<&Message> {
        self.messages.values().find(|m| m.name == name)
    }

    /// All messages keyed by address
    pub fn messages(&self) -> &BTreeMap<u32, Message> {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Total number of signals across all messages
    pub fn signal_count(&self) -> usize {
        self.messages.values().map(|m| m.signals.len()).sum()
    }

    /// Names of every signal in the file
    pub fn signal_names(&self) -> BTreeSet<&str> {
        self.messages
            .values()
            .flat_map(|m| m.signals.iter().map(|s| s.name.as_str()))
            .collect()
    }

    /// Look up a signal without modifying anything
    pub fn signal(&self, address: u32, name: &str) -> Option<&Signal> {
        self.messages.get(&address).and_then(|m| m.signal(name))
    }

    /// Add a signal to an existing message
    ///
    /// Returns the stored signal, or `None` if the message does not exist or
    /// already has a signal with that name.
    pub fn add_signal(&mut self, address: u32, signal: Signal) -> Option<&Signal> {
        let message = self.messages.get_mut(&address)?;
        if message.signal(&signal.name).is_some() {
            log::warn!(
                "{}: signal '{}' already exists in message 0x{:X}",
                self.name,
                signal.name,
                address
            );
            return None;
        }

        message.signals.push(signal);
        message.signals.last()
    }

    /// Replace the signal called `old_name` with `signal` (which may carry a
    /// new name)
    ///
    /// Returns the updated signal, or `None` if the message or signal is not
    /// found, or if the new name belongs to another signal of the message.
    pub fn update_signal(&mut self, address: u32, old_name: &str, signal: Signal) -> Option<&Signal> {
        let message = self.messages.get_mut(&address)?;
        let index = message.signal_index(old_name)?;

        if signal.name != old_name && message.signal(&signal.name).is_some() {
            log::warn!(
                "{}: cannot rename '{}' to '{}' in message 0x{:X}, name is taken",
                self.name,
                old_name,
                signal.name,
                address
            );
            return None;
        }

        message.signals[index] = signal;
        message.signals.get(index)
    }

    /// Remove a signal; no-op if absent
    pub fn remove_signal(&mut self, address: u32, name: &str) {
        if let Some(message) = self.messages.get_mut(&address) {
            message.signals.retain(|s| s.name != name);
        }
    }

    /// Create the message or update its name and size
    pub fn update_message(&mut self, address: u32, name: &str, size: u32) {
        self.messages
            .entry(address)
            .and_modify(|m| {
                m.name = name.to_string();
                m.size = size;
            })
            .or_insert_with(|| Message::new(address, name, size));
    }

    /// Remove a message and all of its signals; no-op if absent
    pub fn remove_message(&mut self, address: u32) {
        self.messages.remove(&address);
    }

    /// Render this file as DBC text
    pub fn to_dbc_string(&self) -> String {
        dbc::write_dbc(self.messages.values())
    }
}
