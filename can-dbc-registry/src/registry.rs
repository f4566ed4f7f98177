//! DBC registry
//!
//! The `Registry` owns every open DBC file, each bound to a `SourceSet`,
//! and decides which file applies to a given source. Edits go through the
//! registry so that subscribers see a notification for every source the
//! edited file applies to.
//!
//! Resolution of a source scans the bindings in insertion order and takes
//! the first one whose set contains the source. If none does, the first
//! wildcard binding is used, paired with the currently active sources
//! rather than the wildcard itself.

use crate::config::RegistryConfig;
use crate::events::{RegistryEvent, Subscribers, SubscriptionId};
use crate::signals::{DefinitionFile, Message, Signal};
use crate::sources::SourceSet;
use crate::types::{MessageId, RegistryError, Result, SourceId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A DBC file together with the sources it applies to
#[derive(Debug)]
pub struct Binding {
    sources: SourceSet,
    file: DefinitionFile,
}

impl Binding {
    pub fn sources(&self) -> SourceSet {
        self.sources
    }

    pub fn file(&self) -> &DefinitionFile {
        &self.file
    }
}

/// Owner of all open DBC files
#[derive(Debug)]
pub struct Registry {
    /// Priority order: earlier bindings win
    bindings: Vec<Binding>,
    active_sources: SourceSet,
    subscribers: Subscribers,
    config: RegistryConfig,
}

impl Registry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            bindings: Vec::new(),
            active_sources: config.active_source_set(),
            subscribers: Subscribers::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a change handler
    ///
    /// Handlers run synchronously inside the mutating call, in the order
    /// they were subscribed.
    ///
    /// # Example
    /// ```
    /// use can_dbc_registry::{Registry, RegistryEvent, SourceSet};
    ///
    /// let mut registry = Registry::new();
    /// registry.subscribe(|event: &RegistryEvent<'_>| println!("{}", event.kind()));
    /// registry.open_content(SourceSet::from([0]), "empty.dbc", "").unwrap();
    /// ```
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&RegistryEvent<'_>) + Send + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    /// Remove a change handler; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Open a DBC file from disk and bind it to `sources`
    ///
    /// If a file with the same path is already open, `sources` is merged
    /// into its binding. Otherwise, if a binding has exactly `sources`, its
    /// file is replaced; if not, a new binding is appended. On a parse
    /// error the registry is left unchanged.
    pub fn open(&mut self, sources: SourceSet, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path.display().to_string();
        self.open_with(sources, &name, || DefinitionFile::from_file(path))
    }

    /// Open DBC text held in memory under a logical `name`
    ///
    /// Follows the same merge / replace / append rules as [`Registry::open`].
    pub fn open_content(&mut self, sources: SourceSet, name: &str, content: &str) -> Result<()> {
        self.open_with(sources, name, || DefinitionFile::from_content(name, content))
    }

    fn open_with<F>(&mut self, sources: SourceSet, name: &str, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<DefinitionFile>,
    {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.file.name() == name) {
            binding.sources = binding.sources.union(&sources);
            log::info!("{} already open, now bound to sources {}", name, binding.sources);
        } else if let Some(index) = self.bindings.iter().position(|b| b.sources == sources) {
            // The old file stays in place until the new one has parsed
            let file = load()?;
            log::info!(
                "Replacing {} with {} for sources {}",
                self.bindings[index].file.name(),
                name,
                sources
            );
            self.bindings[index].file = file;
        } else {
            let file = load()?;
            log::info!("Opened {} for sources {}", name, sources);
            self.bindings.push(Binding { sources, file });
        }

        self.subscribers.emit(&RegistryEvent::FileSetChanged);
        Ok(())
    }

    /// Close every file
    ///
    /// `FileSetChanged` is emitted even if nothing was open, unless the
    /// registry was configured otherwise.
    pub fn close_all(&mut self) {
        let closed = self.bindings.len();
        self.bindings.clear();
        log::info!("Closed {} DBC file(s)", closed);

        if closed > 0 || self.config.notify_on_empty_close {
            self.subscribers.emit(&RegistryEvent::FileSetChanged);
        }
    }

    /// Close the binding whose source set equals `sources`
    pub fn close(&mut self, sources: &SourceSet) -> bool {
        let Some(index) = self.bindings.iter().position(|b| b.sources == *sources) else {
            return false;
        };

        let binding = self.bindings.remove(index);
        log::info!("Closed {} (sources {})", binding.file.name(), binding.sources);
        self.subscribers.emit(&RegistryEvent::FileSetChanged);
        true
    }

    /// Record which concrete sources are currently active
    pub fn set_active_sources(&mut self, sources: SourceSet) {
        log::debug!("Active sources: {}", sources);
        self.active_sources = sources;
    }

    pub fn active_sources(&self) -> SourceSet {
        self.active_sources
    }

    /// All bindings in priority order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn resolve_index(&self, source: SourceId) -> Option<(usize, SourceSet)> {
        if let Some(index) = self.bindings.iter().position(|b| b.sources.contains(source)) {
            return Some((index, self.bindings[index].sources));
        }

        self.bindings
            .iter()
            .position(|b| b.sources == SourceSet::ALL)
            .map(|index| (index, self.active_sources))
    }

    /// Find the file that applies to `source`
    ///
    /// The returned set is the binding's own set, or the active sources if
    /// the file was found through a binding on exactly ALL. A set that was
    /// merged with ALL only matches its concrete members.
    pub fn resolve(&self, source: SourceId) -> Option<(SourceSet, &DefinitionFile)> {
        self.resolve_index(source)
            .map(|(index, sources)| (sources, &self.bindings[index].file))
    }

    pub fn file_for_source(&self, source: SourceId) -> Option<&DefinitionFile> {
        self.resolve(source).map(|(_, file)| file)
    }

    /// Resolve the binding an edit applies to
    fn owning_binding(&self, id: MessageId) -> Result<(usize, SourceSet)> {
        self.resolve_index(id.source).ok_or_else(|| {
            log::error!("Edit of message {} but no DBC file is bound to source {}", id, id.source);
            RegistryError::NoDefinitionFile(id.source)
        })
    }

    /// Add a signal to the message `id`
    ///
    /// On success `SignalAdded` is emitted once per source of the owning
    /// binding. Returns `Ok(None)` if the message does not exist or the
    /// name is taken.
    pub fn add_signal(&mut self, id: MessageId, signal: Signal) -> Result<Option<&Signal>> {
        let (index, sources) = self.owning_binding(id)?;

        let Some(added) = self.bindings[index].file.add_signal(id.address, signal) else {
            log::debug!("Signal not added to {}", id);
            return Ok(None);
        };

        for source in sources.iter() {
            self.subscribers.emit(&RegistryEvent::SignalAdded {
                id: id.with_source(source),
                signal: added,
            });
        }
        Ok(Some(added))
    }

    /// Replace the signal `old_name` of message `id`
    pub fn update_signal(
        &mut self,
        id: MessageId,
        old_name: &str,
        signal: Signal,
    ) -> Result<Option<&Signal>> {
        let (index, _) = self.owning_binding(id)?;

        let Some(updated) = self.bindings[index]
            .file
            .update_signal(id.address, old_name, signal)
        else {
            log::debug!("Signal '{}' of {} not updated", old_name, id);
            return Ok(None);
        };

        self.subscribers
            .emit(&RegistryEvent::SignalUpdated { id, signal: updated });
        Ok(Some(updated))
    }

    /// Remove a signal; subscribers are notified before it disappears
    ///
    /// Returns whether a signal was removed.
    pub fn remove_signal(&mut self, id: MessageId, name: &str) -> Result<bool> {
        let (index, _) = self.owning_binding(id)?;
        let file = &mut self.bindings[index].file;

        let Some(signal) = file.signal(id.address, name) else {
            return Ok(false);
        };
        self.subscribers.emit(&RegistryEvent::SignalRemoved { id, signal });

        file.remove_signal(id.address, name);
        Ok(true)
    }

    /// Create or update message `id`; `MessageUpdated` fans out per source
    pub fn update_message(&mut self, id: MessageId, name: &str, size: u32) -> Result<()> {
        let (index, sources) = self.owning_binding(id)?;
        self.bindings[index].file.update_message(id.address, name, size);

        for source in sources.iter() {
            self.subscribers.emit(&RegistryEvent::MessageUpdated {
                id: id.with_source(source),
            });
        }
        Ok(())
    }

    /// Remove message `id`; `MessageRemoved` fans out per source
    pub fn remove_message(&mut self, id: MessageId) -> Result<()> {
        let (index, sources) = self.owning_binding(id)?;
        self.bindings[index].file.remove_message(id.address);

        for source in sources.iter() {
            self.subscribers.emit(&RegistryEvent::MessageRemoved {
                id: id.with_source(source),
            });
        }
        Ok(())
    }

    /// Every message of the file that applies to `source`, keyed by ids
    /// tagged with `source`
    pub fn messages_for_source(&self, source: SourceId) -> BTreeMap<MessageId, Message> {
        let Some(file) = self.file_for_source(source) else {
            return BTreeMap::new();
        };

        file.messages()
            .iter()
            .map(|(address, msg)| (MessageId::new(source, *address), msg.clone()))
            .collect()
    }

    pub fn lookup_message(&self, id: MessageId) -> Option<&Message> {
        self.file_for_source(id.source)?.message(id.address)
    }

    pub fn lookup_message_by_name(&self, source: SourceId, name: &str) -> Option<&Message> {
        self.file_for_source(source)?.message_by_name(name)
    }

    /// Signal names across all files, sorted and deduplicated
    pub fn signal_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .bindings
            .iter()
            .flat_map(|b| b.file.signal_names())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    /// Total number of messages across all files
    pub fn message_count(&self) -> usize {
        self.bindings.iter().map(|b| b.file.message_count()).sum()
    }

    pub fn file_count(&self) -> usize {
        self.bindings.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
