//! Message and signal definitions
//!
//! These are the registry's own representation of the contents of a DBC
//! file, independent of the parser that produced them.

use serde::{Deserialize, Serialize};

/// A CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// CAN message ID
    pub address: u32,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: u32,
    /// Transmitting node (None for the DBC `Vector__XXX` placeholder)
    pub sender: Option<String>,
    /// Signals in definition order; names are unique within a message
    pub signals: Vec<Signal>,
}

impl Message {
    /// Create an empty message
    pub fn new(address: u32, name: impl Into<String>, size: u32) -> Self {
        Self {
            address,
            name: name.into(),
            size,
            sender: None,
            signals: Vec::new(),
        }
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub(crate) fn signal_index(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name
    pub name: String,
    /// Start bit in the CAN frame
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: Option<String>,
    /// Receiving nodes
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default)]
    pub multiplex: Multiplex,
}

impl Signal {
    /// Create an unsigned little-endian signal with identity scaling
    pub fn new(name: impl Into<String>, start_bit: u16, length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: None,
            receivers: Vec::new(),
            multiplex: Multiplex::Plain,
        }
    }

    /// Builder method: set factor and offset
    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    /// Builder method: set physical range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Builder method: set unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Builder method: set byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Builder method: set value type
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Builder method: set multiplexing role
    pub fn with_multiplex(mut self, multiplex: Multiplex) -> Self {
        self.multiplex = multiplex;
        self
    }
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Signed,
    Unsigned,
}

/// Role of a signal in a multiplexed message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplex {
    /// Always present
    #[default]
    Plain,
    /// The switch signal selecting which multiplexed signals are present
    Multiplexor,
    /// Present only when the multiplexor carries this value
    Multiplexed(u64),
    /// Multiplexed on this value and itself a switch (extended multiplexing)
    MultiplexedMultiplexor(u64),
}
