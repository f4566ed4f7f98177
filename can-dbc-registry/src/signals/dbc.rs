//! DBC text parser and writer
//!
//! Parses Vector DBC text with the `can-dbc` crate and converts it into our
//! message/signal definitions. The writer produces DBC text that `can-dbc`
//! reads back into the same definitions.

use crate::signals::definition::{ByteOrder, Message, Multiplex, Signal, ValueType};
use crate::types::{RegistryError, Result};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

/// Placeholder node name used by DBC files for "no node"
const NO_NODE: &str = "Vector__XXX";

/// Read a DBC file from disk, decoding it as UTF-8 or Latin-1
pub fn read_dbc_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        RegistryError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => {
            log::warn!("DBC file {:?} is not UTF-8, decoding as Latin-1", path);
            Ok(e.into_bytes().iter().map(|&b| b as char).collect())
        }
    }
}

/// Parse DBC text and return its message definitions
///
/// Empty (or whitespace-only) content is a valid, empty database.
pub fn parse_dbc(name: &str, content: &str) -> Result<Vec<Message>> {
    if content.trim().is_empty() {
        log::debug!("DBC '{}' has no content, starting empty", name);
        return Ok(Vec::new());
    }

    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        RegistryError::DbcParseError(format!("Failed to parse DBC '{}': {:?}", name, e))
    })?;

    let messages: Vec<Message> = dbc.messages().iter().map(convert_message).collect();

    log::info!("Parsed {} messages from '{}'", messages.len(), name);

    Ok(messages)
}

/// Convert a can-dbc message to our Message
fn convert_message(dbc_msg: &can_dbc::Message) -> Message {
    Message {
        address: dbc_msg.message_id().0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as u32,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) if name != NO_NODE => Some(name.to_string()),
            _ => None,
        },
        signals: dbc_msg.signals().iter().map(convert_signal).collect(),
    }
}

/// Convert a can-dbc signal to our Signal
fn convert_signal(dbc_sig: &can_dbc::Signal) -> Signal {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let multiplex = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::Multiplexor => Multiplex::Multiplexor,
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => {
            Multiplex::Multiplexed(switch_value)
        }
        can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(switch_value) => {
            Multiplex::MultiplexedMultiplexor(switch_value)
        }
        can_dbc::MultiplexIndicator::Plain => Multiplex::Plain,
    };

    Signal {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        receivers: dbc_sig
            .receivers()
            .iter()
            .filter(|r| r.as_str() != NO_NODE)
            .cloned()
            .collect(),
        multiplex,
    }
}

/// Render messages as DBC text
pub fn write_dbc<'a>(messages: impl IntoIterator<Item = &'a Message>) -> String {
    let messages: Vec<&Message> = messages.into_iter().collect();

    let nodes: BTreeSet<&str> = messages
        .iter()
        .flat_map(|msg| {
            msg.sender
                .as_deref()
                .into_iter()
                .chain(msg.signals.iter().flat_map(|s| s.receivers.iter().map(String::as_str)))
        })
        .collect();

    let mut out = String::new();
    out.push_str("VERSION \"\"\n\n");
    out.push_str("NS_ :\n\n");
    out.push_str("BS_:\n\n");
    out.push_str("BU_:");
    if nodes.is_empty() {
        out.push(' ');
        out.push_str(NO_NODE);
    }
    for node in &nodes {
        out.push(' ');
        out.push_str(node);
    }
    out.push_str("\n\n");

    for msg in messages {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "BO_ {} {}: {} {}",
            msg.address,
            msg.name,
            msg.size,
            msg.sender.as_deref().unwrap_or(NO_NODE)
        );
        for sig in &msg.signals {
            write_signal(&mut out, sig);
        }
        out.push('\n');
    }

    out
}

fn write_signal(out: &mut String, sig: &Signal) {
    let multiplex = match sig.multiplex {
        Multiplex::Plain => String::new(),
        Multiplex::Multiplexor => " M".to_string(),
        Multiplex::Multiplexed(value) => format!(" m{}", value),
        Multiplex::MultiplexedMultiplexor(value) => format!(" m{}M", value),
    };
    let byte_order = match sig.byte_order {
        ByteOrder::LittleEndian => '1',
        ByteOrder::BigEndian => '0',
    };
    let sign = match sig.value_type {
        ValueType::Unsigned => '+',
        ValueType::Signed => '-',
    };
    let receivers = if sig.receivers.is_empty() {
        NO_NODE.to_string()
    } else {
        sig.receivers.join(",")
    };

    let _ = writeln!(
        out,
        " SG_ {}{} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\" {}",
        sig.name,
        multiplex,
        sig.start_bit,
        sig.length,
        byte_order,
        sign,
        sig.factor,
        sig.offset,
        sig.min,
        sig.max,
        sig.unit.as_deref().unwrap_or(""),
        receivers
    );
}
