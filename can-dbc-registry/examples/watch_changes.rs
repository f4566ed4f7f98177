//! Print every registry notification while editing a DBC
//!
//! Usage:
//!   watch_changes [file.dbc]
//!
//! Without an argument a small built-in database is used. The file is bound
//! to sources 0 and 1, so message and signal additions are reported twice.

use can_dbc_registry::{MessageId, Registry, RegistryEvent, Result, Signal, SourceSet};
use std::env;

const BUILTIN_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1 ECU2

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
"#;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut registry = Registry::new();
    registry.subscribe(|event: &RegistryEvent<'_>| match event {
        RegistryEvent::SignalAdded { id, signal } => {
            println!("signal added   {} {}", id, signal.name)
        }
        RegistryEvent::SignalRemoved { id, signal } => {
            println!("signal removed {} {}", id, signal.name)
        }
        other => println!("{:<14} {:?}", other.kind(), other.message_id()),
    });

    let sources = SourceSet::from([0, 1]);
    let opened = match env::args().nth(1) {
        Some(path) => registry.open(sources, &path),
        None => registry.open_content(sources, "builtin.dbc", BUILTIN_DBC),
    };
    if let Err(e) = opened {
        eprintln!("Error loading DBC: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = edit(&mut registry) {
        eprintln!("Edit failed: {}", e);
        std::process::exit(1);
    }

    println!("\n{}", registry.file_for_source(1).map(|f| f.to_dbc_string()).unwrap_or_default());
}

fn edit(registry: &mut Registry) -> Result<()> {
    let id = MessageId::new(0, 0x7A0);
    registry.update_message(id, "Diagnostics", 8)?;
    registry.add_signal(id, Signal::new("ErrorCode", 0, 16))?;
    registry.remove_signal(id, "ErrorCode")?;
    Ok(())
}
