// End-to-end behaviour of the registry: merge/replace rules, resolution
// priority and notification fan-out.
use can_dbc_registry::{
    MessageId, Registry, RegistryError, RegistryEvent, Signal, SourceSet,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

const POWERTRAIN_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1 ECU2

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 16|8@1+ (1,-40) [-40|215] "C" ECU2

BO_ 512 BatteryStatus: 8 ECU1
 SG_ BatteryVoltage : 0|16@1+ (0.01,0) [0|16] "V" ECU2
"#;

const CHASSIS_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ABS

BO_ 768 WheelSpeeds: 8 ABS
 SG_ WheelSpeedFL : 0|16@1+ (0.01,0) [0|300] "km/h" ABS
 SG_ EngineSpeed : 16|16@1+ (1,0) [0|8000] "rpm" ABS
"#;

/// Owned copy of an event, recorded by the test subscriber
#[derive(Debug, Clone, PartialEq)]
enum Seen {
    FileSetChanged,
    SignalAdded(MessageId, String),
    SignalUpdated(MessageId, String),
    SignalRemoved(MessageId, String),
    MessageUpdated(MessageId),
    MessageRemoved(MessageId),
}

fn record(registry: &mut Registry) -> Arc<Mutex<Vec<Seen>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.subscribe(move |event: &RegistryEvent<'_>| {
        let entry = match event {
            RegistryEvent::FileSetChanged => Seen::FileSetChanged,
            RegistryEvent::SignalAdded { id, signal } => Seen::SignalAdded(*id, signal.name.clone()),
            RegistryEvent::SignalUpdated { id, signal } => {
                Seen::SignalUpdated(*id, signal.name.clone())
            }
            RegistryEvent::SignalRemoved { id, signal } => {
                Seen::SignalRemoved(*id, signal.name.clone())
            }
            RegistryEvent::MessageUpdated { id } => Seen::MessageUpdated(*id),
            RegistryEvent::MessageRemoved { id } => Seen::MessageRemoved(*id),
        };
        sink.lock().unwrap().push(entry);
    });
    seen
}

fn take(seen: &Arc<Mutex<Vec<Seen>>>) -> Vec<Seen> {
    std::mem::take(&mut *seen.lock().unwrap())
}

fn dbc_on_disk(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn reopening_same_name_merges_sources() {
    let mut registry = Registry::new();
    let seen = record(&mut registry);

    registry.open_content(SourceSet::from([2]), "fileA.dbc", POWERTRAIN_DBC).unwrap();
    assert_eq!(take(&seen), vec![Seen::FileSetChanged]);

    registry.open_content(SourceSet::from([2, 9]), "fileA.dbc", POWERTRAIN_DBC).unwrap();
    assert_eq!(take(&seen), vec![Seen::FileSetChanged]);

    assert_eq!(registry.file_count(), 1);
    assert_eq!(registry.bindings()[0].sources(), SourceSet::from([2, 9]));
}

#[test]
fn reopening_same_path_merges_without_reparsing() {
    let file = dbc_on_disk(POWERTRAIN_DBC);
    let mut registry = Registry::new();

    registry.open(SourceSet::from([0]), file.path()).unwrap();
    registry.open(SourceSet::from([1]), file.path()).unwrap();

    assert_eq!(registry.file_count(), 1);
    assert_eq!(registry.bindings()[0].sources(), SourceSet::from([0, 1]));
    assert_eq!(registry.message_count(), 2);
}

#[test]
fn equal_source_set_replaces_file() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0, 1]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    registry.open_content(SourceSet::from([1, 0]), "chassis.dbc", CHASSIS_DBC).unwrap();

    assert_eq!(take(&seen), vec![Seen::FileSetChanged]);
    assert_eq!(registry.file_count(), 1);
    assert_eq!(registry.file_for_source(0).unwrap().name(), "chassis.dbc");
    assert!(registry.lookup_message(MessageId::new(0, 291)).is_none());
    assert!(registry.lookup_message(MessageId::new(0, 768)).is_some());
}

#[test]
fn failed_replacement_keeps_old_file() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0, 1]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    let err = registry
        .open_content(SourceSet::from([0, 1]), "broken.dbc", "BO_ this is not valid")
        .unwrap_err();

    assert!(matches!(err, RegistryError::DbcParseError(_)));
    assert!(take(&seen).is_empty());
    assert_eq!(registry.file_count(), 1);
    assert_eq!(registry.file_for_source(1).unwrap().name(), "powertrain.dbc");
    assert_eq!(registry.message_count(), 2);
}

#[test]
fn failed_replacement_from_disk_keeps_old_file() {
    let good = dbc_on_disk(POWERTRAIN_DBC);
    let broken = dbc_on_disk("BO_ this is not valid");
    let mut registry = Registry::new();
    registry.open(SourceSet::from([0, 1]), good.path()).unwrap();
    let seen = record(&mut registry);

    let err = registry.open(SourceSet::from([0, 1]), broken.path()).unwrap_err();

    assert!(matches!(err, RegistryError::DbcParseError(_)));
    assert!(take(&seen).is_empty());
    assert_eq!(registry.file_count(), 1);
    assert_eq!(registry.bindings()[0].sources(), SourceSet::from([0, 1]));
    assert_eq!(
        registry.file_for_source(0).unwrap().name(),
        good.path().display().to_string()
    );
    assert!(registry.lookup_message_by_name(1, "EngineData").is_some());
    assert_eq!(registry.message_count(), 2);
}

#[test]
fn failed_file_open_reports_path() {
    let mut registry = Registry::new();
    let err = registry
        .open(SourceSet::from([0]), "/nonexistent/powertrain.dbc")
        .unwrap_err();

    assert!(err.to_string().contains("powertrain.dbc"));
    assert_eq!(registry.file_count(), 0);
}

#[test]
fn close_all_empties_registry() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    registry.open_content(SourceSet::from([1]), "chassis.dbc", CHASSIS_DBC).unwrap();
    let seen = record(&mut registry);

    registry.close_all();

    assert_eq!(take(&seen), vec![Seen::FileSetChanged]);
    assert_eq!(registry.file_count(), 0);
    assert_eq!(registry.message_count(), 0);

    // Already empty: still notifies
    registry.close_all();
    assert_eq!(take(&seen), vec![Seen::FileSetChanged]);
}

#[test]
fn add_signal_fans_out_per_source() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([1, 3, 5]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    let added = registry
        .add_signal(MessageId::new(3, 291), Signal::new("OilTemp", 24, 8))
        .unwrap()
        .cloned();
    assert_eq!(added.map(|s| s.start_bit), Some(24));

    assert_eq!(
        take(&seen),
        vec![
            Seen::SignalAdded(MessageId::new(1, 291), "OilTemp".to_string()),
            Seen::SignalAdded(MessageId::new(3, 291), "OilTemp".to_string()),
            Seen::SignalAdded(MessageId::new(5, 291), "OilTemp".to_string()),
        ]
    );
}

#[test]
fn rejected_add_signal_is_silent() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([1, 3]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    let duplicate = registry
        .add_signal(MessageId::new(1, 291), Signal::new("EngineSpeed", 32, 8))
        .unwrap();
    assert!(duplicate.is_none());

    let no_message = registry
        .add_signal(MessageId::new(1, 0x7FF), Signal::new("Orphan", 0, 8))
        .unwrap();
    assert!(no_message.is_none());

    assert!(take(&seen).is_empty());
}

#[test]
fn signal_removed_is_announced_before_removal() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0, 1]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();

    // The handler sees the signal's data, which only exists while the
    // signal is still part of its message.
    let start_bits = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&start_bits);
    registry.subscribe(move |event: &RegistryEvent<'_>| {
        if let RegistryEvent::SignalRemoved { signal, .. } = event {
            sink.lock().unwrap().push(signal.start_bit);
        }
    });
    let seen = record(&mut registry);

    let id = MessageId::new(1, 291);
    assert!(registry.remove_signal(id, "EngineTemp").unwrap());

    assert_eq!(*start_bits.lock().unwrap(), vec![16]);
    assert_eq!(
        take(&seen),
        vec![Seen::SignalRemoved(id, "EngineTemp".to_string())]
    );
    let file = registry.file_for_source(1).unwrap();
    assert!(file.signal(291, "EngineTemp").is_none());

    // Removing again is a silent no-op
    assert!(!registry.remove_signal(id, "EngineTemp").unwrap());
    assert!(take(&seen).is_empty());
}

#[test]
fn update_signal_notifies_once() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0, 1, 2]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    let id = MessageId::new(2, 291);
    registry
        .update_signal(id, "EngineTemp", Signal::new("CoolantTemp", 16, 8).with_scaling(1.0, -40.0))
        .unwrap();

    assert_eq!(take(&seen), vec![Seen::SignalUpdated(id, "CoolantTemp".to_string())]);
    assert!(registry.signal_names().contains(&"CoolantTemp".to_string()));
}

#[test]
fn message_edits_fan_out_per_source() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([4, 7]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    registry.update_message(MessageId::new(7, 0x400), "NewMessage", 4).unwrap();
    assert_eq!(
        take(&seen),
        vec![
            Seen::MessageUpdated(MessageId::new(4, 0x400)),
            Seen::MessageUpdated(MessageId::new(7, 0x400)),
        ]
    );
    assert_eq!(registry.lookup_message(MessageId::new(4, 0x400)).unwrap().name, "NewMessage");

    registry.remove_message(MessageId::new(4, 291)).unwrap();
    assert_eq!(
        take(&seen),
        vec![
            Seen::MessageRemoved(MessageId::new(4, 291)),
            Seen::MessageRemoved(MessageId::new(7, 291)),
        ]
    );
    assert!(registry.lookup_message(MessageId::new(7, 291)).is_none());
}

#[test]
fn concrete_binding_beats_earlier_wildcard() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::ALL, "common.dbc", CHASSIS_DBC).unwrap();
    registry.open_content(SourceSet::from([1]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();

    assert_eq!(registry.file_for_source(1).unwrap().name(), "powertrain.dbc");
    assert_eq!(registry.file_for_source(0).unwrap().name(), "common.dbc");
    assert_eq!(registry.lookup_message_by_name(1, "EngineData").unwrap().address, 291);
    assert!(registry.lookup_message_by_name(1, "WheelSpeeds").is_none());
}

#[test]
fn wildcard_edits_fan_out_to_active_sources() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::ALL, "common.dbc", CHASSIS_DBC).unwrap();
    registry.set_active_sources(SourceSet::from([0, 2]));
    let seen = record(&mut registry);

    registry
        .add_signal(MessageId::new(2, 768), Signal::new("WheelSpeedFR", 32, 16))
        .unwrap();

    assert_eq!(
        take(&seen),
        vec![
            Seen::SignalAdded(MessageId::new(0, 768), "WheelSpeedFR".to_string()),
            Seen::SignalAdded(MessageId::new(2, 768), "WheelSpeedFR".to_string()),
        ]
    );
}

#[test]
fn messages_are_projected_onto_requested_source() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::ALL, "common.dbc", CHASSIS_DBC).unwrap();
    registry.open_content(SourceSet::from([3, 7, 8]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();

    let on_7 = registry.messages_for_source(7);
    let ids: Vec<MessageId> = on_7.keys().copied().collect();
    assert_eq!(ids, vec![MessageId::new(7, 291), MessageId::new(7, 512)]);
    assert_eq!(on_7[&MessageId::new(7, 512)].name, "BatteryStatus");

    let on_42 = registry.messages_for_source(42);
    let ids: Vec<MessageId> = on_42.keys().copied().collect();
    assert_eq!(ids, vec![MessageId::new(42, 768)]);
}

#[test]
fn unresolved_source_has_no_messages() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();

    assert!(registry.messages_for_source(1).is_empty());
    assert!(registry.lookup_message(MessageId::new(1, 291)).is_none());
}

#[test]
fn signal_names_are_sorted_and_unique() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    registry.open_content(SourceSet::from([1]), "chassis.dbc", CHASSIS_DBC).unwrap();

    assert_eq!(
        registry.signal_names(),
        vec!["BatteryVoltage", "EngineSpeed", "EngineTemp", "WheelSpeedFL"]
    );
    assert_eq!(registry.message_count(), 3);
}

#[test]
fn unbound_edit_fails_loudly() {
    let mut registry = Registry::new();
    registry.open_content(SourceSet::from([0]), "powertrain.dbc", POWERTRAIN_DBC).unwrap();
    let seen = record(&mut registry);

    let err = registry.update_message(MessageId::new(9, 291), "X", 8).unwrap_err();
    assert!(matches!(err, RegistryError::NoDefinitionFile(9)));
    assert!(take(&seen).is_empty());
}

#[test]
fn unsubscribed_handler_stops_receiving() {
    let mut registry = Registry::new();
    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);
    let id = registry.subscribe(move |_: &RegistryEvent<'_>| *counter.lock().unwrap() += 1);

    registry.open_content(SourceSet::from([0]), "a.dbc", "").unwrap();
    assert!(registry.unsubscribe(id));
    registry.open_content(SourceSet::from([1]), "b.dbc", "").unwrap();

    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(registry.subscriber_count(), 0);
}
