//! Integration tests for observable presentation objects
//!
//! Covers the full load flow:
//! - Reading a saved document into language units
//! - Error ledger contents and notifications raised while loading
//! - Config-driven behavior loaded from a toml file

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;
use viewbind::cli::check::{load_units, UnitReport};
use viewbind::models::{ChangeEvent, Channel, FnObserver};
use viewbind::parser::{child_string_or_empty, child_value};
use viewbind::{BindingConfig, LanguageType, LanguageUnit, Node, ObservableObject};

const BOOK: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Book>
    <Chapter Id="3f2b8c1e-4a5d-4e6f-9a7b-1c2d3e4f5a6b">
        <Name>Intro</Name>
        <Length>12</Length>
    </Chapter>
    <Paragraph>
        <Name></Name>
    </Paragraph>
    <Word Id="not-a-uuid">
        <Name>fish</Name>
        <Length>4.5</Length>
    </Word>
</Book>
"#;

#[test]
fn test_load_book() {
    let units = load_units(BOOK, &BindingConfig::default()).unwrap();
    let reports: Vec<UnitReport> = units.iter().map(UnitReport::from_unit).collect();

    assert_eq!(reports.len(), 3);

    assert_eq!(reports[0].id, "3f2b8c1e-4a5d-4e6f-9a7b-1c2d3e4f5a6b");
    assert_eq!(reports[0].name, "Intro");
    assert_eq!(reports[0].length, 12);
    assert!(!reports[0].has_error());

    assert_eq!(units[1].language_type(), LanguageType::Paragraph);
    assert_eq!(reports[1].error_fields, vec!["Length", "Name"]);

    assert_eq!(reports[2].name, "fish");
    assert_eq!(reports[2].length, 0);
    assert_eq!(reports[2].error_fields, vec!["Length"]);
}

#[test]
fn test_error_notifications_during_extraction() {
    let node = Node::parse("<Chapter><Name></Name></Chapter>").unwrap();
    let mut owner = ObservableObject::new();

    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    owner.subscribe(
        Channel::ErrorExists,
        Rc::new(FnObserver(move |event: &ChangeEvent| {
            sink.borrow_mut().push(event.name.clone())
        })),
    );

    let name = child_string_or_empty(&node, "Name", &mut owner, true);
    let length = child_value(&node, "Length", &mut owner, 0i32);

    assert_eq!(name, "");
    assert_eq!(length, 0);
    assert!(owner.has_error());
    assert_eq!(*errors.borrow(), vec!["Name".to_string(), "Length".to_string()]);

    owner.set_error_state("Name", false);
    owner.set_error_state("Length", false);
    assert!(!owner.has_error());
}

#[test]
fn test_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("conf/viewbind.toml");

    let config = BindingConfig {
        track_changes: false,
        trim_scalar_text: false,
    };
    config.save(&path).unwrap();
    let loaded = BindingConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let node = Node::parse("<Word><Name>a</Name><Length> 2 </Length></Word>").unwrap();
    let mut unit = LanguageUnit::from_node_with_config(&node, &loaded);
    assert_eq!(unit.length(), 0);
    assert!(unit.base().has_field_error("Length"));

    unit.set_length(2);
    assert!(!unit.base().is_changed());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = BindingConfig::load(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, BindingConfig::default());

    fs::write(temp_dir.path().join("bad.toml"), "trim_scalar_text = 3").unwrap();
    assert!(BindingConfig::load(&temp_dir.path().join("bad.toml")).is_err());
}
