//! Level loading tests — RON fixtures, compiled scripts and load errors.

use scripted_events::core::evaluator::{Interactable, Trigger};
use scripted_events::schema::action::ActionKind;
use scripted_events::schema::condition::Condition;
use scripted_events::schema::level::{LevelData, LevelError, LevelRegistry};
use scripted_events::schema::value::Value;
use std::path::Path;

fn load(name: &str) -> LevelData {
    LevelData::load_from_ron(&Path::new("tests/fixtures").join(name)).unwrap()
}

#[test]
fn manor_fixture_compiles() {
    let manor = load("manor.ron");
    assert_eq!(manor.name, "manor");
    assert_eq!(manor.config().music.as_deref(), Some("music/manor.ogg"));
    assert!(!manor.config().darkness);

    let triggers: Vec<Trigger> = manor.triggers.iter().map(Trigger::from_def).collect();
    let portrait = triggers.iter().find(|t| t.id == "portrait").unwrap();
    assert_eq!(portrait.script.condition, Condition::IfFlag);
    assert_eq!(portrait.script.action, Some(ActionKind::ShowDialogue));
    assert_eq!(portrait.script.params.get_str("condition"), Some("AND"));
    assert_eq!(portrait.script.params.get("value"), Some(&Value::Bool(true)));

    let stairs = triggers.iter().find(|t| t.id == "stairs").unwrap();
    assert_eq!(stairs.script.action, None);
    let steps: Vec<ActionKind> = stairs.script.steps.iter().map(|s| s.action).collect();
    assert_eq!(
        steps,
        vec![
            ActionKind::ShowNote,
            ActionKind::ChangeLevel,
            ActionKind::Wait,
            ActionKind::SetFlag
        ]
    );
}

#[test]
fn interactable_durations() {
    let manor = load("manor.ron");
    let objs: Vec<Interactable> = manor.interactables.iter().map(Interactable::from_def).collect();

    let diary = objs.iter().find(|o| o.id == "diary").unwrap();
    assert_eq!(diary.progress.duration(), 30);

    // contact-condition interactables fire on the first frame
    let panel = objs.iter().find(|o| o.id == "secret_panel").unwrap();
    assert_eq!(panel.progress.duration(), 1);
    assert!(panel.progress.is_hidden());

    let cellar = load("cellar.ron");
    let key = Interactable::from_def(&cellar.interactables[0]);
    assert_eq!(key.script.condition, Condition::None);
    assert_eq!(key.progress.duration(), 5);
}

#[test]
fn registry_merge_replaces_by_name() {
    let mut registry = LevelRegistry::new();
    registry.insert(load("manor.ron"));
    registry.insert(load("cellar.ron"));

    let mut patch = LevelRegistry::new();
    patch.insert(LevelData::parse_ron(r#"Level(name: "cellar", darkness: false)"#).unwrap());
    registry.merge(patch);

    assert_eq!(registry.len(), 2);
    assert!(registry.get("cellar").unwrap().triggers.is_empty());
    assert_eq!(registry.config("cellar").map(|c| c.darkness), Some(false));
}

#[test]
fn duplicate_ids_are_rejected() {
    let input = r#"Level(
        name: "broken",
        triggers: [(id: "door", action: "ShowNote")],
        interactables: [(id: "door", action: "SetFlag")],
    )"#;
    assert!(matches!(
        LevelData::parse_ron(input),
        Err(LevelError::DuplicateId { .. })
    ));
}

#[test]
fn missing_file_is_io_error() {
    let result = LevelData::load_from_ron(Path::new("tests/fixtures/attic.ron"));
    assert!(matches!(result, Err(LevelError::Io(_))));
}

#[test]
fn malformed_ron_is_reported() {
    assert!(matches!(
        LevelData::parse_ron("Level(name: )"),
        Err(LevelError::Ron(_))
    ));
}
