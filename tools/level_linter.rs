//! Level Linter — validates level files before they ship.
//!
//! Usage: level_linter <level_dir_or_file>

use scripted_events::core::params::Params;
use scripted_events::schema::action::ActionKind;
use scripted_events::schema::condition::{Condition, FlagOperator};
use scripted_events::schema::level::{LevelData, LevelRegistry, StepDef, Zone};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: level_linter <level_dir_or_file>");
        process::exit(0);
    }

    let level_path = Path::new(&args[1]);
    let mut registry = LevelRegistry::new();
    let mut errors = Vec::new();

    if level_path.is_file() {
        load_level(level_path, &mut registry, &mut errors);
    } else if level_path.is_dir() {
        load_levels_recursive(level_path, &mut registry, &mut errors);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!("Loaded {} levels", registry.len());

    let warnings = lint_levels(&registry, &mut errors);

    println!("\n=== Level Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_level(path: &Path, registry: &mut LevelRegistry, errors: &mut Vec<String>) {
    match LevelData::load_from_ron(path) {
        Ok(level) => {
            println!("  Loaded: {}", path.display());
            registry.insert(level);
        }
        Err(e) => errors.push(format!("{}: {}", path.display(), e)),
    }
}

fn load_levels_recursive(dir: &Path, registry: &mut LevelRegistry, errors: &mut Vec<String>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_levels_recursive(&path, registry, errors);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                load_level(&path, registry, errors);
            }
        }
    }
}

/// Params each action cannot do without. Alternatives are `|`-separated.
fn required_params(kind: ActionKind) -> &'static [&'static str] {
    match kind {
        ActionKind::SetFlag | ActionKind::IncrementFlag => &["flag"],
        ActionKind::Teleport => &["x", "y"],
        ActionKind::PlaySound => &["sound"],
        ActionKind::UnhideObject | ActionKind::HideObject => &["id"],
        ActionKind::ChangeLevel => &["level", "json", "zone"],
        ActionKind::ChangeMusic => &["path|music"],
        ActionKind::ShowAnimation => &["path"],
        ActionKind::RandomAction => &["actions"],
        _ => &[],
    }
}

/// Returns warnings; errors are appended to `errors`.
fn lint_levels(registry: &LevelRegistry, errors: &mut Vec<String>) -> Vec<String> {
    let mut warnings = Vec::new();

    let mut names: Vec<&str> = registry.names().collect();
    names.sort_unstable();

    for name in names {
        let Some(level) = registry.get(name) else {
            continue;
        };

        for trigger in &level.triggers {
            let owner = format!("{}/{}", name, trigger.id);
            let condition = lint_condition(&owner, &trigger.condition, &mut warnings);
            if condition == Some(Condition::IfFlag) {
                lint_if_flag(&owner, &trigger.params, errors);
            }
            lint_object(
                &owner,
                &trigger.action,
                &trigger.params,
                &trigger.scripted_events,
                registry,
                errors,
                &mut warnings,
            );
        }

        for obj in &level.interactables {
            let owner = format!("{}/{}", name, obj.id);
            match lint_condition(&owner, &obj.condition, &mut warnings) {
                Some(Condition::AutoStart | Condition::IfFlag) => warnings.push(format!(
                    "Interactable '{}' uses condition '{}', which never makes contact",
                    owner, obj.condition
                )),
                _ => {}
            }
            if obj.duration == 0 {
                warnings.push(format!("Interactable '{}' has zero duration", owner));
            }
            lint_object(
                &owner,
                &obj.action,
                &obj.params,
                &obj.scripted_events,
                registry,
                errors,
                &mut warnings,
            );
        }
    }

    warnings
}

fn lint_condition(owner: &str, keyword: &str, warnings: &mut Vec<String>) -> Option<Condition> {
    let condition = Condition::from_keyword(keyword);
    if condition.is_none() {
        warnings.push(format!("'{}' has unknown condition '{}'", owner, keyword));
    }
    condition
}

fn lint_if_flag(owner: &str, raw: &str, errors: &mut Vec<String>) {
    let params = Params::parse(Some(raw));
    let compound = params.contains_key("flag_a") && params.contains_key("flag_b");
    if !compound && !params.contains_key("flag") {
        errors.push(format!("'{}' is IfFlag but names no flag", owner));
    }
    if compound {
        if let Some(op) = params.get_text("condition") {
            if FlagOperator::from_keyword(&op).is_none() {
                errors.push(format!("'{}' has unknown IfFlag operator '{}'", owner, op));
            }
        }
    }
}

fn lint_object(
    owner: &str,
    action: &str,
    params: &str,
    steps: &[StepDef],
    registry: &LevelRegistry,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if action != "None" && !action.is_empty() {
        lint_action(owner, action, params, registry, errors);
    } else if steps.is_empty() {
        warnings.push(format!("'{}' has neither an action nor a sequence", owner));
    }

    for (i, step) in steps.iter().enumerate() {
        let step_owner = format!("{} step {}", owner, i + 1);
        lint_action(&step_owner, &step.action, &step.params, registry, errors);
    }
}

fn lint_action(
    owner: &str,
    keyword: &str,
    raw: &str,
    registry: &LevelRegistry,
    errors: &mut Vec<String>,
) {
    let Some(kind) = ActionKind::from_keyword(keyword) else {
        errors.push(format!("'{}' has unknown action '{}'", owner, keyword));
        return;
    };
    let params = Params::parse(Some(raw));

    for required in required_params(kind) {
        if !required.split('|').any(|key| params.contains_key(key)) {
            errors.push(format!(
                "'{}' action {} is missing param '{}'",
                owner, keyword, required
            ));
        }
    }

    // Teleport zone=None keeps the current zone
    if let Some(zone) = params.get_text("zone") {
        let stays = kind == ActionKind::Teleport && zone == "None";
        if !stays && Zone::parse(&zone).is_none() {
            errors.push(format!("'{}' has unparseable zone '{}'", owner, zone));
        }
    }

    if kind == ActionKind::ChangeLevel {
        if let Some(level) = params.get_text("level") {
            if !registry.contains(&level) {
                errors.push(format!(
                    "'{}' changes to unknown level '{}'",
                    owner, level
                ));
            }
        }
    }

    if kind == ActionKind::RandomAction {
        for choice in params.get_text("actions").unwrap_or_default().split('|') {
            match ActionKind::from_keyword(choice.trim()) {
                None => errors.push(format!(
                    "'{}' RandomAction has unknown choice '{}'",
                    owner, choice
                )),
                Some(ActionKind::Wait | ActionKind::RandomAction) => errors.push(format!(
                    "'{}' RandomAction cannot pick '{}'",
                    owner, choice
                )),
                Some(_) => {}
            }
        }
    }
}
