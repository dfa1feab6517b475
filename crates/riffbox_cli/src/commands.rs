// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subcommand handlers.
//!
//! Reports go to stdout as JSON (or a text outline); logs go to stderr.

use crate::settings::{Settings, SettingsError, SETTINGS_FILE};
use riffbox_function::validation::{check_function, check_structure};
use riffbox_function::{
    count_descendants, evaluate_number, evaluate_track, flatten, FlatEntry, FunctionEditor,
    FunctionTree, Group, NodeKind, Projection, Rejection, TreeError,
};
use riffbox_playlist::{compile as compile_tree, lower_function, Action, LoweringError, PlaylistError, PlaylistParser};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Error surfaced by a subcommand
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Input path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Input file is not the expected JSON
    #[error("{} is not valid input: {source}", path.display())]
    Json {
        /// Input path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The Function failed validation
    #[error("Function rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Tree operation failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Action list could not be interpreted
    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    /// Function could not be lowered
    #[error(transparent)]
    Lowering(#[from] LoweringError),

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// No drop position for this drag
    #[error("Cannot project '{active}' over '{over}'")]
    NoProjection {
        /// Dragged entry
        active: String,
        /// Hovered entry
        over: String,
    },

    /// Refusing to overwrite an existing file
    #[error("{} already exists, pass --force to overwrite", .0.display())]
    Exists(PathBuf),

    /// Report could not be written
    #[error("Failed to write output: {0}")]
    Output(#[source] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    statements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionReport {
    #[serde(flatten)]
    projection: Projection,
    carried: usize,
}

/// Validate a Function file
pub fn validate(path: &Path, settings: &Settings) -> Result<(), CliError> {
    let raw = read_json(path)?;
    match check_function(&raw) {
        Ok(tree) => {
            let statements = flatten(&tree).len();
            tracing::info!(path = %path.display(), statements, "function is valid");
            print_json(
                &ValidationReport {
                    valid: true,
                    statements,
                    reason: None,
                },
                settings,
            )
        }
        Err(rejection) => {
            print_json(
                &ValidationReport {
                    valid: false,
                    statements: 0,
                    reason: Some(rejection.to_string()),
                },
                settings,
            )?;
            Err(rejection.into())
        }
    }
}

/// Print the flat list of a Function, which may still have empty sockets
pub fn outline(path: &Path, json: bool, settings: &Settings) -> Result<(), CliError> {
    let tree = load_draft(path)?;
    let entries = flatten(&tree);
    if json {
        return print_json(&entries, settings);
    }
    for entry in &entries {
        println!("{}{}", "  ".repeat(entry.depth), describe(entry));
    }
    Ok(())
}

/// Project a drag of `active` over `over`, optionally applying the drop
pub fn project(
    path: &Path,
    active: &str,
    over: &str,
    offset: f32,
    apply: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let tree = load_draft(path)?;
    let mut editor = FunctionEditor::new(tree).with_indentation_width(settings.indentation_width);
    editor.begin_drag(active)?;
    editor.drag_move(Some(over), offset);
    let projection = editor.projection().ok_or_else(|| CliError::NoProjection {
        active: active.to_string(),
        over: over.to_string(),
    })?;

    if apply {
        editor.end_drag()?;
        return print_json(&editor.tree(), settings);
    }
    let carried = editor.dragged_descendants().unwrap_or(0);
    print_json(&ProjectionReport { projection, carried }, settings)
}

/// Expand a flat action list into playback steps
pub fn expand(path: &Path, settings: &Settings) -> Result<(), CliError> {
    let raw = read_json(path)?;
    let actions: Vec<Action> = serde_json::from_value(raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let sequence = PlaylistParser::parse(&actions)?;
    print_json(&sequence, settings)
}

/// Compile a Function into playback steps, or into its flat action list
pub fn compile(path: &Path, actions_only: bool, settings: &Settings) -> Result<(), CliError> {
    let raw = read_json(path)?;
    let tree = check_function(&raw)?;
    if actions_only {
        return print_json(&lower_function(&tree)?, settings);
    }
    let sequence = compile_tree(&tree)?;
    tracing::info!(path = %path.display(), steps = sequence.len(), "function compiled");
    print_json(&sequence, settings)
}

/// Write a settings file, defaulting to [`SETTINGS_FILE`]
pub fn init(path: Option<&Path>, force: bool, settings: &Settings) -> Result<(), CliError> {
    let path = path.unwrap_or_else(|| Path::new(SETTINGS_FILE));
    if path.exists() && !force {
        return Err(CliError::Exists(path.to_path_buf()));
    }
    settings.save(path)?;
    tracing::info!(path = %path.display(), "settings written");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a tree that only needs to be structurally sound
fn load_draft(path: &Path) -> Result<FunctionTree, CliError> {
    let raw = read_json(path)?;
    let items = raw.as_array().ok_or(Rejection::NotAnArray)?;
    for item in items {
        check_structure(item, Group::Actions)?;
    }
    serde_json::from_value(raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn describe(entry: &FlatEntry) -> String {
    let node = &entry.node;
    let detail = match node.kind {
        NodeKind::Play => node
            .track_expressions
            .first()
            .and_then(Option::as_ref)
            .and_then(|track| evaluate_track(track).ok())
            .unwrap_or("<empty>")
            .to_string(),
        NodeKind::Loop => {
            let count = node
                .number_expressions
                .first()
                .and_then(Option::as_ref)
                .and_then(|count| evaluate_number(count).ok())
                .map_or_else(|| "?".to_string(), |count| count.to_string());
            format!("x{count}, {} inside", count_descendants(node))
        }
        NodeKind::NumberLiteral | NodeKind::BinaryArith | NodeKind::TrackLiteral => String::new(),
    };
    format!("{} {detail} [{}]", node.kind, node.id)
}

fn print_json<T: Serialize + ?Sized>(value: &T, settings: &Settings) -> Result<(), CliError> {
    let rendered = if settings.pretty_output {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use riffbox_function::Node;

    fn write_temp(name: &str, value: &impl Serialize) -> PathBuf {
        let path = std::env::temp_dir().join(format!("riffbox-{}-{name}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_describe() {
        let tree = vec![Node::loop_block(
            Node::number_literal(3.0),
            vec![Node::play("A").with_id("p")],
        )
        .with_id("l")];
        let entries = flatten(&tree);
        assert_eq!(describe(&entries[0]), "loop x3, 1 inside [l]");
        assert_eq!(describe(&entries[1]), "play A [p]");
    }

    #[test]
    fn test_draft_accepts_empty_sockets() {
        let draft = vec![Node::create_empty(NodeKind::Play).with_id("p")];
        let path = write_temp("draft", &draft);
        let loaded = load_draft(&path).unwrap();
        assert!(matches!(
            check_function(&serde_json::to_value(&loaded).unwrap()),
            Err(Rejection::EmptySocket { .. })
        ));
        assert!(matches!(validate(&path, &Settings::default()), Err(CliError::Rejected(_))));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(load_draft(&path), Err(CliError::Read { .. })));
    }

    #[test]
    fn test_expand_rejects_bare_number() {
        let actions = vec![Action::number(2)];
        let path = write_temp("bare", &actions);
        let result = expand(&path, &Settings::default());
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CliError::Playlist(PlaylistError::UnexpectedNumber(_)))));
    }

    #[test]
    fn test_init_writes_settings() {
        let path = std::env::temp_dir().join(format!("riffbox-init-{}.ron", std::process::id()));
        let settings = Settings {
            indentation_width: 32.0,
            ..Settings::default()
        };
        init(Some(&path), false, &settings).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        assert!(matches!(
            init(Some(&path), false, &Settings::default()),
            Err(CliError::Exists(_))
        ));
        init(Some(&path), true, &Settings::default()).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_project_unknown_target() {
        let tree = vec![Node::play("A").with_id("a")];
        let path = write_temp("project", &tree);
        let result = project(&path, "a", "zzz", 0.0, false, &Settings::default());
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CliError::NoProjection { .. })));
    }
}
