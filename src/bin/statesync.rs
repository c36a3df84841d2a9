//! State Sync command-line runner
//!
//! Loads a graph document, runs one operation on it, and writes the result:
//! - `build`: generate the remote sync subgraph described by a request
//! - `clear`: remove every node whose name starts with a prefix
//! - `inspect`: print the layer's states, resolved codes and structural hash
//!
//! ## Configuration
//!
//! Environment variables:
//! - `STATESYNC_DOCUMENT`: path of the document JSON (required)
//! - `STATESYNC_REQUEST`: path of the request JSON (required for `build`)
//! - `STATESYNC_OUTPUT`: where to write the document (default: overwrite the input)
//! - `STATESYNC_COMMAND`: `build`, `clear` or `inspect` (default: build)
//! - `STATESYNC_CLEAR_PREFIX`: prefix for `clear` and for skipping clones in `inspect` (default: Remote_)
//! - `STATESYNC_LAYER`: layer for `clear` and `inspect` (default: 0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! STATESYNC_DOCUMENT=avatar.json STATESYNC_REQUEST=sync.json cargo run --bin statesync
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use statesync_kernel::builder::request::DEFAULT_CLONE_PREFIX;
use statesync_kernel::{
    clear_layer, resolve_assignments, structural_hash, traversal, DocumentDriverSink, GraphDocument,
    MarkerNames, MarkerSet, SyncBuilder, SyncRequest, STATESYNC_SCHEMA_VERSION,
};

type BoxError = Box<dyn std::error::Error>;

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "statesync=info,statesync_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Operation selected by `STATESYNC_COMMAND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Build,
    Clear,
    Inspect,
}

impl Command {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "build" => Some(Self::Build),
            "clear" => Some(Self::Clear),
            "inspect" => Some(Self::Inspect),
            _ => None,
        }
    }
}

fn required_path(var: &str) -> Result<PathBuf, BoxError> {
    match std::env::var(var) {
        Ok(s) if !s.is_empty() => Ok(PathBuf::from(s)),
        _ => {
            tracing::error!(variable = var, "required environment variable not set");
            Err(format!("{var} must be set").into())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, BoxError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_document(doc: &GraphDocument, input: &PathBuf) -> Result<(), BoxError> {
    let output = std::env::var("STATESYNC_OUTPUT")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| input.clone());
    std::fs::write(&output, serde_json::to_string_pretty(doc)?)?;
    info!(path = %output.display(), "document written");
    Ok(())
}

fn inspect(doc: &GraphDocument, layer: usize, exclude_prefix: &str) -> Result<serde_json::Value, BoxError> {
    let root = doc.layer_root(layer)?;
    let markers = MarkerSet::resolve(doc, root, &MarkerNames::default());
    let assignment = resolve_assignments(doc, root, &BTreeMap::new(), &markers, exclude_prefix);

    let states: Vec<_> = traversal::enumerate(doc, root)
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "path": e.path,
                "node": e.node,
                "code": assignment.table.code_of(e.node),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "schema_version": STATESYNC_SCHEMA_VERSION,
        "layer": layer,
        "structural_hash": format!("{:016x}", structural_hash(doc, root)),
        "states": states,
        "collisions": assignment.describe_collisions(doc),
    }))
}

fn main() -> Result<(), BoxError> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, schema_version = STATESYNC_SCHEMA_VERSION, "Starting statesync");

    let command_name = std::env::var("STATESYNC_COMMAND").unwrap_or_else(|_| "build".to_string());
    let command = Command::from_str(&command_name).ok_or_else(|| {
        tracing::error!(command = %command_name, "unknown command");
        format!("unknown command '{command_name}' (expected build, clear or inspect)")
    })?;

    let prefix = std::env::var("STATESYNC_CLEAR_PREFIX").unwrap_or_else(|_| DEFAULT_CLONE_PREFIX.to_string());
    let layer: usize = std::env::var("STATESYNC_LAYER")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let document_path = required_path("STATESYNC_DOCUMENT")?;
    let mut doc: GraphDocument = read_json(&document_path)?;
    info!(
        path = %document_path.display(),
        nodes = doc.node_count(),
        graphs = doc.graph_count(),
        "document loaded"
    );

    match command {
        Command::Build => {
            let request: SyncRequest = read_json(&required_path("STATESYNC_REQUEST")?)?;
            let mut builder = SyncBuilder::new(DocumentDriverSink::new());
            let report = builder.build(&mut doc, &request)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.committed {
                write_document(&doc, &document_path)?;
            }
        }
        Command::Clear => {
            let removed = clear_layer(&mut doc, layer, &prefix)?;
            println!("{}", serde_json::json!({ "layer": layer, "prefix": prefix, "removed": removed }));
            write_document(&doc, &document_path)?;
        }
        Command::Inspect => {
            println!("{}", serde_json::to_string_pretty(&inspect(&doc, layer, &prefix)?)?);
        }
    }

    Ok(())
}
