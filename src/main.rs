//! Replays a JSON script of diagram operations and prints the resulting snapshot.
//!
//! Usage:
//!   eddy script.json --pretty
//!   eddy --print-config > eddy.toml
//!
//! A script is an array of steps, e.g.
//!   [{"op": "add_node", "kind": "concept", "pos": {"x": 0, "y": 0}},
//!    {"op": "press", "pos": {"x": 0, "y": 0}},
//!    {"op": "release", "pos": {"x": 50, "y": 20}}]

use anyhow::{Context, Result};
use clap::Parser;
use eddy::{
    Clipboard, Diagram, DiagramConfig, DiagramError, DiagramMode, EdgeKind, KeyEvent, NodeKind,
    Point, PointerEvent,
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "eddy")]
#[command(about = "Replay Graphol diagram interactions and print the resulting diagram")]
struct Args {
    /// JSON file holding the steps to replay
    #[arg(required_unless_present = "print_config")]
    script: Option<PathBuf>,

    /// Configuration file (default: ./eddy.toml when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Pretty-print the snapshot
    #[arg(long)]
    pretty: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    AddNode {
        kind: NodeKind,
        pos: Point,
        #[serde(default)]
        text: Option<String>,
    },
    AddEdge {
        kind: EdgeKind,
        source: String,
        target: String,
    },
    NodeMode {
        kind: NodeKind,
    },
    EdgeMode {
        kind: EdgeKind,
    },
    Press(PointerEvent),
    Move(PointerEvent),
    Release(PointerEvent),
    DoubleClick(PointerEvent),
    Key(KeyEvent),
    FocusOut,
    Select {
        ids: Vec<String>,
    },
    MoveNodes {
        ids: Vec<String>,
        delta: Point,
    },
    Remove {
        ids: Vec<String>,
    },
    Breakpoint {
        edge: String,
        pos: Point,
    },
    Label {
        node: String,
        text: String,
    },
    Swap {
        edge: String,
    },
    Switch {
        node: String,
        kind: NodeKind,
    },
    Copy,
    Cut,
    Paste {
        #[serde(default)]
        pos: Option<Point>,
    },
    Undo,
    Redo,
    Reset,
}

fn apply(diagram: &mut Diagram, clipboard: &mut Clipboard, step: Step) -> Result<(), DiagramError> {
    match step {
        Step::AddNode { kind, pos, text } => {
            let id = diagram.add_node(kind, pos)?;
            if let Some(text) = text {
                diagram.set_label_text(&id, &text)?;
            }
        }
        Step::AddEdge { kind, source, target } => {
            if diagram.add_edge(kind, &source, &target)?.is_none() {
                warn!(%source, %target, "edge not added");
            }
        }
        Step::NodeMode { kind } => diagram.set_mode(DiagramMode::NodeAdd(kind)),
        Step::EdgeMode { kind } => diagram.set_mode(DiagramMode::EdgeAdd { kind, pending: None }),
        Step::Press(event) => diagram.mouse_press(event)?,
        Step::Move(event) => diagram.mouse_move(event),
        Step::Release(event) => diagram.mouse_release(event),
        Step::DoubleClick(event) => diagram.mouse_double_click(event),
        Step::Key(event) => diagram.key_press(event)?,
        Step::FocusOut => diagram.focus_out(),
        Step::Select { ids } => {
            diagram.clear_selection();
            for id in &ids {
                diagram.select(id)?;
            }
        }
        Step::MoveNodes { ids, delta } => diagram.move_nodes(ids.as_slice(), delta)?,
        Step::Remove { ids } => diagram.remove_items(ids.as_slice())?,
        Step::Breakpoint { edge, pos } => {
            diagram.insert_breakpoint(&edge, pos)?;
        }
        Step::Label { node, text } => diagram.set_label_text(&node, &text)?,
        Step::Swap { edge } => {
            diagram.swap_edge(&edge)?;
        }
        Step::Switch { node, kind } => diagram.switch_node_kind(&node, kind)?,
        Step::Copy => clipboard.capture(diagram),
        Step::Cut => clipboard.cut(diagram)?,
        Step::Paste { pos } => {
            clipboard.paste(diagram, pos)?;
        }
        Step::Undo => {
            diagram.undo();
        }
        Step::Redo => {
            diagram.redo();
        }
        Step::Reset => diagram.reset_mode(),
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.print_config {
        print!("{}", DiagramConfig::default_config_string());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => DiagramConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DiagramConfig::load().context("Failed to load configuration")?,
    };
    let script = args.script.context("No script given")?;
    let content = std::fs::read_to_string(&script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", script.display()))?;

    let mut diagram = Diagram::with_config(config);
    let mut clipboard = Clipboard::new();
    let count = steps.len();
    for (index, step) in steps.into_iter().enumerate() {
        apply(&mut diagram, &mut clipboard, step).with_context(|| format!("Step {index} failed"))?;
    }
    info!(
        steps = count,
        nodes = diagram.nodes().count(),
        edges = diagram.edges().count(),
        "replayed script"
    );

    let snapshot = diagram.snapshot();
    let output = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{output}");
    Ok(())
}
