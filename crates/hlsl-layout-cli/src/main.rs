#![forbid(unsafe_code)]

// Native-only debugging driver. Keep a stub `main` so `--target wasm32-unknown-unknown --workspace`
// builds still succeed.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use clap::{Parser, ValueEnum};
    use hlsl_layout_resolve::{
        flatten_counters, resolve_unit, Decoration, EntryPoint, RecordingSink, ResolverOptions,
        ResourceVar, UnitLayout,
    };
    use serde::{Deserialize, Serialize};
    use tracing_subscriber::EnvFilter;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum Format {
        Text,
        Json,
    }

    #[derive(Debug, Parser)]
    #[command(about = "Resolve descriptor bindings and interface locations of a compilation unit")]
    pub struct Args {
        /// JSON compilation unit: `{ "options": ..., "resources": [...], "entry_points": [...] }`.
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Also print the decoration stream in emission order.
        #[arg(long)]
        decorations: bool,

        /// Log filter, e.g. `hlsl_layout_resolve=debug`. Falls back to `RUST_LOG`.
        #[arg(long)]
        log: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Unit {
        #[serde(default)]
        pub options: ResolverOptions,
        #[serde(default)]
        pub resources: Vec<ResourceVar>,
        #[serde(default)]
        pub entry_points: Vec<EntryPoint>,
    }

    #[derive(Serialize)]
    struct JsonReport<'a> {
        layout: &'a UnitLayout,
        #[serde(skip_serializing_if = "Option::is_none")]
        decorations: Option<&'a [Decoration]>,
    }

    pub fn load_unit(path: &Path) -> Result<Unit> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut unit: Unit = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse compilation unit {}", path.display()))?;
        unit.resources = flatten_counters(std::mem::take(&mut unit.resources));
        Ok(unit)
    }

    pub fn resolve(unit: &Unit) -> Result<(UnitLayout, RecordingSink)> {
        let mut sink = RecordingSink::new();
        let layout = resolve_unit(
            unit.options.clone(),
            &unit.resources,
            &unit.entry_points,
            &mut sink,
        )?;
        Ok((layout, sink))
    }

    pub fn render_text(unit: &Unit, layout: &UnitLayout) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "resources:");
        for (id, b) in layout.resources.layout.iter() {
            let name = unit
                .resources
                .iter()
                .find(|r| r.id == id)
                .map_or("?", |r| r.name.as_str());
            let _ = writeln!(out, "  {name}: set {} binding {}", b.set, b.binding);
        }

        for (entry, stage) in unit.entry_points.iter().zip(&layout.pipeline.stages) {
            let _ = writeln!(out, "entry point {} ({:?}):", entry.name, entry.stage);
            for var in &entry.vars {
                let Some(l) = stage.get(var.id) else {
                    continue;
                };
                let _ = write!(
                    out,
                    "  {} {}: location {}",
                    var.direction(),
                    var.name,
                    l.location
                );
                if l.component != 0 {
                    let _ = write!(out, " component {}", l.component);
                }
                if let Some(index) = l.index {
                    let _ = write!(out, " index {index}");
                }
                out.push('\n');
            }
        }
        out
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();

        let filter = match &args.log {
            Some(directives) => EnvFilter::try_new(directives)
                .with_context(|| format!("invalid --log filter {directives:?}"))?,
            None => EnvFilter::from_default_env(),
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();

        let unit = load_unit(&args.input)?;
        let (layout, sink) = resolve(&unit)?;

        for diagnostic in layout
            .resources
            .diagnostics
            .iter()
            .chain(&layout.pipeline.diagnostics)
        {
            eprintln!("warning: {diagnostic}");
        }

        match args.format {
            Format::Text => {
                print!("{}", render_text(&unit, &layout));
                if args.decorations {
                    println!("decorations:");
                    for d in &sink.decorations {
                        println!("  {}", serde_json::to_string(d)?);
                    }
                }
            }
            Format::Json => {
                let report = JsonReport {
                    layout: &layout,
                    decorations: args.decorations.then_some(sink.decorations.as_slice()),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
