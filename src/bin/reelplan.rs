use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use reelplan::{
    AssetHandle, AssetResolver, AudioStream, MediaEngine, ReelplanResult, Script, TaskQueue,
    VideoStream, asset::path_to_uri, compile_script,
};

#[derive(Parser, Debug)]
#[command(name = "reelplan", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a script into a timeline plan (dry run, no media decoding).
    Plan(PlanArgs),
    /// List declared inputs and their derived source URIs.
    Inputs(InputsArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output plan JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print the plan JSON.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct InputsArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Inputs(args) => cmd_inputs(args),
    }
}

fn read_script_json(path: &Path) -> anyhow::Result<Script> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let r = BufReader::new(f);
    let script: Script = serde_json::from_reader(r).with_context(|| "parse script JSON")?;
    Ok(script)
}

/// Planning engine for dry runs: no decoding happens, asset metadata comes
/// from optional `width`/`height`/`fps`/`format` props on each `input`
/// directive (1920x1080@30 when absent).
#[derive(Default)]
struct DryRunEngine {
    metadata: BTreeMap<String, AssetHandle>,
    requested: RefCell<Vec<String>>,
}

impl DryRunEngine {
    fn from_script(script: &Script) -> anyhow::Result<Self> {
        let mut metadata = BTreeMap::new();
        for input in script.all("input") {
            let Some(path) = input.prop("path") else {
                continue; // the resolver reports the missing path
            };
            let uri = path_to_uri(path).with_context(|| "derive input URI")?;
            let dim = |name: &str, default: u32| -> anyhow::Result<u32> {
                match input.prop(name) {
                    None => Ok(default),
                    Some(raw) => raw
                        .parse::<u32>()
                        .with_context(|| format!("input prop '{name}': '{raw}'")),
                }
            };
            let handle = AssetHandle {
                uri: uri.clone(),
                video: VideoStream {
                    width: dim("width", 1920)?,
                    height: dim("height", 1080)?,
                    frame_rate: dim("fps", 30)?,
                    format: input.prop("format").unwrap_or("video/x-raw").to_string(),
                },
                audio: AudioStream {
                    format: "audio/x-raw".to_string(),
                },
            };
            metadata.insert(uri, handle);
        }
        Ok(Self {
            metadata,
            requested: RefCell::new(Vec::new()),
        })
    }
}

impl MediaEngine for DryRunEngine {
    fn create_asset(&mut self, uri: &str) -> ReelplanResult<()> {
        self.requested.borrow_mut().push(uri.to_string());
        Ok(())
    }

    fn get_asset(&self, uri: &str) -> Option<AssetHandle> {
        self.metadata.get(uri).cloned()
    }
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let script = Rc::new(read_script_json(&args.in_path)?);
    let queue = TaskQueue::new();
    let engine = DryRunEngine::from_script(&script)?;
    let resolver = Rc::new(RefCell::new(AssetResolver::new(engine, queue.clone())));

    let plan = compile_script(queue.clone(), &resolver, Rc::clone(&script));
    queue.run_until_idle();

    // Deliver the dry-run "load completions" the engine would emit.
    let requested = resolver.borrow().engine().requested.borrow().clone();
    for uri in requested {
        let known = resolver.borrow().engine().metadata.get(&uri).cloned();
        match known {
            Some(handle) => resolver.borrow_mut().asset_added(&uri, handle),
            None => resolver
                .borrow_mut()
                .asset_load_error(&uri, "no metadata for input"),
        }
    }
    queue.run_until_idle();

    let plan = plan.result().with_context(|| "compile timeline plan")?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string(&plan)?
    };

    match args.out {
        Some(out) => std::fs::write(&out, json)
            .with_context(|| format!("write plan '{}'", out.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_inputs(args: InputsArgs) -> anyhow::Result<()> {
    let script = read_script_json(&args.in_path)?;
    for input in script.all("input") {
        let name = input.param(0).unwrap_or("<unnamed>");
        match input.prop("path") {
            Some(path) => println!("{name}\t{}", path_to_uri(path)?),
            None => println!("{name}\t<missing path>"),
        }
    }
    Ok(())
}
