use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "thumbsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene to a timestamped PNG.
    Export(ExportArgs),
    /// Check a scene file without rendering it.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input scene JSON; asset keys resolve relative to this file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the PNG is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_scene_json(path: &Path) -> anyhow::Result<thumbsmith::Scene> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scene: thumbsmith::Scene =
        serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scene)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let scene = read_scene_json(&args.in_path)?;
    scene.validate()?;

    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let assets = thumbsmith::AssetStore::prepare(&scene, assets_root)?;

    let mut compositor = thumbsmith::Compositor::new();
    let gate = thumbsmith::Gate::new("export");
    let path = thumbsmith::export_scene(&mut compositor, &gate, &scene, &assets, &args.out_dir)?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let scene = read_scene_json(&args.in_path)?;
    scene.validate()?;
    eprintln!("{}: ok", args.in_path.display());
    Ok(())
}
