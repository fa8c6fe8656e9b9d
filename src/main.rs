mod cli;

use crate::cli::{BatchArgs, Cli, Commands, ConfigArgs, ConvertArgs, RenderArgs, SceneArgs};
use clap::Parser;
use crystal_render::io::{load_structure, save_structure};
use crystal_render::model::MoyoReducer;
use crystal_render::physics::cell::transform_unit_cell;
use crystal_render::physics::orientation::direction_to_rotation;
use crystal_render::render::{render_batch, render_structure, RenderJob};
use crystal_render::rendering::scene::rotate_scene;
use crystal_render::rendering::{render_scene_png, Legend, Scene};
use crystal_render::utils::logger;
use crystal_render::{Config, Result};
use std::fs;
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    log::debug!("Full CLI arguments parsed: {:?}", &cli);

    match cli.command {
        Commands::Render(args) => run_render(args, config),
        Commands::Scene(args) => run_scene(args, config),
        Commands::Batch(args) => run_batch(args, config),
        Commands::Convert(args) => run_convert(args),
        Commands::Config(args) => run_config(args, cli.config.as_deref()),
    }
}

fn run_render(args: RenderArgs, mut config: Config) -> Result<()> {
    args.style.apply(&mut config);
    render_structure(
        &args.structure,
        &args.out,
        &config.cell,
        &config.bonding,
        &config.style,
        &config.orientation,
        &config.labels,
        &config.render,
    )?;
    println!("{}", args.out.display());
    Ok(())
}

fn run_scene(args: SceneArgs, config: Config) -> Result<()> {
    let scene: Scene = serde_json::from_str(&fs::read_to_string(&args.scene)?)?;
    let structure = args.lattice_from.as_ref().map(|p| load_structure(p)).transpose()?;

    let scene = match args.view {
        Some(direction) => {
            let lattice = structure.as_ref().map(|s| &s.lattice);
            let rotation = direction_to_rotation(direction, lattice, [0.0, 0.0, 1.0])?;
            rotate_scene(&scene, &rotation)
        }
        None => scene,
    };

    let legend = structure
        .as_ref()
        .map(|s| Legend::from_structure(s, config.style.colors));
    let size = (
        args.width.unwrap_or(config.render.width),
        args.height.unwrap_or(config.render.height),
    );
    let background = args.background.unwrap_or(config.render.background);

    let result = render_scene_png(&scene, legend.as_ref(), size, background, args.legend)?;
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.out, &result.image_bytes)?;
    log::info!(
        "Scene '{}' written to {}",
        scene.name.as_deref().unwrap_or("unnamed"),
        args.out.display()
    );
    println!("{}", args.out.display());
    Ok(())
}

fn run_batch(args: BatchArgs, mut config: Config) -> Result<()> {
    args.style.apply(&mut config);
    fs::create_dir_all(&args.out_dir)?;

    let jobs: Vec<RenderJob> = args
        .inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "structure".to_string());
            RenderJob {
                structure_path: input.clone(),
                output_path: args.out_dir.join(format!("{}.png", stem)),
            }
        })
        .collect();

    log::info!("Rendering {} structures", jobs.len());
    let results = render_batch(
        &jobs,
        &config.cell,
        &config.bonding,
        &config.style,
        &config.orientation,
        &config.labels,
        &config.render,
    );

    let mut failed = None;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                log::error!("{}: {}", job.structure_path.display(), e);
                failed.get_or_insert(e);
            }
        }
    }
    // Report the first failure once every job has had its chance
    match failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let structure = load_structure(&args.input)?;
    let structure = match args.cell {
        Some(mode) => transform_unit_cell(&structure, mode, &MoyoReducer::default())?,
        None => structure,
    };
    save_structure(&args.out, &structure)?;
    log::info!("Converted {} → {}", args.input.display(), args.out.display());
    Ok(())
}

fn run_config(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(Config::path);
    if args.save_defaults {
        Config::default().save_to(&path)?;
    }
    println!("{}", path.display());
    Ok(())
}
