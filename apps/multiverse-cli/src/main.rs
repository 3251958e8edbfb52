mod sandbox;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use multiverse_common::{DVec3, DimensionId, EngineConfig};
use multiverse_kernel::{ProviderKind, WorldLifecycleContext};
use multiverse_persist::PersistenceBridge;
use multiverse_tools::LifecycleInspector;
use multiverse_transition::{ActorState, JoinRequest, TransitionCoordinator, TransitionRequest};
use tracing_subscriber::EnvFilter;

use sandbox::{ConsoleSink, LoggingCatalog, SandboxHost, SandboxWorld};

#[derive(Parser)]
#[command(name = "multiverse-cli", about = "CLI tool for multiverse operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON engine config; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the built-in dimension table
    Info,
    /// Show the dimension id map saved in a world directory
    Inspect {
        /// Surface world save directory
        dir: PathBuf,
    },
    /// Register a new dimension in a world directory and save its id
    Alloc {
        /// Surface world save directory
        dir: PathBuf,
        /// Provider type name, e.g. MiningWorldProvider
        #[arg(short, long)]
        kind: String,
        /// Provider type id to register the kind under
        #[arg(short, long, default_value = "2")]
        provider: i32,
        /// Keep the dimension's spawn area loaded
        #[arg(long)]
        keep_loaded: bool,
    },
    /// Register a mining dimension, walk an actor through it, save and reload
    Demo {
        /// Save directory to use instead of a temporary one
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("multiverse-cli v{}", env!("CARGO_PKG_VERSION"));
            let ctx: WorldLifecycleContext<SandboxWorld> =
                WorldLifecycleContext::new(config.clone(), Box::new(LoggingCatalog));
            println!("{}", LifecycleInspector::summary(&ctx));
            for info in LifecycleInspector::list_dimensions(&ctx) {
                println!("  {info}");
            }
            println!(
                "side channel: {}.dat under {}/Forge/DimensionData",
                config.side_channel_name, config.ecosystem_name
            );
        }
        Commands::Inspect { dir } => {
            let bridge = PersistenceBridge::from_config(&config);
            let ctx = open_context(&config, &dir);
            let store = bridge
                .store_for(&ctx)
                .context("surface world has no save directory")?;
            let root = store
                .load()
                .with_context(|| format!("reading {}", store.current_path().display()))?;
            let saved = match &root {
                Some(root) => LifecycleInspector::saved_ids(&bridge, root)?,
                None => None,
            };
            match saved {
                Some(saved) => println!("{saved}"),
                None => println!("No saved dimension id map in {}", dir.display()),
            }
        }
        Commands::Alloc {
            dir,
            kind,
            provider,
            keep_loaded,
        } => {
            let bridge = PersistenceBridge::from_config(&config);
            let mut ctx = open_context(&config, &dir);
            let store = bridge
                .store_for(&ctx)
                .context("surface world has no save directory")?;
            bridge.load(&mut ctx, &store)?;

            ctx.register_provider(provider, ProviderKind::Custom(kind), keep_loaded)?;
            let dimension = ctx.next_free_id();
            ctx.register_dimension(dimension, provider)?;
            let info = LifecycleInspector::inspect_dimension(&ctx, dimension)
                .context("dimension vanished after registration")?;
            println!("Allocated {info}");

            anyhow::ensure!(bridge.save(&ctx, &store), "failed to save id map");
            println!("Next free id: {}", ctx.next_free_id());
        }
        Commands::Demo { dir } => {
            let tmp = tempfile::tempdir()?;
            let dir = dir.unwrap_or_else(|| tmp.path().to_path_buf());
            run_demo(&config, &dir)?;
        }
    }

    Ok(())
}

fn open_context(config: &EngineConfig, dir: &Path) -> WorldLifecycleContext<SandboxWorld> {
    let mut ctx = WorldLifecycleContext::new(config.clone(), Box::new(LoggingCatalog));
    ctx.set_world(DimensionId::SURFACE, Some(SandboxWorld::surface(dir)));
    ctx
}

fn run_demo(config: &EngineConfig, dir: &Path) -> anyhow::Result<()> {
    println!("Demo in {}", dir.display());
    let bridge = PersistenceBridge::from_config(config);
    let coordinator = TransitionCoordinator::new(config);
    let mut host = SandboxHost::default();

    let mut ctx = open_context(config, dir);
    let store = bridge
        .store_for(&ctx)
        .context("surface world has no save directory")?;
    bridge.load(&mut ctx, &store)?;

    ctx.register_provider(2, ProviderKind::Custom("MiningWorldProvider".into()), false)?;
    let mining = ctx.next_free_id();
    ctx.register_dimension(mining, 2)?;
    println!("Registered mining as dimension {mining}");

    let mut actor = ActorState::new("steve", DimensionId::SURFACE, DVec3::new(0.5, 64.0, 0.5));
    println!("Join:");
    let mut sync = ConsoleSink::default();
    let mut events = ConsoleSink::default();
    let joined = coordinator.join(
        &ctx,
        &mut host,
        &mut actor,
        JoinRequest::default(),
        &mut sync,
        &mut events,
    )?;
    println!("  at {:?}", joined.location);

    for target in [mining, DimensionId::SURFACE] {
        println!("Transition to {target}:");
        let request = TransitionRequest::new(&actor, target);
        let arrival = coordinator.transition(&mut ctx, &mut host, &mut actor, &request, &mut sync)?;
        println!(
            "  arrived in {} (client sees {}) at {} via {:?}",
            arrival.dimension, arrival.client_dimension, arrival.position, arrival.source
        );
    }
    println!(
        "Sent {} updates; actor attached to {:?}",
        sync.sent,
        host.attached().iter().map(|(dim, _)| *dim).collect::<Vec<_>>()
    );

    println!("{}", LifecycleInspector::summary(&ctx));
    for info in LifecycleInspector::list_dimensions(&ctx) {
        println!("  {info}");
    }

    anyhow::ensure!(bridge.save(&ctx, &store), "failed to save id map");
    let mut reloaded = open_context(config, dir);
    bridge.load(&mut reloaded, &store)?;
    println!(
        "Reloaded: mining id kept={}, next free={}",
        reloaded.allocator().contains(mining),
        reloaded.next_free_id()
    );
    Ok(())
}
