use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use isoroom_assets::TextureRegistry;
use isoroom_map::MapDocument;
use isoroom_pool::PoolStrategy;
use isoroom_render::DebugTextRenderer;
use isoroom_stream::{SpriteLayer, StreamConfig, World, spawn_task};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "isoroom-cli", about = "CLI tool for isoroom tile maps")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the rooms of a map
    Rooms {
        #[command(flatten)]
        world: WorldArgs,
    },
    /// Stream rooms into headless sprite batches and report pool usage
    Stream {
        #[command(flatten)]
        world: WorldArgs,
        /// Rooms to load, in order (default: every room)
        #[arg(short, long)]
        room: Vec<String>,
        /// Unload the rooms again after loading them
        #[arg(long)]
        unload: bool,
        /// Print the debug renderer's output for one frame
        #[arg(long)]
        draw: bool,
    },
    /// Find the room containing a world-space point
    Locate {
        #[command(flatten)]
        world: WorldArgs,
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        #[arg(allow_negative_numbers = true)]
        z: f32,
        /// Room the player is currently in
        #[arg(long)]
        current: Option<String>,
    },
}

#[derive(Args)]
struct WorldArgs {
    /// LDtk map export
    map: PathBuf,
    /// Texture manifest (JSON); defaults to the built-in table
    #[arg(long)]
    textures: Option<PathBuf>,
    /// Sprite slots for opaque tiles
    #[arg(long, default_value_t = StreamConfig::default().opaque_capacity)]
    opaque_capacity: usize,
    /// Sprite slots for transparent tiles
    #[arg(long, default_value_t = StreamConfig::default().transparent_capacity)]
    transparent_capacity: usize,
    /// Preserve allocation order when releasing slots
    #[arg(long)]
    ordered: bool,
}

impl WorldArgs {
    fn config(&self) -> StreamConfig {
        let strategy = if self.ordered {
            PoolStrategy::Ordered
        } else {
            PoolStrategy::Swap
        };
        StreamConfig {
            opaque_capacity: self.opaque_capacity,
            transparent_capacity: self.transparent_capacity,
            opaque_strategy: strategy,
            transparent_strategy: strategy,
            ..StreamConfig::default()
        }
    }

    fn textures(&self) -> anyhow::Result<TextureRegistry> {
        match &self.textures {
            Some(path) => TextureRegistry::load(path)
                .with_context(|| format!("reading texture manifest {}", path.display())),
            None => Ok(TextureRegistry::builtin()),
        }
    }

    /// Build a world from the map, parsing the document off the main thread.
    fn open(&self) -> anyhow::Result<World> {
        let document = read_document(&self.map)?;
        let mut world = World::new(self.config(), self.textures()?);
        let rooms = world.load_world(&document)?;
        tracing::info!(rooms, map = %self.map.display(), "map opened");
        Ok(world)
    }
}

fn read_document(path: &Path) -> anyhow::Result<MapDocument> {
    let owned = path.to_path_buf();
    let mut task = spawn_task("load_map", move |progress| {
        progress.set(0.0);
        let document = isoroom_map::load_document(&owned);
        progress.set(1.0);
        document
    })?;

    let result = loop {
        if let Some(result) = task.take_result() {
            break result;
        }
        if task.panicked() {
            anyhow::bail!("map loader panicked");
        }
        tracing::trace!(fraction = ?task.fraction(), "waiting for map");
        thread::sleep(Duration::from_millis(5));
    };
    result.with_context(|| format!("reading map {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("isoroom-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", isoroom_common::crate_info());
            println!("pool: {}", isoroom_pool::crate_info());
            println!("assets: {}", isoroom_assets::crate_info());
            println!("map: {}", isoroom_map::crate_info());
            println!("room: {}", isoroom_room::crate_info());
            println!("render: {}", isoroom_render::crate_info());
            println!("stream: {}", isoroom_stream::crate_info());
            println!("textures: {}", TextureRegistry::builtin().len());
        }
        Commands::Rooms { world } => {
            let world = world.open()?;
            println!("Rooms: {}", world.rooms().len());
            for room in world.rooms().iter() {
                let b = room.bounds();
                println!(
                    "  {:<24} tiles={:<5} transparent={:<4} interactables={:<3} bounds=({:.1}, {:.1}, {:.1})..({:.1}, {:.1}, {:.1})",
                    room.name(),
                    room.size(),
                    room.transparent_count(),
                    room.interactables().len(),
                    b.min.x,
                    b.min.y,
                    b.min.z,
                    b.max.x,
                    b.max.y,
                    b.max.z
                );
            }
        }
        Commands::Stream {
            world,
            room,
            unload,
            draw,
        } => {
            let mut world = world.open()?;
            let names: Vec<String> = if room.is_empty() {
                world.rooms().names().map(str::to_string).collect()
            } else {
                room
            };

            for name in &names {
                let loaded = world.load_room(name);
                println!("load {name}: {}", if loaded { "OK" } else { "REJECTED" });
            }
            let moved = world.update()?;
            report(&world, moved);

            if draw {
                let mut renderer = DebugTextRenderer::new();
                world.draw(&mut renderer);
                print!("{}", renderer.take_output());
            }

            if unload {
                for name in &names {
                    let unloaded = world.unload_room(name);
                    println!("unload {name}: {}", if unloaded { "OK" } else { "REJECTED" });
                }
                let moved = world.update()?;
                report(&world, moved);
            }
        }
        Commands::Locate {
            world,
            x,
            y,
            z,
            current,
        } => {
            let mut world = world.open()?;
            if let Some(name) = &current {
                world.set_current_room(name);
            }
            let point = Vec3::new(x, y, z);
            match world.location(point) {
                Some(name) => println!("({x}, {y}, {z}) is in {name}"),
                None => println!("({x}, {y}, {z}) is outside every room"),
            }
        }
    }

    Ok(())
}

fn report(world: &World, columns_synced: usize) {
    let stats = world.stats();
    println!(
        "Loaded: {} rooms, interactables={}, columns synced={columns_synced}",
        world.loaded_rooms().count(),
        world.interactables().len()
    );
    for layer in [SpriteLayer::Opaque, SpriteLayer::Transparent] {
        let set = world.sprites(layer);
        println!(
            "  {layer:<11} used={:<5} remaining={:<5} capacity={}",
            set.pool().used(),
            set.remaining(),
            set.pool().capacity()
        );
    }
    println!(
        "Stats: loaded={} unloaded={} rejected={} last_load={:?} avg_load={:?}",
        stats.rooms_loaded,
        stats.rooms_unloaded,
        stats.requests_rejected,
        stats.last_load_time,
        world.load_times().average()
    );
}
