use std::{env, error, path::PathBuf};

use dungeon::track::generate_track_collision;
use dungeon::{LayerManager, RoomDescription};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "roomforge.log";

/// Installs the fmt subscriber, writing to `roomforge.log` in the temp dir
/// when `to_file` is set. The returned guard flushes the file on drop.
fn init_logging(to_file: bool) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if to_file {
        let path: PathBuf = env::temp_dir().join(LOG_FILE);
        println!("Logging to file: {}", path.display());

        let appender = tracing_appender::rolling::never(env::temp_dir(), LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

fn main() {
    println!("roomforge v0.1.0");

    let args = env::args().skip(1).collect::<Vec<String>>();
    let _guard = init_logging(args.iter().any(|arg| arg == "--log-file"));

    let Some(path) = args.iter().find(|arg| !arg.starts_with("--")) else {
        println!("usage: roomforge <room.json> [--log-file]");
        std::process::exit(1)
    };

    if let Err(e) = run(path) {
        error!("{e}");
        println!("{e}");
        std::process::exit(2);
    }
}

fn run(path: &str) -> Result<(), Box<dyn error::Error>> {
    info!("loading {path}");
    let description = RoomDescription::from_path(path)?;
    let mut room = description.build()?;

    let merge = room.merge_type();
    let mut manager = LayerManager::new();
    manager.apply_merge(&merge);

    let stats = room.recomposite(&manager, &description.compositor);
    println!(
        "room 0x{:03X}: merge {} ({}), {:?}, {} layers, {} opaque pixels, brightness {}",
        room.id(),
        merge.id,
        merge.name,
        description.compositor.strategy,
        stats.layers_drawn,
        stats.opaque_pixels,
        manager.surface_brightness()
    );

    let result = generate_track_collision(&room, &description.generator)?;
    print!("{}", result.ascii);
    println!(
        "{} track tiles ({} stops, {} corners, {} switches), {} bytes encoded",
        result.tiles_generated,
        result.stop_count,
        result.corner_count,
        result.switch_count,
        result.map.encoded_len()
    );

    Ok(())
}
