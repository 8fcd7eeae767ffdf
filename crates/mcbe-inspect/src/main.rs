mod config;

use config::InspectConfig;
use mcbe_nbt::NbtRoot;
use mcbe_world::{count_records, RecordKind, RecordPayload, ScanEvent, ScanOptions, ScanReport, World};
use serde_json::{json, Value};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "inspect.toml".into());
    let config = match InspectConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("mcbe-inspect v{}", env!("CARGO_PKG_VERSION"));

    let (mut world, mut store) = World::open(&config.world.path)?;

    let total = if config.scan.count_first {
        let total = count_records(&mut store)?;
        info!("{total} records in store");
        Some(total)
    } else {
        None
    };

    let options = ScanOptions {
        progress_interval: config.scan.progress_interval,
        total,
        ..ScanOptions::default()
    };
    let dump_nbt = config.scan.dump_nbt;
    let report = world.scan(&mut store, &options, &mut |event| {
        if let ScanEvent::Record { key, kind, payload } = event {
            if dump_nbt {
                if let Some(line) = record_json(key, kind, &payload) {
                    println!("{line}");
                }
            }
        }
    })?;

    log_report(&world, &report, config.scan.max_errors_shown);
    Ok(())
}

/// One JSON line for a decoded record, or `None` for payloads with no tree.
fn record_json(key: &[u8], kind: &RecordKind, payload: &RecordPayload) -> Option<Value> {
    let value = match payload {
        RecordPayload::Nbt(roots) => Value::Array(roots.iter().map(root_json).collect()),
        RecordPayload::MetaDataDictionary(entries) => Value::Array(
            entries
                .iter()
                .map(|(hash, root)| json!({ "hash": format!("{hash:016x}"), "nbt": root_json(root) }))
                .collect(),
        ),
        _ => return None,
    };
    Some(json!({
        "kind": kind.label(),
        "key": display_key(key, kind),
        "value": value,
    }))
}

fn root_json(root: &NbtRoot) -> Value {
    json!({ "name": root.name, "tag": root.tag.to_json() })
}

/// Printable form of a store key: chunk keys as coordinates, text keys as-is.
fn display_key(key: &[u8], kind: &RecordKind) -> String {
    match kind {
        RecordKind::Chunk(info) => format!(
            "{}:{},{}:{:?}",
            info.dimension_name, info.chunk_x, info.chunk_z, info.tag
        ),
        _ => match std::str::from_utf8(key) {
            Ok(s) if s.chars().all(|c| !c.is_control()) => s.to_string(),
            _ => key.iter().map(|b| format!("{b:02x}")).collect(),
        },
    }
}

fn log_report(world: &World, report: &ScanReport, max_errors: usize) {
    info!(
        "World '{}': {} records, {} chunk records, {} sub-chunks, {} NBT records",
        world.name, report.records, report.chunk_records, report.sub_chunks, report.nbt_records
    );
    for (kind, count) in &report.per_kind {
        info!("  {kind}: {count}");
    }
    for dim in world.dimensions() {
        info!("  {}: {} chunks", dim.name(), dim.chunk_count());
    }
    if !report.errors.is_empty() {
        warn!("{} records failed to decode", report.errors.len());
        for err in report.errors.iter().take(max_errors) {
            let kind = mcbe_world::classify(&err.key);
            warn!("  [{}] {}: {}", err.kind, display_key(&err.key, &kind), err.error);
        }
    }
}
