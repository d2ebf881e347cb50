//! Inspect an action-map profile: load it (plus an optional rebind file),
//! list maps/actions/bindings and optionally dump the JSON snapshot.
//!
//! Examples:
//!   amap-inspect --profile .\profile.xml
//!   amap-inspect --profile .\profile.xml --rebinds .\rebinds.xml --list
//!   amap-inspect --profile .\profile.xml --json > snapshot.json
//!
//! Notes:
//! - Only --profile is required.
//! - Device mappings default to keyboard/mouse/gamepad/joystick.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;

use actionmap_core::input::device::default_device_mappings;
use actionmap_core::prelude::*;

// ───────────────────────────── CLI Args ─────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "amap-inspect", version, about = "Inspect action map profiles")]
struct Args {
    /// Path to the profile XML [REQUIRED]
    #[arg(short, long)]
    profile: PathBuf,

    /// Optional rebind XML applied on top of the profile
    #[arg(short, long)]
    rebinds: Option<PathBuf>,

    /// List every map, action and binding
    #[arg(short, long)]
    list: bool,

    /// Dump the JSON snapshot to stdout
    #[arg(short, long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log: Arc<dyn InputLog> = Arc::new(StderrLog::new(args.verbose));

    let mut manager = ActionMapManager::new(
        Arc::new(NullHost),
        Arc::new(SystemClock::new()),
        Arc::clone(&log),
    );
    for mapping in default_device_mappings() {
        manager.add_input_device_mapping(mapping.device, mapping.name.as_ref());
    }

    if let Err(e) = manager.load_profile_file(&args.profile) {
        log.error(&format!("load {}: {e}", args.profile.display()));
        return ExitCode::FAILURE;
    }
    log.info(&format!(
        "loaded {} maps, {} actions (profile version {})",
        manager.action_map_count(),
        manager.action_count(),
        manager.version()
    ));

    if let Some(rebinds) = &args.rebinds {
        match manager.load_rebinds_file(rebinds) {
            Ok(()) => log.info(&format!("applied rebinds from {}", rebinds.display())),
            Err(e) => {
                log.error(&format!("load {}: {e}", rebinds.display()));
                return ExitCode::FAILURE;
            }
        }
    }

    if args.list {
        print_listing(&manager);
    }

    if args.json {
        match manager.export_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log.error(&e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn print_listing(manager: &ActionMapManager) {
    for filter in manager.action_filters() {
        println!(
            "filter '{}' ({:?}) {}",
            filter.name(),
            filter.kind(),
            if filter.enabled() {
                "blocking inputs"
            } else {
                "allowing inputs"
            }
        );
    }

    for map in manager.action_maps() {
        println!(
            "actionmap '{}' {} ({} rebound)",
            map.name(),
            if map.enabled() { "enabled" } else { "disabled" },
            map.num_rebound_inputs()
        );
        for action in map.actions() {
            let binds: Vec<String> = action
                .inputs
                .iter()
                .map(|i| {
                    if i.is_bound() {
                        format!("{:?}:{}", i.device, i.input)
                    } else {
                        format!("{:?}:<unbound>", i.device)
                    }
                })
                .collect();
            println!("  {} = {}", action.id(), binds.join(", "));
        }
    }
}
