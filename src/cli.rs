use anyhow::{Result, anyhow};
use log::info;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use draggy::scene::{self, Scene};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let pretty = pargs.contains("--pretty");

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("check") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: draggy check <scene.toml>"))?;
            let scene = Scene::load(&path)?;
            print_json(
                &serde_json::json!({
                    "ok": true,
                    "data": {
                        "elements": scene.elements.len(),
                        "draggables": scene.draggables.len(),
                        "events": scene.events.len(),
                    }
                }),
                pretty,
            );
            Ok(())
        }

        Some("replay") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: draggy replay <scene.toml> [--pretty]"))?;
            let scene = Scene::load(&path)?;
            info!("replaying {}", path.display());
            let trace = scene::run(&scene)?;
            print_json(&serde_json::json!({"ok": true, "data": trace}), pretty);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"draggy — replay pointer scripts against draggable elements

USAGE:
  draggy help [command]                   Show general or command-specific help
  draggy check <scene.toml>               Validate a scene file
  draggy replay <scene.toml> [--pretty]   Replay a scene and print the trace as JSON

TIPS:
  - RUST_LOG=debug shows state transitions and limits
  - RUST_LOG=trace adds every kinetic sample
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "check" => println!(
            "usage: draggy check <scene.toml>\nParses and validates a scene; prints element, draggable and event counts."
        ),
        "replay" => println!(
            "usage: draggy replay <scene.toml> [--pretty]\nBuilds the headless document, feeds the event script and prints notices, DOM events and final positions."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value, pretty: bool) {
    let out = if pretty {
        serde_json::to_string_pretty(v)
    } else {
        serde_json::to_string(v)
    };
    println!("{}", out.unwrap_or_default());
}
