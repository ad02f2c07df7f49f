use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use twf_cli::{run, CommandKind, CommonOptions};

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--root" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --root".to_string())?;
                options.root = Some(PathBuf::from(value));
                index += 2;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "validate" => {
            let [map_name] = command_args else {
                return Err("validate requires exactly one map name".to_string());
            };
            CommandKind::Validate {
                map_name: map_name.clone(),
            }
        }
        "render" => {
            let map_name = command_args
                .first()
                .ok_or_else(|| "render requires a map name".to_string())?
                .clone();
            let mut include_overhead = true;
            let mut view = None;
            let mut rest = command_args[1..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--no-overhead" => include_overhead = false,
                    "--view" => view = Some(parse_view(&mut rest)?),
                    other => {
                        return Err(format!(
                            "unknown render argument '{other}' (expected --no-overhead or --view)"
                        ))
                    }
                }
            }
            CommandKind::Render {
                map_name,
                include_overhead,
                view,
            }
        }
        "tileset" => {
            let [tileset_id] = command_args else {
                return Err("tileset requires exactly one tileset id".to_string());
            };
            CommandKind::TilesetInfo {
                tileset_id: tileset_id.clone(),
            }
        }
        "commands" => {
            let map_name = command_args
                .first()
                .ok_or_else(|| "commands requires a map name".to_string())?
                .clone();
            let mut include_overhead = true;
            for arg in &command_args[1..] {
                if arg == "--no-overhead" {
                    include_overhead = false;
                } else {
                    return Err(format!(
                        "unknown commands argument '{arg}' (expected --no-overhead)"
                    ));
                }
            }
            CommandKind::Commands {
                map_name,
                include_overhead,
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    run(kind, options, &mut io::stdout())
}

fn parse_view<'a, I>(rest: &mut I) -> Result<(i32, i32, i32, i32), String>
where
    I: Iterator<Item = &'a String>,
{
    let mut values = [0i32; 4];
    for (label, slot) in ["x", "y", "w", "h"].iter().zip(values.iter_mut()) {
        let raw = rest
            .next()
            .ok_or_else(|| format!("--view requires four values (missing {label})"))?;
        *slot = raw
            .parse::<i32>()
            .map_err(|_| format!("invalid --view {label} value '{raw}' (expected i32)"))?;
    }
    Ok((values[0], values[1], values[2], values[3]))
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "twf_cli - map content inspection tools",
        "",
        "Usage:",
        "  twf_cli [--root <dir>] validate <map_name>",
        "  twf_cli [--root <dir>] render <map_name> [--no-overhead] [--view <x> <y> <w> <h>]",
        "  twf_cli [--root <dir>] tileset <tileset_id>",
        "  twf_cli [--root <dir>] commands <map_name> [--no-overhead]",
        "",
        "Defaults:",
        "  --root auto-detected (TWF_ROOT, then upward from the executable)",
    ]
    .join("\n")
}
