use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;
use strata_core::SharedKeyspace;
use strata_server::format::format_response;
use strata_server::shell::{to_frame, tokenize};
use strata_server::{execute_frame, ConfigRegistry, StrataConfig};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "strata", about = "sorted-set engine shell")]
struct Args {
    /// path to TOML configuration file
    #[arg(short = 'c', long, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// print default configuration as TOML and exit
    #[arg(long)]
    config_template: bool,

    /// sorted sets with more entries than this switch to the skip list layout
    #[arg(long, env = "STRATA_ZSET_MAX_LISTPACK_ENTRIES")]
    zset_max_listpack_entries: Option<usize>,

    /// members longer than this many bytes switch a set to the skip list layout
    #[arg(long, env = "STRATA_ZSET_MAX_LISTPACK_VALUE")]
    zset_max_listpack_value: Option<usize>,

    /// print replies without colors
    #[arg(long, env = "STRATA_NO_COLOR")]
    no_color: bool,
}

/// Applies CLI overrides to a `StrataConfig`. Only `Some` values from the
/// CLI args take effect, preserving the resolution order:
/// defaults, then TOML file, then env vars and CLI flags.
fn apply_args(cfg: &mut StrataConfig, args: &Args) {
    if let Some(v) = args.zset_max_listpack_entries {
        cfg.zset_max_listpack_entries = v;
    }
    if let Some(v) = args.zset_max_listpack_value {
        cfg.zset_max_listpack_value = v;
    }
}

/// Prints `msg` to stderr and exits with code 1.
fn exit_err(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn main() {
    // logs go to stderr so replies on stdout stay clean for piping
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strata=info".into()),
        )
        .init();

    let args = Args::parse();

    // --config-template: dump defaults and exit
    if args.config_template {
        match StrataConfig::default().to_toml() {
            Ok(toml) => {
                println!("{toml}");
                std::process::exit(0);
            }
            Err(e) => exit_err(format!("failed to generate config template: {e}")),
        }
    }

    // defaults, then TOML file, then CLI/env overrides
    let mut cfg = match &args.config {
        Some(path) => StrataConfig::from_file(path).unwrap_or_else(|e| exit_err(e)),
        None => StrataConfig::default(),
    };
    apply_args(&mut cfg, &args);

    if args.no_color {
        colored::control::set_override(false);
    }

    let keyspace = SharedKeyspace::new(cfg.build_keyspace_config());
    let registry = ConfigRegistry::from_config(&cfg);
    info!(
        zset_max_listpack_entries = cfg.zset_max_listpack_entries,
        zset_max_listpack_value = cfg.zset_max_listpack_value,
        "strata ready"
    );

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = std::io::stdout().lock();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            let _ = write!(stdout, "strata> ");
            let _ = stdout.flush();
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => exit_err(format!("failed to read input: {e}")),
            None => break,
        };

        let tokens = match tokenize(&line) {
            Ok(tokens) => tokens,
            Err(e) => {
                let _ = writeln!(stdout, "(error) ERR {e}");
                continue;
            }
        };
        match tokens.first() {
            None => continue,
            Some(first) if first.eq_ignore_ascii_case("quit") || first.eq_ignore_ascii_case("exit") => {
                break
            }
            Some(_) => {}
        }

        let reply = execute_frame(&keyspace, &registry, to_frame(tokens));
        if writeln!(stdout, "{}", format_response(&reply)).is_err() {
            // stdout closed, e.g. piped into head
            break;
        }
    }

    debug!(keys = keyspace.execute(|ks| ks.len()), "shell exiting");
}
