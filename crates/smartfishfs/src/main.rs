//! SmartfishFS inspection binary.
//!
//! Mounts an instance, runs one command against it, and unmounts.
//!
//! Usage:
//!   cargo run -p smartfishfs -- tree
//!   cargo run -p smartfishfs -- cat /readme.txt
//!   cargo run -p smartfishfs -- --config smartfishfs.toml stat /docs
//!   RUST_LOG=smartfishfs=debug cargo run -p smartfishfs -- tree

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use smartfishfs::{
    FS_NAME, FileReader, FsRegistry, MountConfig, NodeId, SmartfishFs, Superblock,
};

/// Inspect a SmartfishFS mount.
#[derive(Parser, Debug)]
#[command(name = "smartfishfs")]
#[command(about = "Mount a SmartfishFS instance and inspect it")]
struct Args {
    /// TOML mount configuration (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the directory tree
    Tree,
    /// Print a file's content
    Cat {
        /// Path below the root
        path: String,
    },
    /// Print node metadata (or filesystem statistics without a path) as JSON
    Stat {
        /// Path below the root
        path: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MountConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MountConfig::default(),
    };

    let mut registry = FsRegistry::new();
    registry.register(SmartfishFs::new())?;
    let fs = registry.lookup(FS_NAME)?;

    let sb = fs.mount(&config).context("mount failed")?;
    let result = run(&sb, &args.command);
    fs.unmount(&sb);
    registry.unregister(FS_NAME);
    result
}

fn run(sb: &Superblock, command: &Command) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match command {
        Command::Tree => {
            writeln!(out, "/")?;
            print_tree(sb, sb.root()?, 1, &mut out)?;
        }
        Command::Cat { path } => {
            let id = sb.resolve(path).with_context(|| format!("resolving {path}"))?;
            let mut offset = 0;
            loop {
                let chunk = sb.read(id, offset, sb.block_size() as usize)?;
                if chunk.is_eof() {
                    break;
                }
                out.write_all(&chunk.data)?;
                offset = chunk.new_offset;
            }
        }
        Command::Stat { path: Some(path) } => {
            let id = sb.resolve(path).with_context(|| format!("resolving {path}"))?;
            serde_json::to_writer_pretty(&mut out, &sb.get(id)?)?;
            writeln!(out)?;
        }
        Command::Stat { path: None } => {
            serde_json::to_writer_pretty(&mut out, &sb.statistics())?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn print_tree(sb: &Superblock, dir: NodeId, depth: usize, out: &mut impl Write) -> Result<()> {
    for entry in sb.list_children(dir)? {
        let indent = "  ".repeat(depth);
        if entry.kind.is_dir() {
            writeln!(out, "{indent}{}/", entry.name)?;
            print_tree(sb, entry.id, depth + 1, out)?;
        } else {
            let size = sb.get(entry.id)?.size;
            writeln!(out, "{indent}{} ({size} bytes, inode {})", entry.name, entry.id)?;
        }
    }
    Ok(())
}
