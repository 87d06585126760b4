use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stack_media::{path::split_scheme, MediaStat, MediaStorage};

/// Inspect and manage media behind the virtual `media://` scheme.
///
/// Storage comes from MEDIA_BUCKET / MEDIA_PATH (and GCS_* for buckets).
/// Paths are relative to the uploads directory unless they carry a scheme.
#[derive(Debug, Clone, Parser)]
#[command(name = "stack-media", version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Write a file's contents to stdout
    Cat { path: String },
    /// Store stdin (or --file) at a path
    Put {
        path: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print stat information as JSON
    Stat { path: String },
    /// Delete a file
    Rm { path: String },
    /// Move a file
    Mv {
        from: String,
        to: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Copy a file
    Cp {
        from: String,
        to: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
}

#[derive(Serialize)]
struct StatOutput<'a> {
    path: &'a str,
    kind: &'static str,
    #[serde(flatten)]
    stat: MediaStat,
}

fn resolve(storage: &MediaStorage, path: &str) -> String {
    if split_scheme(path).is_some() {
        return path.to_string();
    }
    storage.remote_path(&format!(
        "{}/{}",
        storage.config().media_path,
        path.trim_start_matches('/')
    ))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let storage = MediaStorage::from_env().context("media storage configuration")?;
    let media = storage.fs();

    match args.command {
        Commands::Cat { path } => {
            let path = resolve(&storage, &path);
            let contents = media.read(&path).with_context(|| format!("reading {}", path))?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&contents)?;
            stdout.flush()?;
        }
        Commands::Put { path, file } => {
            let path = resolve(&storage, &path);
            let contents = match file {
                Some(file) => {
                    fs::read(&file).with_context(|| format!("reading {}", file.display()))?
                }
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };
            media.write(&path, &contents).with_context(|| format!("writing {}", path))?;
            eprintln!("[stack-media] stored {} bytes at {}", contents.len(), path);
        }
        Commands::Stat { path } => {
            let path = resolve(&storage, &path);
            let stat = media.metadata(&path).with_context(|| format!("stat {}", path))?;
            let output = StatOutput {
                path: &path,
                kind: if stat.is_dir() { "directory" } else { "file" },
                stat,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Rm { path } => {
            let path = resolve(&storage, &path);
            media.remove_file(&path).with_context(|| format!("removing {}", path))?;
        }
        Commands::Mv {
            from,
            to,
            overwrite,
        } => {
            let (from, to) = (resolve(&storage, &from), resolve(&storage, &to));
            media
                .move_file(&from, &to, overwrite)
                .with_context(|| format!("moving {} to {}", from, to))?;
        }
        Commands::Cp {
            from,
            to,
            overwrite,
        } => {
            let (from, to) = (resolve(&storage, &from), resolve(&storage, &to));
            media
                .copy(&from, &to, overwrite)
                .with_context(|| format!("copying {} to {}", from, to))?;
        }
    }

    Ok(())
}
