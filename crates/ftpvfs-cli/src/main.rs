//! ftpvfs command-line tool.
//!
//! Usage:
//!   ftpvfs --host ftp.example.org ls /pub
//!   ftpvfs --host ftp.example.org stat /pub/README
//!   ftpvfs --host ftp.example.org cat /pub/README --offset 100 --length 50
//!
//! Logs go to stderr; set RUST_LOG=debug to see the FTP conversation.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::SeekFrom;
use std::time::UNIX_EPOCH;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, fmt};

use ftpvfs::{FileAttr, FileHandle, FtpFs};
use ftpvfs_client::FtpSession;

const CHUNK: usize = 64 * 1024;

/// Browse and read files on an FTP server.
#[derive(Parser, Debug)]
#[command(name = "ftpvfs")]
#[command(about = "Browse and read files on an FTP server")]
struct Args {
    /// Server host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Login name
    #[arg(long, global = true)]
    user: Option<String>,

    /// Login password
    #[arg(long, global = true, env = "FTPVFS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Config file (RON). Defaults to <config dir>/ftpvfs/config.ron
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        path: String,
        /// Show at most this many entries (0 for all)
        #[arg(long, default_value_t = 0)]
        count: i64,
    },
    /// Show a path's attributes
    Stat { path: String },
    /// Write a file to stdout
    Cat {
        path: String,
        /// Start reading here
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Stop after this many bytes
        #[arg(long)]
        length: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let overrides = config::Overrides {
        host: args.host,
        port: args.port,
        user: args.user,
        password: args.password,
    };
    let config = overrides.apply(config::load(args.config.as_deref())?);

    let session = FtpSession::connect(&config)
        .await
        .with_context(|| format!("connecting to {}:{}", config.host, config.port))?;
    let fs = FtpFs::new(session);

    let result = run(&fs, args.command).await;

    if let Err(e) = fs.session().lock().await.quit().await {
        tracing::debug!(error = %e, "QUIT failed");
    }
    result
}

async fn run(fs: &FtpFs<FtpSession>, command: Command) -> Result<()> {
    match command {
        Command::Ls { path, count } => {
            let handle = fs.open(&path).await.with_context(|| format!("opening {}", path))?;
            let stat = handle.stat()?;
            if stat.is_dir() {
                for entry in handle.readdir(count)? {
                    println!("{}", format_entry(&entry));
                }
            } else {
                println!("{}", format_entry(&stat));
            }
        }
        Command::Stat { path } => {
            let handle = fs.open(&path).await.with_context(|| format!("opening {}", path))?;
            let stat = handle.stat()?;
            println!("name:  {}", stat.name);
            println!("type:  {}", if stat.is_dir() { "directory" } else { "file" });
            println!("size:  {}", stat.size);
            println!("mode:  {:o}", stat.mode);
            if let Some(secs) = stat
                .mtime
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
            {
                println!("mtime: {}", secs);
            }
        }
        Command::Cat {
            path,
            offset,
            length,
        } => {
            let mut handle = fs.open(&path).await.with_context(|| format!("opening {}", path))?;
            cat(handle.as_mut(), offset, length).await?;
            handle.close().await?;
        }
    }
    Ok(())
}

async fn cat(handle: &mut dyn FileHandle, offset: u64, length: Option<u64>) -> Result<()> {
    if offset > 0 {
        handle.seek(SeekFrom::Start(offset))?;
    }

    let mut stdout = tokio::io::stdout();
    let mut remaining = length.unwrap_or(u64::MAX);
    let mut buf = vec![0u8; CHUNK];

    while remaining > 0 {
        let want = remaining.min(CHUNK as u64) as usize;
        let n = handle.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).await?;
        remaining -= n as u64;
    }
    stdout.flush().await?;
    Ok(())
}

/// `drw-r--r--       4096 name`
fn format_entry(attr: &FileAttr) -> String {
    let mut mode = String::with_capacity(10);
    mode.push(if attr.is_dir() { 'd' } else { '-' });
    for shift in [6, 3, 0] {
        let bits = (attr.perm() >> shift) & 0o7;
        mode.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        mode.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        mode.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    format!("{} {:>10} {}", mode, attr.size, attr.name)
}
