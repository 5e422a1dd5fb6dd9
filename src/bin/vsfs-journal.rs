// vsfs-journal - vsfs 镜像的 journal 工具
//
// 子命令：format / create / install / ls / journal

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;
use vsfs_journal::{
    consts::VSFS_DEFAULT_IMAGE, journal::ScanStop, CheckpointPolicy, FileDevice, FsConfig, Vsfs,
};

// ============ 命令行参数 ============

#[derive(Parser)]
#[command(name = "vsfs-journal")]
#[command(about = "Journaled metadata updates for a vsfs image", version)]
struct Cli {
    /// Disk image path
    #[arg(long, global = true, default_value = VSFS_DEFAULT_IMAGE)]
    image: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or overwrite an empty image
    Format,
    /// Commit a file-creation transaction to the journal
    Create {
        /// File name (1-27 bytes, no '/')
        name: String,

        /// Checkpoint the new transaction immediately
        #[arg(long)]
        auto_checkpoint: bool,
    },
    /// Apply committed journal transactions (checkpoint)
    Install,
    /// List root directory entries
    Ls,
    /// Show the journal header and pending transactions
    Journal,
}

// ============ 主流程 ============

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // 默认的 tracing-log 桥会把库里的 `log` 记录转给订阅者
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn system_clock() -> Option<Duration> {
    SystemTime::now().duration_since(UNIX_EPOCH).ok()
}

fn config(policy: CheckpointPolicy) -> FsConfig {
    FsConfig {
        checkpoint_policy: policy,
        clock: system_clock,
        ..FsConfig::default()
    }
}

fn open(image: &Path, config: FsConfig) -> Result<Vsfs<FileDevice>> {
    let device = FileDevice::open(image, config.layout.block_size)
        .with_context(|| format!("failed to open image {}", image.display()))?;
    Vsfs::mount(device, config).with_context(|| format!("failed to mount {}", image.display()))
}

fn run(cli: Cli) -> Result<()> {
    let image = cli.image.as_path();

    match cli.command {
        Command::Format => cmd_format(image),
        Command::Create { name, auto_checkpoint } => cmd_create(image, &name, auto_checkpoint),
        Command::Install => cmd_install(image),
        Command::Ls => cmd_ls(image),
        Command::Journal => cmd_journal(image),
    }
}

// ============ 子命令 ============

fn cmd_format(image: &Path) -> Result<()> {
    let config = config(CheckpointPolicy::Deferred);
    let layout = config.layout;

    let device = FileDevice::create(image, layout.total_blocks() as u64, layout.block_size)
        .with_context(|| format!("failed to create image {}", image.display()))?;
    let fs = Vsfs::format(device, config).context("format failed")?;
    fs.unmount().context("failed to flush image")?;

    println!(
        "formatted {} ({} blocks of {} bytes)",
        image.display(),
        layout.total_blocks(),
        layout.block_size
    );
    Ok(())
}

fn cmd_create(image: &Path, name: &str, auto_checkpoint: bool) -> Result<()> {
    let policy = if auto_checkpoint {
        CheckpointPolicy::Immediate
    } else {
        CheckpointPolicy::Deferred
    };
    let mut fs = open(image, config(policy))?;

    let outcome = fs
        .create(name)
        .with_context(|| format!("create '{}' failed", name))?;

    println!("create '{}' committed to journal", name);
    if outcome.checkpointed {
        println!("journal installed");
    }
    Ok(())
}

fn cmd_install(image: &Path) -> Result<()> {
    let mut fs = open(image, config(CheckpointPolicy::Deferred))?;

    let report = fs.install().context("checkpoint failed")?;
    log::info!(
        "checkpoint complete: {} transactions, {} blocks, {} discarded records",
        report.transactions,
        report.blocks_written,
        report.discarded_records
    );

    println!("journal installed");
    Ok(())
}

fn cmd_ls(image: &Path) -> Result<()> {
    let mut fs = open(image, config(CheckpointPolicy::Deferred))?;

    for entry in fs.read_dir().context("failed to read root directory")? {
        println!("{:>4}  {}", entry.inode, entry.name);
    }

    let pending = fs.journal_scan().context("failed to scan journal")?;
    if !pending.transactions.is_empty() {
        println!(
            "({} committed transaction(s) not yet installed)",
            pending.transactions.len()
        );
    }
    Ok(())
}

fn cmd_journal(image: &Path) -> Result<()> {
    let mut fs = open(image, config(CheckpointPolicy::Deferred))?;

    let header = fs.journal_header().context("failed to read journal header")?;
    let scan = fs.journal_scan().context("failed to scan journal")?;

    println!("magic:      {:#010x}", header.magic);
    println!(
        "bytes used: {} / {}",
        header.bytes_used,
        fs.journal().capacity()
    );
    println!("committed:  {}", scan.transactions.len());

    for (i, txn) in scan.transactions.iter().enumerate() {
        let blocks: Vec<String> = txn.records.iter().map(|r| r.block_no.to_string()).collect();
        println!(
            "  txn {} @ offset {}: blocks [{}]",
            i,
            txn.start_offset,
            blocks.join(", ")
        );
    }

    if scan.discarded_records > 0 {
        println!("uncommitted: {} data record(s)", scan.discarded_records);
    }
    if scan.stop != ScanStop::End {
        println!("scan stopped at offset {}: {:?}", scan.end_offset, scan.stop);
    }
    Ok(())
}
