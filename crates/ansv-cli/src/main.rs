//! Distributed ANSV harness: reads a byte file, block-distributes it over an
//! in-process worker group, computes both nearest-smaller arrays, verifies
//! them against the RMQ oracle at rank 0, and optionally writes them out.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use ansv::check::{Direction, check_nsv};
use ansv::{ansv_parallel, ansv_sequential};
use ansv_comm::{Communicator, run_group};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "All nearest smaller values over a block-distributed byte file")]
struct Args {
    /// Input file, read as a raw byte sequence with no framing.
    file: PathBuf,

    /// Number of workers in the group.
    #[arg(short = 'p', long, default_value_t = 4)]
    workers: usize,

    /// Write the answers as `L R` lines, one per position.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the distributed run and sweep sequentially instead.
    #[arg(long)]
    sequential: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    if bytes.is_empty() {
        return Err(ansv::Error::EmptyInput).context("input file holds no values");
    }

    let (left, right) = if args.sequential {
        ansv_sequential(&bytes)?
    } else {
        distributed(&bytes, args.workers)?
    };

    check_nsv(&bytes, &left, Direction::Left).context("left array failed verification")?;
    check_nsv(&bytes, &right, Direction::Right).context("right array failed verification")?;

    if let Some(path) = &args.output {
        write_results(path, &left, &right)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "verified {} positions over {} worker(s)",
        bytes.len(),
        if args.sequential { 1 } else { args.workers }
    );
    Ok(())
}

type Gathered = Option<(Vec<usize>, Vec<usize>)>;

/// Runs the worker group and returns the arrays gathered at rank 0.
fn distributed(bytes: &[u8], workers: usize) -> anyhow::Result<(Vec<usize>, Vec<usize>)> {
    let outputs = run_group(workers, |comm| -> anyhow::Result<Gathered> {
        let global = (comm.rank() == 0).then(|| bytes.to_vec());
        let (local, _) = comm.block_distribute(global)?;
        let (left, right) = ansv_parallel(&local, comm)?;
        let left = comm.gather_v(&left, 0)?;
        let right = comm.gather_v(&right, 0)?;
        Ok(left.zip(right))
    })?;

    let mut gathered = None;
    for (rank, output) in outputs.into_iter().enumerate() {
        let output = output.with_context(|| format!("worker {rank} failed"))?;
        if rank == 0 {
            gathered = output;
        }
    }
    gathered.context("rank 0 holds the gathered arrays")
}

fn write_results(path: &Path, left: &[usize], right: &[usize]) -> std::io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    for (l, r) in left.iter().zip(right) {
        writeln!(writer, "{l} {r}")?;
    }
    writer.flush()
}

/// 1 for precondition violations, 2 for transport or verification failures.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<ansv::Error>() {
            return match err {
                ansv::Error::Comm(comm) => comm_exit_code(comm),
                _ => 1,
            };
        }
        if let Some(err) = cause.downcast_ref::<ansv_comm::Error>() {
            return comm_exit_code(err);
        }
        if cause.downcast_ref::<ansv::check::CheckError>().is_some() {
            return 2;
        }
    }
    1
}

fn comm_exit_code(err: &ansv_comm::Error) -> u8 {
    match err {
        ansv_comm::Error::Disconnected { .. } | ansv_comm::Error::Protocol { .. } => 2,
        _ => 1,
    }
}
