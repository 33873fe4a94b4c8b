//! Throughput benchmark for the `bench` subcommand.

use std::time::{Duration, Instant};

use rand::RngCore;
use rasmx_blake3::{Engine, Hasher, hash};

use crate::progress::{BenchProgress, format_bytes, format_count, format_millis, throughput};

const MEGABYTE: usize = 1024 * 1024;

/// Input used for the small-message ops/sec run
const SMALL_INPUT: &[u8] = b"Rasmx fast hash";

/// Piece size for the streaming comparison
const STREAM_PIECE: usize = 64 * 1024;

/// Benchmark parameters
#[derive(Debug, Clone, Copy)]
pub struct BenchOptions {
    /// Size of the random buffer in MiB
    pub size_mb: usize,
    /// Iterations of the small-input loop
    pub iterations: u64,
}

/// Timings collected by [`run`]
#[derive(Debug, Clone)]
pub struct BenchReport {
    /// Bytes hashed by the throughput runs
    pub bytes: u64,
    /// One blocking `Engine::hash` over the buffer
    pub sync: Duration,
    /// One awaited `Engine::hash_async` over the buffer
    pub async_: Duration,
    /// All small-input iterations
    pub ops: Duration,
    /// Iterations performed
    pub iterations: u64,
    /// One-shot hash of 1 MiB
    pub one_shot: Duration,
    /// Streaming hash of the same 1 MiB
    pub streaming: Duration,
}

impl BenchReport {
    /// Small-input hashes per second
    #[must_use]
    pub fn ops_per_sec(&self) -> u64 {
        let secs = self.ops.as_secs_f64().max(f64::EPSILON);
        (self.iterations as f64 / secs) as u64
    }
}

/// Run every benchmark step on `engine`.
///
/// # Errors
///
/// Returns an error if a background hash task fails or a sanity check on
/// the produced digests does not hold.
pub async fn run(engine: &Engine, options: BenchOptions) -> anyhow::Result<BenchReport> {
    let size = options.size_mb.max(1) * MEGABYTE;
    let progress = BenchProgress::new(5);

    progress.start_step(format!("generating {} random buffer", format_bytes(size as u64)));
    let mut buffer = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut buffer);
    progress.finish_step(format!("[setup] {} random buffer ready", format_bytes(size as u64)));

    progress.start_step("throughput (sync)");
    let start = Instant::now();
    let sync_digest = engine.hash(&buffer);
    let sync = start.elapsed();
    progress.finish_step(format!("throughput (sync):  {}", throughput(size as u64, sync)));

    progress.start_step("throughput (async)");
    let start = Instant::now();
    let async_digest = engine.hash_async(buffer).await?;
    let async_ = start.elapsed();
    progress.finish_step(format!("throughput (async): {}", throughput(size as u64, async_)));

    if sync_digest != async_digest {
        anyhow::bail!("sync and async digests differ: {sync_digest} vs {async_digest}");
    }

    progress.start_step(format!("{} small hashes", format_count(options.iterations)));
    let start = Instant::now();
    for _ in 0..options.iterations {
        std::hint::black_box(hash(std::hint::black_box(SMALL_INPUT)));
    }
    let ops = start.elapsed();
    progress.finish_step(format!(
        "small input ({} bytes): {} iterations in {}",
        SMALL_INPUT.len(),
        format_count(options.iterations),
        format_millis(ops)
    ));

    progress.start_step("one-shot vs streaming");
    let text = vec![b'A'; MEGABYTE];
    let start = Instant::now();
    let one_shot_digest = hash(&text);
    let one_shot = start.elapsed();

    let start = Instant::now();
    let mut hasher = Hasher::new();
    for piece in text.chunks(STREAM_PIECE) {
        hasher.update(piece)?;
    }
    let streaming_digest = hasher.finalize()?;
    let streaming = start.elapsed();
    progress.finish_step(format!(
        "1 MiB one-shot {} / streaming {}",
        format_millis(one_shot),
        format_millis(streaming)
    ));

    if one_shot_digest != streaming_digest {
        anyhow::bail!("one-shot and streaming digests differ");
    }

    progress.finish_with_message("done");

    Ok(BenchReport {
        bytes: size as u64,
        sync,
        async_,
        ops,
        iterations: options.iterations,
        one_shot,
        streaming,
    })
}

/// Print a summary of `report` to stdout
pub fn print_report(report: &BenchReport) {
    println!();
    println!("Benchmark results");
    println!("  Buffer:        {}", format_bytes(report.bytes));
    println!("  Sync:          {}", throughput(report.bytes, report.sync));
    println!("  Async:         {}", throughput(report.bytes, report.async_));
    println!(
        "  Small input:   {} ops/sec ({} total)",
        format_count(report.ops_per_sec()),
        format_millis(report.ops)
    );
    println!("  1 MiB one-shot:  {}", format_millis(report.one_shot));
    println!("  1 MiB streaming: {}", format_millis(report.streaming));
}
