//! Local benchmark self-test.
//!
//! Runs the configured engine against a built-in toy problem for a fixed
//! duration and reports walk throughput. Never contacts the server.

use anyhow::{Context, Result};
use num_bigint::BigUint;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::curve::Point;
use crate::engine;
use crate::protocol::{JumpEntry, JumpTable, ProblemParameters, JUMP_TABLE_SIZE};

const BENCHMARK_SECS: u64 = 10;

/// The built-in benchmark problem: y² = x³ + 2x + 2 over F_17 with
/// G = (5, 1) of order 19 and Q = 2G. Small enough that walks hit
/// distinguished points constantly, which is exactly what a throughput
/// measurement wants.
pub fn builtin_problem() -> (ProblemParameters, JumpTable) {
    let params = ProblemParameters {
        p: BigUint::from(17u32),
        n: BigUint::from(19u32),
        a: BigUint::from(2u32),
        b: BigUint::from(2u32),
        gx: BigUint::from(5u32),
        gy: BigUint::from(1u32),
        qx: BigUint::from(6u32),
        qy: BigUint::from(3u32),
        d_bits: 2,
    };

    let curve = params.curve();
    let g = Point::affine(params.gx.clone(), params.gy.clone());
    let entries = (0..JUMP_TABLE_SIZE)
        .map(|i| {
            let k = BigUint::from((i % 18) as u32 + 1);
            match curve.scalar_mul(&g, &k) {
                Point::Affine { x, y } => JumpEntry { x, y },
                // k < ord(G), so k·G is never the point at infinity
                Point::Infinity => JumpEntry {
                    x: params.gx.clone(),
                    y: params.gy.clone(),
                },
            }
        })
        .collect();

    (params, JumpTable::new(entries))
}

/// Run the benchmark with the configured backend and report results.
pub async fn run_benchmark(config: &ClientConfig) -> Result<()> {
    info!(
        "Running {}s local benchmark on the {} backend",
        BENCHMARK_SECS, config.compute.backend
    );

    let (params, jumps) = builtin_problem();
    let params = Arc::new(params);
    let curve = params.curve();

    let (tx, mut rx) = mpsc::channel(config.cache.result_queue_size);
    let engine = engine::build_engine(&config.compute, params.clone(), jumps, tx)
        .context("Failed to construct search engine")?;

    let runner = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.run())
    };

    let started = Instant::now();
    let deadline = started + Duration::from_secs(BENCHMARK_SECS);
    let mut candidates = 0u64;
    let mut walk_steps = 0u64;
    let mut invalid = 0u64;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(candidate)) => {
                if curve.is_on_curve(&candidate.x, &candidate.y) {
                    candidates += 1;
                    walk_steps += candidate.length;
                } else {
                    invalid += 1;
                }
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }

    engine.stop();
    drop(rx);
    let _ = tokio::task::spawn_blocking(move || runner.join()).await;

    let elapsed = started.elapsed().as_secs_f64();
    info!("Benchmark complete in {:.1}s", elapsed);
    info!("  distinguished points: {}", candidates);
    info!("  walk steps:           {}", walk_steps);
    info!("  steps/sec:            {:.0}", walk_steps as f64 / elapsed);

    if invalid > 0 {
        warn!("{} invalid points reported by the engine", invalid);
    }

    Ok(())
}
