//! CPU search backend.
//!
//! Reference r-adding-walk implementation: each worker thread advances a
//! batch of independent pseudorandom walks, reporting every distinguished
//! point over the engine's bounded result channel. A walk starts at
//! a·G + b·Q for random (a, b); each step adds the jump table entry indexed
//! by the low five bits of the current x coordinate. Walks that exceed the
//! length cap are abandoned and restarted to escape short cycles.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, ToPrimitive, Zero};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::curve::{Curve, Point};
use crate::engine::{CandidateResult, SearchEngine};
use crate::error::ClientError;
use crate::protocol::{JumpTable, ProblemParameters, JUMP_TABLE_SIZE};

/// One in-flight pseudorandom walk.
struct WalkState {
    a: BigUint,
    b: BigUint,
    point: Point,
    length: u64,
}

#[derive(Debug)]
pub struct CpuEngine {
    threads: usize,
    points_per_thread: usize,
    params: Arc<ProblemParameters>,
    curve: Curve,
    g: Point,
    q: Point,
    jumps: Vec<Point>,
    dp_mask: BigUint,
    max_walk_len: u64,
    sender: mpsc::Sender<CandidateResult>,
    running: AtomicBool,
    stop_requested: AtomicBool,
}

impl CpuEngine {
    pub fn new(
        threads: usize,
        points_per_thread: usize,
        params: Arc<ProblemParameters>,
        jumps: JumpTable,
        sender: mpsc::Sender<CandidateResult>,
    ) -> Result<Self, ClientError> {
        if threads == 0 {
            return Err(ClientError::Configuration(
                "CPU engine requires at least one thread".to_string(),
            ));
        }
        if points_per_thread == 0 {
            return Err(ClientError::Configuration(
                "CPU engine requires at least one walk per thread".to_string(),
            ));
        }
        if jumps.len() != JUMP_TABLE_SIZE {
            return Err(ClientError::Configuration(format!(
                "CPU engine requires {} jump table entries, got {}",
                JUMP_TABLE_SIZE,
                jumps.len()
            )));
        }

        let curve = params.curve();
        let g = Point::affine(params.gx.clone(), params.gy.clone());
        let q = Point::affine(params.qx.clone(), params.qy.clone());
        let jumps = jumps
            .entries()
            .iter()
            .map(|entry| Point::affine(entry.x.clone(), entry.y.clone()))
            .collect();

        let dp_mask = (BigUint::one() << params.d_bits) - BigUint::one();
        // Walks much longer than the expected DP spacing are almost certainly
        // trapped in a cycle.
        let max_walk_len = 16u64.saturating_mul(1u64 << params.d_bits.min(40));

        Ok(Self {
            threads,
            points_per_thread,
            params,
            curve,
            g,
            q,
            jumps,
            dp_mask,
            max_walk_len,
            sender,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        })
    }

    fn is_distinguished(&self, x: &BigUint) -> bool {
        (x & &self.dp_mask).is_zero()
    }

    fn jump_index(&self, x: &BigUint) -> usize {
        (x & BigUint::from(JUMP_TABLE_SIZE as u32 - 1))
            .to_usize()
            .unwrap_or(0)
    }

    /// Start a fresh walk at a·G + b·Q for random coefficients.
    fn new_walk(&self, rng: &mut impl rand::Rng) -> WalkState {
        loop {
            let a = rng.gen_biguint_below(&self.params.n);
            let b = rng.gen_biguint_below(&self.params.n);
            let start = self.curve.add(
                &self.curve.scalar_mul(&self.g, &a),
                &self.curve.scalar_mul(&self.q, &b),
            );
            if !start.is_infinity() {
                return WalkState {
                    a,
                    b,
                    point: start,
                    length: 0,
                };
            }
        }
    }

    fn worker(&self, worker_id: usize) {
        let mut rng = rand::thread_rng();
        let mut walks: Vec<WalkState> = (0..self.points_per_thread)
            .map(|_| self.new_walk(&mut rng))
            .collect();

        while !self.stop_requested.load(Ordering::Relaxed) {
            for walk in walks.iter_mut() {
                let (x, y) = match &walk.point {
                    Point::Affine { x, y } => (x.clone(), y.clone()),
                    Point::Infinity => {
                        *walk = self.new_walk(&mut rng);
                        continue;
                    }
                };

                if self.is_distinguished(&x) {
                    let candidate = CandidateResult {
                        a: walk.a.clone(),
                        b: walk.b.clone(),
                        x,
                        y,
                        length: walk.length,
                    };
                    // Blocks when the verifier queue is full; bounded by the
                    // result_queue_size configuration knob.
                    if self.sender.blocking_send(candidate).is_err() {
                        debug!("Result channel closed, CPU worker {} exiting", worker_id);
                        self.stop_requested.store(true, Ordering::Relaxed);
                        return;
                    }
                    *walk = self.new_walk(&mut rng);
                    continue;
                }

                if walk.length >= self.max_walk_len {
                    *walk = self.new_walk(&mut rng);
                    continue;
                }

                let idx = self.jump_index(&x);
                walk.point = self.curve.add(&walk.point, &self.jumps[idx]);
                walk.length += 1;
            }
        }
    }
}

impl SearchEngine for CpuEngine {
    fn run(&self) {
        self.stop_requested.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
        info!(
            "CPU engine starting: {} threads x {} walks",
            self.threads, self.points_per_thread
        );

        thread::scope(|scope| {
            for worker_id in 0..self.threads {
                scope.spawn(move || self.worker(worker_id));
            }
        });

        self.running.store(false, Ordering::Release);
        info!("CPU engine stopped");
    }

    fn stop(&self) {
        info!("CPU engine stop requested");
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
