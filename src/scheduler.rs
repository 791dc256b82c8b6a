use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;

use crate::base_primes::{compute_base_primes, BasePrimes};
use crate::block_sieve::{sieve_block, BlockDescriptor};
use crate::config::Config;
use crate::engine_types::{compute_eta, PrimeResult, Progress, SieveError};
use crate::lane_marker::{select_marker, FlagMarker};
use crate::memory;
use crate::worker_pool::WorkerPool;

/// 1 ブロックに含まれうる素数の最大数（6 と互いに素な値の個数の上限）。
pub fn max_primes_in_block(length: u64) -> u64 {
    length / 3 + 2
}

/// `[next_start, max_value)` の先頭からブロックを切り出す。
///
/// - 長さは `block_length`、最後のブロックだけ `max_value` で切り詰める
/// - 理論上の最大素数個数の累計が `needed` に達するか、`max_blocks` 個に達したら止める
pub fn plan_blocks(
    next_start: u64,
    max_value: u64,
    block_length: u64,
    max_blocks: usize,
    needed: u64,
) -> Vec<BlockDescriptor> {
    let mut blocks = Vec::with_capacity(max_blocks);
    let mut start = next_start;
    let mut possible = 0u64;
    while start < max_value && blocks.len() < max_blocks.max(1) && possible < needed {
        let length = block_length.min(max_value - start);
        blocks.push(BlockDescriptor { start, length });
        possible = possible.saturating_add(max_primes_in_block(length));
        start += length;
    }
    blocks
}

/// 分割篩のスケジューラ。
///
/// ワーカープールはこの構造体が所有し、構築時に作られ、破棄時に全スレッドを join する。
/// 各バッチは `install` の中で完結するため、呼び出しから戻った時点で
/// 実行中のタスクは残っていない。
pub struct PrimeScheduler {
    cfg: Config,
    pool: WorkerPool,
    marker: &'static dyn FlagMarker,
    block_length: u64,
}

impl PrimeScheduler {
    /// 設定を検査し、固定サイズのワーカープールを構築する。
    pub fn new(cfg: Config) -> PrimeResult<Self> {
        let marker = select_marker(cfg.marker);
        Self::with_marker(cfg, marker)
    }

    /// 設定の `marker` を無視し、指定したマーカーで構築する。
    pub fn with_marker(cfg: Config, marker: &'static dyn FlagMarker) -> PrimeResult<Self> {
        cfg.validate()?;

        let pool = WorkerPool::new(cfg.worker_threads)?;
        let num_threads = pool.current_num_threads();

        let block_length = if cfg.block_length > 0 {
            cfg.block_length
        } else {
            let auto = memory::calculate_optimal_block_length(cfg.memory_usage_percent, num_threads);
            log::warn!(
                "block_length is 0; using {auto} derived from {:.0}% of system memory",
                cfg.memory_usage_percent
            );
            auto
        };

        log::info!(
            "marker: {}, workers: {}, block length: {}",
            marker.name(),
            num_threads,
            block_length
        );
        log::info!("{}", memory::get_memory_info(block_length, num_threads).format());

        Ok(Self {
            cfg,
            pool,
            marker,
            block_length,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn pool_size(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn block_length(&self) -> u64 {
        self.block_length
    }

    pub fn marker_name(&self) -> &'static str {
        self.marker.name()
    }

    /// 基底素数を求める（`isqrt(max_value)` 以下の全素数）。
    pub fn base_primes(&self) -> PrimeResult<BasePrimes> {
        compute_base_primes(
            self.cfg.base_limit(),
            self.cfg.small_sieve_ceiling,
            self.marker,
        )
    }

    /// 最初の `count` 個の素数を昇順で返す。
    pub fn generate_primes(&self, count: usize) -> PrimeResult<Vec<u64>> {
        self.generate_primes_with_progress(count, |_| {})
    }

    /// 最初の `count` 個の素数を昇順で返す。バッチごとに `progress_cb` で進捗を報告する。
    ///
    /// ブロックは開始値の昇順にバッチ単位で投入し、結果も同じ順序で連結する。
    /// 要求数がそろった時点で以降のブロックは作らない。
    pub fn generate_primes_with_progress(
        &self,
        count: usize,
        mut progress_cb: impl FnMut(Progress),
    ) -> PrimeResult<Vec<u64>> {
        let start_time = Instant::now();
        let max_value = self.cfg.max_value;
        let total = count as u64;

        let base = self.base_primes()?;
        if count <= base.len() {
            let mut primes = base.into_vec();
            primes.truncate(count);
            progress_cb(Progress {
                processed: total,
                total,
                eta_secs: Some(0),
            });
            return Ok(primes);
        }

        let mut primes: Vec<u64> = Vec::with_capacity(count.min(1 << 24));
        primes.extend_from_slice(base.as_slice());

        let group_size = self.pool_size().max(1);
        let mut next_start = base.bound() + 1;
        let mut group_index = 0usize;

        'batches: while primes.len() < count && next_start < max_value {
            group_index += 1;
            let needed = (count - primes.len()) as u64;
            let blocks = plan_blocks(next_start, max_value, self.block_length, group_size, needed);
            let Some(last) = blocks.last() else {
                break;
            };
            next_start = last.end();

            log::info!(
                "Processing group {} ({} blocks, [{}, {}))...",
                group_index,
                blocks.len(),
                blocks[0].start,
                next_start
            );

            // バッチ内の全タスクが終わるまで install から戻らない
            let base_slice = base.as_slice();
            let marker = self.marker;
            let results: Vec<PrimeResult<Vec<u64>>> = self.pool.install(|| {
                blocks
                    .par_iter()
                    .map(|&block| run_block(block, base_slice, marker))
                    .collect()
            });

            // 完了順ではなく開始値の順に連結する
            for (block, result) in blocks.iter().zip(results) {
                let block_primes = match result {
                    Ok(p) => p,
                    Err(e) => {
                        log::error!("{e}");
                        return Err(e);
                    }
                };
                log::debug!(
                    "block [{}, {}) produced {} primes",
                    block.start,
                    block.end(),
                    block_primes.len()
                );

                let remaining = count - primes.len();
                if block_primes.len() >= remaining {
                    primes.extend_from_slice(&block_primes[..remaining]);
                    break 'batches;
                }
                primes.extend_from_slice(&block_primes);
            }

            let processed = primes.len() as u64;
            let eta_secs = compute_eta(processed, total, start_time.elapsed().as_secs_f64());
            progress_cb(Progress {
                processed,
                total,
                eta_secs,
            });

            log::info!(
                "Group {} completed. Overall progress: {:.1}%",
                group_index,
                (processed as f64 / total as f64) * 100.0
            );
        }

        if primes.len() < count {
            return Err(SieveError::Exhausted {
                requested: count,
                found: primes.len(),
                max_value,
            });
        }

        progress_cb(Progress {
            processed: total,
            total,
            eta_secs: Some(0),
        });
        log::info!(
            "Generated {} primes in {:.3}s",
            primes.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(primes)
    }
}

/// 1 ブロックを篩う。パニックは握りつぶさず `WorkerFailure` として返す。
fn run_block(
    block: BlockDescriptor,
    base_primes: &[u64],
    marker: &dyn FlagMarker,
) -> PrimeResult<Vec<u64>> {
    panic::catch_unwind(AssertUnwindSafe(|| sieve_block(block, base_primes, marker))).map_err(
        |payload| {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            SieveError::WorkerFailure {
                block_start: block.start,
                message,
            }
        },
    )
}

/// スケジューラを構築して最初の `count` 個の素数を求め、プールを停止してから返す。
pub fn generate_primes(cfg: &Config, count: usize) -> PrimeResult<Vec<u64>> {
    let scheduler = PrimeScheduler::new(cfg.clone())?;
    scheduler.generate_primes(count)
}
