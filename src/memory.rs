use sysinfo::System;

use crate::config::MAX_BLOCK_LENGTH;

/// 自動決定するブロック長の下限。
pub const MIN_AUTO_BLOCK_LENGTH: u64 = 1 << 16;

/// システムの物理メモリ総量を取得（バイト単位）
pub fn get_total_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.total_memory()
}

/// ブロックあたりのメモリ使用量を推定（バイト単位）
///
/// フラグ 1 値 1 バイト + 結果ベクタ（素数密度はおおよそ 1/ln(x) だが、
/// 上限として 2・3 の倍数を除いた 1/3 を u64 で見積もる）。
pub fn estimate_block_memory(block_length: u64) -> u64 {
    let flags = block_length;
    let results = block_length / 3 * 8;
    flags + results
}

/// メモリ制限に基づいて最適なブロック長を計算
/// memory_usage_percent: システムメモリの何%まで使用するか (10.0 ~ 90.0)
/// num_threads: 同時に篩うブロック数（ワーカースレッド数）
pub fn calculate_optimal_block_length(memory_usage_percent: f64, num_threads: usize) -> u64 {
    let total_memory = get_total_memory();

    let percent = memory_usage_percent.clamp(10.0, 90.0);
    let allowed_memory = (total_memory as f64 * percent / 100.0) as u64;

    // 実行中のブロックに加え、出力待ちの結果も同じだけ抱えうるため 2 倍で割る
    let safety_factor = 2;
    let per_thread_memory = allowed_memory / (num_threads as u64).max(1) / safety_factor;

    // estimate_block_memory(len) ≈ len * (1 + 8/3) = per_thread_memory
    let block_length = per_thread_memory * 3 / 11;

    block_length.clamp(MIN_AUTO_BLOCK_LENGTH, MAX_BLOCK_LENGTH)
}

/// メモリ使用量の情報を表示用に取得
pub fn get_memory_info(block_length: u64, num_threads: usize) -> MemoryInfo {
    let total_memory = get_total_memory();
    let block_memory = estimate_block_memory(block_length);
    let estimated_total = block_memory * num_threads as u64;
    let usage_percent = if total_memory > 0 {
        (estimated_total as f64 / total_memory as f64) * 100.0
    } else {
        0.0
    };

    MemoryInfo {
        total_memory,
        block_memory,
        estimated_total,
        usage_percent,
    }
}

#[derive(Debug, Clone)]
pub struct MemoryInfo {
    pub total_memory: u64,
    pub block_memory: u64,
    pub estimated_total: u64,
    pub usage_percent: f64,
}

impl MemoryInfo {
    pub fn format(&self) -> String {
        format!(
            "memory: system {:.1}GB, per block {:.1}MB, estimated peak {:.1}MB ({:.1}%)",
            self.total_memory as f64 / (1024.0 * 1024.0 * 1024.0),
            self.block_memory as f64 / (1024.0 * 1024.0),
            self.estimated_total as f64 / (1024.0 * 1024.0),
            self.usage_percent
        )
    }
}
