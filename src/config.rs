use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::engine_types::{PrimeResult, SieveError};
use crate::sieve_math::integer_sqrt;

/// 1 ブロックに割り当てられるフラグ数の上限（フラグ 1 個 = 1 バイト）。
pub const MAX_BLOCK_LENGTH: u64 = 1 << 32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    CSV,
    JSON,
    Binary,
}

/// 2 と 3 の倍数を消すマーカーの実装選択。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// 1 要素ずつ処理する参照実装
    Scalar,
    /// 固定幅パターンのチャンクコピー（移植性のあるレーン並列実装）
    Lanes,
    /// AVX2 の 32 バイトストア（x86_64 のみ）
    Avx2,
    /// 実行時に CPU 機能を検出して選ぶ
    Auto,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// 探索範囲の上端（この値は含まない）
    #[serde(default = "default_max_value")]
    pub max_value: u64,
    /// 基底素数の篩に許すサイズの安全上限
    #[serde(default = "default_small_sieve_ceiling")]
    pub small_sieve_ceiling: u64,
    /// ワーカースレッド数。0 なら論理 CPU 数
    #[serde(default)]
    pub worker_threads: usize,
    /// 1 タスクが篩う値の個数。0 ならシステムメモリから自動決定
    #[serde(default = "default_block_length")]
    pub block_length: u64,
    #[serde(default = "default_memory_usage_percent")]
    pub memory_usage_percent: f64,
    #[serde(default = "default_marker")]
    pub marker: MarkerKind,
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    #[serde(default = "default_writer_buffer_size")]
    pub writer_buffer_size: usize,
}

fn default_max_value() -> u64 {
    1 << 32
}

fn default_small_sieve_ceiling() -> u64 {
    1 << 20
}

fn default_block_length() -> u64 {
    2_000_000
}

fn default_memory_usage_percent() -> f64 {
    50.0
}

fn default_marker() -> MarkerKind {
    MarkerKind::Auto
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Text
}

fn default_writer_buffer_size() -> usize {
    8 * 1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_value: default_max_value(),
            small_sieve_ceiling: default_small_sieve_ceiling(),
            worker_threads: 0,
            block_length: default_block_length(),
            memory_usage_percent: default_memory_usage_percent(),
            marker: default_marker(),
            output_format: default_output_format(),
            writer_buffer_size: default_writer_buffer_size(),
        }
    }
}

impl Config {
    /// 基底素数の上限 `isqrt(max_value)`。これ以下の素数をすべて基底素数とする。
    pub fn base_limit(&self) -> u64 {
        integer_sqrt(self.max_value)
    }

    /// 並列処理を始める前に設定値を検査する。
    pub fn validate(&self) -> PrimeResult<()> {
        if self.max_value < 2 {
            return Err(SieveError::Configuration(format!(
                "max_value must be >= 2 (got {})",
                self.max_value
            )));
        }
        if self.block_length > MAX_BLOCK_LENGTH {
            return Err(SieveError::Configuration(format!(
                "block_length {} exceeds the maximum block length ({MAX_BLOCK_LENGTH})",
                self.block_length
            )));
        }
        let base_limit = self.base_limit();
        if base_limit > self.small_sieve_ceiling {
            return Err(SieveError::Configuration(format!(
                "base prime bound {base_limit} exceeds the maximum small prime value ({})",
                self.small_sieve_ceiling
            )));
        }
        Ok(())
    }
}

const SETTINGS_FILE: &str = "settings.toml";

pub fn load_or_create_config() -> PrimeResult<Config> {
    if Path::new(SETTINGS_FILE).exists() {
        load_config_from(SETTINGS_FILE)
    } else {
        let cfg = Config::default();
        save_config(&cfg)?;
        Ok(cfg)
    }
}

/// 指定パスの TOML から設定を読み込む。存在しないキーはデフォルト値で補う。
pub fn load_config_from<P: AsRef<Path>>(path: P) -> PrimeResult<Config> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let cfg = toml::from_str(&contents)?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> PrimeResult<()> {
    let toml_str = toml::to_string_pretty(cfg)?;
    let file = File::create(SETTINGS_FILE)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(toml_str.as_bytes())?;
    writer.flush()?;
    Ok(())
}
