use thiserror::Error;

// 篩エンジン（基底素数・ブロック篩・スケジューラ）で共有するエラー型と進捗情報の定義。
//
// - 呼び出し側は `SieveError` の種類で「設定の誤り」と「範囲の枯渇」を区別できます。
// - `Progress` のフィールド意味は CLI 側の表示に直結するため、互換性を壊さないようにしてください。

/// エンジン共通のエラー型。
#[derive(Debug, Error)]
pub enum SieveError {
    /// 設定値が不正、または基底素数の上限が安全上限を超えている。
    /// 並列処理を始める前に同期的に返されます。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 探索範囲 `[0, max_value)` をすべて篩っても要求数に届かなかった。
    #[error("search range [0, {max_value}) exhausted: requested {requested} primes, found {found}")]
    Exhausted {
        requested: usize,
        found: usize,
        max_value: u64,
    },

    /// ブロック篩タスクが異常終了した。
    #[error("worker failed while sieving block starting at {block_start}: {message}")]
    WorkerFailure { block_start: u64, message: String },

    #[error("failed to build worker pool: {0}")]
    Pool(String),

    #[error("verification failed: {0}")]
    Verification(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl SieveError {
    /// 要求数を減らせば再試行できる種類のエラーかどうか。
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SieveError::Exhausted { .. })
    }
}

/// エンジン共通の結果型。
pub type PrimeResult<T> = Result<T, SieveError>;

/// 素数生成処理の進捗情報。
///
/// 呼び出し側とは次の「契約」を満たす必要があります:
/// - `processed` と `total` は単調に増加する（逆戻りしない）こと
/// - `processed <= total` を維持すること（ETA 計算で使用）
/// - `eta_secs` は「残り時間の概算」であり、`None` の場合は「まだ計算できない」ことを意味すること
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// これまでに出力列へ追加した素数の個数。
    pub processed: u64,
    /// 要求された素数の個数。
    pub total: u64,
    /// 推定残り時間（秒）。まだ計算できない場合は None。
    pub eta_secs: Option<u64>,
}

/// 現在の進捗と経過時間から ETA（残り時間の秒数）を推定するユーティリティ。
///
/// - `processed` / `total` は 0 以上で、`processed <= total` を想定しています。
/// - 進捗 0% の間は `None` を返し、ある程度進んでから ETA を表示する前提です。
pub fn compute_eta(processed: u64, total: u64, elapsed_secs: f64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    let progress = processed.min(total) as f64 / total as f64;
    if progress > 0.0 {
        let total_time = elapsed_secs / progress;
        Some(((total_time - elapsed_secs).max(0.0)).round() as u64)
    } else {
        None
    }
}
