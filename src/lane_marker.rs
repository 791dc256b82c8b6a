//! 2 と 3 の倍数を一括で消す「レーン並列マーカー」。
//!
//! フラグバッファの添字 `i` は値 `start + i` を表し、偶数または 3 の倍数なら 0、
//! それ以外なら 1 を書き込む。戻り値は「奇数かつ 3 の倍数」として消した個数で、
//! 呼び出し側はこれを使って候補数を再走査なしで求める。
//!
//! レーン幅 `W`（偶数）の窓 `k` が表す値の mod 6 は `k mod 3` だけで決まるため、
//! 3 種類の位相パターンを一度だけ作り、窓ごとに順番に書き込めばよい。
//! 端数（`W` に満たない末尾）はスカラーで処理する。
//!
//! - `ScalarMarker`: 参照実装。正しさの基準
//! - `LaneMarker<W>`: 固定幅配列のチャンクコピー（移植性あり、コンパイラがベクトル化する）
//! - `Avx2Marker`: x86_64 の AVX2 32 バイトストア。実行時に検出できた場合のみ生成される

use std::sync::OnceLock;

use crate::config::MarkerKind;

/// フラグバッファに 2 と 3 の倍数を書き込む実装の共通インターフェース。
///
/// 実装はどれも、任意の `start` と長さについて同じフラグ列と同じ戻り値を返すこと。
pub trait FlagMarker: Send + Sync {
    fn name(&self) -> &'static str;

    /// 1 回の書き込みで扱う要素数（スカラーは 1）。
    fn lanes(&self) -> usize;

    /// `flags` 全体を上書きし、奇数かつ 3 の倍数として 0 にした個数を返す。
    fn mark(&self, flags: &mut [u8], start: u64) -> u64;
}

/// 1 要素ずつ mod 6 の剰余を進めながら書き込む参照実装。
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarMarker;

impl FlagMarker for ScalarMarker {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn lanes(&self) -> usize {
        1
    }

    fn mark(&self, flags: &mut [u8], start: u64) -> u64 {
        mark_scalar(flags, start)
    }
}

fn mark_scalar(flags: &mut [u8], start: u64) -> u64 {
    let mut residue = start % 6;
    let mut marked = 0u64;
    for flag in flags.iter_mut() {
        *flag = match residue {
            1 | 5 => 1,
            3 => {
                marked += 1;
                0
            }
            _ => 0,
        };
        residue = if residue == 5 { 0 } else { residue + 1 };
    }
    marked
}

/// 3 つの位相パターンと、それぞれに含まれる「奇数の 3 の倍数」の個数。
struct PhasePatterns<const LANES: usize> {
    fill: [[u8; LANES]; 3],
    multiples_of_3: [u64; 3],
}

impl<const LANES: usize> PhasePatterns<LANES> {
    fn new(start: u64) -> Self {
        let mut fill = [[0u8; LANES]; 3];
        let mut multiples_of_3 = [0u64; 3];
        for (phase, pattern) in fill.iter_mut().enumerate() {
            let window_start = start.wrapping_add((phase * LANES) as u64);
            multiples_of_3[phase] = mark_scalar(pattern, window_start);
        }
        Self {
            fill,
            multiples_of_3,
        }
    }
}

/// 固定幅 `LANES` のパターンをチャンク単位でコピーする移植性のある実装。
///
/// `LANES` は偶数でなければならない（3 窓で mod 6 が一周する前提）。
#[derive(Debug, Default, Clone, Copy)]
pub struct LaneMarker<const LANES: usize>;

/// 既定のレーン幅（AVX-512 の 1 レジスタ分）。
pub const DEFAULT_LANES: usize = 64;

impl<const LANES: usize> LaneMarker<LANES> {
    const VALID_WIDTH: () = assert!(LANES > 0 && LANES % 2 == 0, "LANES must be even");
}

impl<const LANES: usize> FlagMarker for LaneMarker<LANES> {
    fn name(&self) -> &'static str {
        "lanes"
    }

    fn lanes(&self) -> usize {
        LANES
    }

    fn mark(&self, flags: &mut [u8], start: u64) -> u64 {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_WIDTH;

        let patterns = PhasePatterns::<LANES>::new(start);
        let body_len = flags.len() - flags.len() % LANES;
        let mut marked = 0u64;
        let mut phase = 0usize;

        let mut windows = flags.chunks_exact_mut(LANES);
        for window in &mut windows {
            window.copy_from_slice(&patterns.fill[phase]);
            marked += patterns.multiples_of_3[phase];
            phase = if phase == 2 { 0 } else { phase + 1 };
        }

        marked + mark_scalar(windows.into_remainder(), start + body_len as u64)
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::{__m256i, _mm256_loadu_si256, _mm256_storeu_si256};

    use super::PhasePatterns;

    pub(super) const LANES: usize = 32;

    /// 窓ごとに 32 バイトストアを行い、書き込んだ長さと 3 の倍数の個数を返す。
    ///
    /// # Safety
    /// 呼び出し元は AVX2 が利用可能であることを確認していなければならない。
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn fill(flags: &mut [u8], patterns: &PhasePatterns<LANES>) -> (usize, u64) {
        let vectors: [__m256i; 3] = [
            _mm256_loadu_si256(patterns.fill[0].as_ptr().cast()),
            _mm256_loadu_si256(patterns.fill[1].as_ptr().cast()),
            _mm256_loadu_si256(patterns.fill[2].as_ptr().cast()),
        ];
        let windows = flags.len() / LANES;
        let ptr = flags.as_mut_ptr();
        let mut marked = 0u64;
        let mut phase = 0usize;
        for w in 0..windows {
            _mm256_storeu_si256(ptr.add(w * LANES).cast(), vectors[phase]);
            marked += patterns.multiples_of_3[phase];
            phase = if phase == 2 { 0 } else { phase + 1 };
        }
        (windows * LANES, marked)
    }
}

/// AVX2 の 32 バイトストアでパターンを書き込む実装。
///
/// `Avx2Marker::detect` が `Some` を返した環境でのみ生成できる。
#[derive(Debug, Clone, Copy)]
pub struct Avx2Marker {
    _detected: (),
}

impl Avx2Marker {
    pub fn detect() -> Option<Self> {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return Some(Self { _detected: () });
            }
        }
        None
    }
}

impl FlagMarker for Avx2Marker {
    fn name(&self) -> &'static str {
        "avx2"
    }

    fn lanes(&self) -> usize {
        32
    }

    #[cfg(target_arch = "x86_64")]
    fn mark(&self, flags: &mut [u8], start: u64) -> u64 {
        let patterns = PhasePatterns::<{ avx2::LANES }>::new(start);
        // SAFETY: Avx2Marker は detect() で AVX2 を確認した場合にしか生成されない。
        let (body_len, marked) = unsafe { avx2::fill(flags, &patterns) };
        marked + mark_scalar(&mut flags[body_len..], start + body_len as u64)
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn mark(&self, flags: &mut [u8], start: u64) -> u64 {
        mark_scalar(flags, start)
    }
}

static DETECTED_KIND: OnceLock<MarkerKind> = OnceLock::new();
static AVX2_MARKER: OnceLock<Option<Avx2Marker>> = OnceLock::new();
static SCALAR_MARKER: ScalarMarker = ScalarMarker;
static LANE_MARKER: LaneMarker<DEFAULT_LANES> = LaneMarker;

fn avx2_marker() -> Option<&'static Avx2Marker> {
    AVX2_MARKER.get_or_init(Avx2Marker::detect).as_ref()
}

/// 実行環境で最速と判断したマーカー種別（`Auto` 以外）を返す。結果はキャッシュされる。
pub fn detect_marker_kind() -> MarkerKind {
    *DETECTED_KIND.get_or_init(|| {
        if avx2_marker().is_some() {
            MarkerKind::Avx2
        } else {
            MarkerKind::Lanes
        }
    })
}

/// 設定に応じたマーカーを返す。
///
/// `Avx2` を要求されても CPU が対応していない場合は `Lanes` に落とす。
pub fn select_marker(kind: MarkerKind) -> &'static dyn FlagMarker {
    match kind {
        MarkerKind::Scalar => &SCALAR_MARKER,
        MarkerKind::Lanes => &LANE_MARKER,
        MarkerKind::Avx2 => {
            if let Some(m) = avx2_marker() {
                return m;
            }
            log::warn!("AVX2 was requested but is not available; using lane marker");
            &LANE_MARKER
        }
        MarkerKind::Auto => select_marker(detect_marker_kind()),
    }
}

/// この CPU で使えるマーカーをすべて返す（実装間の突き合わせ用）。
pub fn available_markers() -> Vec<&'static dyn FlagMarker> {
    let mut markers: Vec<&'static dyn FlagMarker> = Vec::with_capacity(3);
    markers.push(&SCALAR_MARKER);
    markers.push(&LANE_MARKER);
    if let Some(m) = avx2_marker() {
        markers.push(m);
    }
    markers
}
