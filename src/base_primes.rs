use crate::engine_types::{PrimeResult, SieveError};
use crate::flags::FlagBuffer;
use crate::lane_marker::FlagMarker;
use crate::sieve_math::integer_sqrt;

/// `bound` 以下の全素数（昇順）。構築後は読み取り専用で、全ブロックから共有される。
#[derive(Debug, Clone)]
pub struct BasePrimes {
    bound: u64,
    primes: Vec<u64>,
}

impl BasePrimes {
    /// 篩った範囲の上端（この値を含む）。
    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.primes
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn into_vec(self) -> Vec<u64> {
        self.primes
    }
}

/// `[0, bound]` の基底素数を求める。
///
/// `bound` が `ceiling` を超える場合は確保前に `SieveError::Configuration` を返す。
pub fn compute_base_primes(
    bound: u64,
    ceiling: u64,
    marker: &dyn FlagMarker,
) -> PrimeResult<BasePrimes> {
    let buffer = sieve_base_buffer(bound, ceiling, marker)?;
    log::debug!(
        "base sieve [0, {bound}] found {} primes",
        buffer.candidates()
    );
    Ok(BasePrimes {
        bound,
        primes: buffer.into_primes(),
    })
}

/// 基底篩を実行し、素数の抽出前のフラグバッファを返す。
///
/// 2 と 3 の倍数はマーカーで消えているので、5 以上の各素数 `i` について
/// `5i` から始まる奇数倍（`2i` 刻み）だけを消せばよい。
pub fn sieve_base_buffer(
    bound: u64,
    ceiling: u64,
    marker: &dyn FlagMarker,
) -> PrimeResult<FlagBuffer> {
    if bound > ceiling {
        return Err(SieveError::Configuration(format!(
            "the value {bound} exceeds the maximum small prime value ({ceiling})"
        )));
    }
    let len = usize::try_from(bound + 1).map_err(|_| {
        SieveError::Configuration(format!("small sieve bound {bound} does not fit in memory"))
    })?;

    let mut buffer = FlagBuffer::new(0, len, marker);

    let root = integer_sqrt(bound) as usize;
    for i in 5..=root {
        if buffer.is_candidate(i) {
            buffer.strike_every(5 * i, 2 * i);
        }
    }

    Ok(buffer)
}
