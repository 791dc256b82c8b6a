use crate::engine_types::{PrimeResult, SieveError};

/// primecount クレートを用いた素数計数関数 π(x)。
///
/// - 入力: `x`（x 以下の素数の個数を求める）
/// - 生成結果の検証（`verify` モジュール）と CLI の `--prime-pi` から使われる。
pub fn compute_prime_pi(x: u64) -> PrimeResult<u64> {
    // primecount::pi は i64 を受け取って i64 を返すため、u64 からの変換を行う。
    let x_i64: i64 = x.try_into().map_err(|e| {
        SieveError::Verification(format!("x is too large for primecount::pi (x={x}): {e}"))
    })?;
    let pi_i64 = primecount::pi(x_i64);
    Ok(pi_i64 as u64)
}
