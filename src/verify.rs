use crate::engine_types::{PrimeResult, SieveError};
use crate::prime_pi_engine::compute_prime_pi;

#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// 検証した素数の個数。
    pub count: u64,
    /// Miller-Rabin によって末尾から実際にチェックした件数。
    pub checked_tail: usize,
    /// 最初の値。
    pub first: Option<u64>,
    /// 最後の値。
    pub last: Option<u64>,
}

/// Miller–Rabin の証人。最初の 12 個の素数で 2^64 未満の全整数を正しく判定できる。
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// 64bit 整数の決定的素数判定。
pub fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    // 証人で割り切れるなら、その証人自身のときだけ素数
    if let Some(&w) = WITNESSES.iter().find(|&&w| n % w == 0) {
        return n == w;
    }

    let shift = (n - 1).trailing_zeros();
    let odd_part = (n - 1) >> shift;
    WITNESSES
        .iter()
        .all(|&w| witness_accepts(n, odd_part, shift, w))
}

/// `w^d, w^{2d}, ..., w^{2^{s-1} d}` のどこかで ±1 に当たれば「素数らしい」。
fn witness_accepts(n: u64, odd_part: u64, shift: u32, witness: u64) -> bool {
    let m = u128::from(n);
    let first = pow_mod(witness, odd_part, n);
    first == 1
        || std::iter::successors(Some(first), |&x| Some(x * x % m))
            .take(shift as usize)
            .any(|x| x == m - 1)
}

fn pow_mod(base: u64, mut exp: u64, modulus: u64) -> u128 {
    let m = u128::from(modulus);
    let mut square = u128::from(base) % m;
    let mut acc = 1u128;
    while exp != 0 {
        if exp & 1 == 1 {
            acc = acc * square % m;
        }
        square = square * square % m;
        exp >>= 1;
    }
    acc
}

/// 「最初の N 個の素数」であるはずの列を検証する。
///
/// - 2 から始まり、狭義単調増加であること
/// - 末尾 `sample_tail` 件が Miller-Rabin で素数であること
/// - 最後の値 `p` について π(p) == N であること（途中の欠落・混入を検出）
pub fn verify_first_primes(primes: &[u64], sample_tail: usize) -> PrimeResult<VerifyReport> {
    let Some(&last) = primes.last() else {
        return Ok(VerifyReport {
            count: 0,
            checked_tail: 0,
            first: None,
            last: None,
        });
    };

    if primes[0] != 2 {
        return Err(SieveError::Verification(format!(
            "sequence must start at 2, got {}",
            primes[0]
        )));
    }

    for (i, pair) in primes.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(SieveError::Verification(format!(
                "non-increasing sequence at index {}: prev={}, current={}",
                i + 1,
                pair[0],
                pair[1]
            )));
        }
    }

    let tail_start = primes.len().saturating_sub(sample_tail);
    for (offset, &p) in primes[tail_start..].iter().enumerate() {
        if !is_prime_u64(p) {
            return Err(SieveError::Verification(format!(
                "composite value {p} at index {}",
                tail_start + offset
            )));
        }
    }

    let pi = compute_prime_pi(last)?;
    if pi != primes.len() as u64 {
        return Err(SieveError::Verification(format!(
            "pi({last}) = {pi}, but the sequence holds {} values",
            primes.len()
        )));
    }

    log::info!(
        "verified {} primes (last = {last}, tail checked = {})",
        primes.len(),
        primes.len() - tail_start
    );

    Ok(VerifyReport {
        count: primes.len() as u64,
        checked_tail: primes.len() - tail_start,
        first: Some(primes[0]),
        last: Some(last),
    })
}
