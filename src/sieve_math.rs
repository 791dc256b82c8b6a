/// `n` 以下の最大の整数平方根を 2 分探索で求める。
pub fn integer_sqrt(n: u64) -> u64 {
    let mut low = 0u64;
    let mut high = n;
    while low <= high {
        let mid = low + ((high - low) >> 1);
        match mid.checked_mul(mid) {
            Some(val) if val == n => return mid,
            Some(val) if val < n => low = mid + 1,
            _ => high = mid - 1,
        }
    }
    high
}

/// 半開区間 `[start, start + len)` に含まれる奇数の個数。
pub fn count_odd_in(start: u64, len: u64) -> u64 {
    let end = start + len;
    end / 2 - start / 2
}

/// 単純なエラトステネスの篩で `[2, limit]` の素数を列挙する。
///
/// 高速化は一切していない参照実装で、分割篩の結果を突き合わせる基準として使う。
pub fn simple_sieve(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }

    let size = (limit + 1) as usize;
    let mut is_prime = vec![true; size];
    is_prime[0] = false;
    is_prime[1] = false;

    let lim_sqrt = integer_sqrt(limit);
    for i in 2..=lim_sqrt as usize {
        if is_prime[i] {
            let mut j = i * i;
            while j <= limit as usize {
                is_prime[j] = false;
                j += i;
            }
        }
    }

    let mut primes = Vec::new();
    for (i, &flag) in is_prime.iter().enumerate().skip(2) {
        if flag {
            primes.push(i as u64);
        }
    }
    primes
}
