#![cfg(not(windows))]

use parallel_primes::config::Config;
use parallel_primes::prime_pi_engine::compute_prime_pi;
use parallel_primes::sieve_math::simple_sieve;
use parallel_primes::verify::{is_prime_u64, verify_first_primes};
use parallel_primes::{generate_primes, SieveError};

/// 小さい x に対して、既知の π(x) の値と一致することを確認する。
#[test]
fn prime_pi_small_values_match_known_results() {
    // 出典: 標準的な素数表 / OEIS A006880 など
    let cases: &[(u64, u64)] = &[
        (0, 0),
        (1, 0),
        (2, 1),
        (3, 2),
        (10, 4),
        (100, 25),
        (1_000, 168),
        (10_000, 1_229),
        (100_000, 9_592),
        (1_000_000, 78_498),
    ];

    for &(x, expected) in cases {
        let pi = compute_prime_pi(x).expect("primecount_pi failed");
        assert_eq!(pi, expected, "pi({x}) should be {expected}, got {pi}");
    }
}

#[test]
fn prime_pi_rejects_values_beyond_i64() {
    assert!(compute_prime_pi(u64::MAX).is_err());
}

#[test]
fn generated_primes_pass_verification() {
    let cfg = Config {
        max_value: 1 << 24,
        worker_threads: 4,
        block_length: 50_000,
        ..Config::default()
    };
    let primes = generate_primes(&cfg, 100_000).expect("generate");
    let report = verify_first_primes(&primes, 500).expect("verification");
    assert_eq!(report.count, 100_000);
    assert_eq!(report.checked_tail, 500);
    assert_eq!(report.first, Some(2));
    // 10 万番目の素数
    assert_eq!(report.last, Some(1_299_709));
}

#[test]
fn verification_detects_a_missing_prime() {
    let mut primes = simple_sieve(1_000);
    primes.remove(40);
    let err = verify_first_primes(&primes, 10).unwrap_err();
    assert!(matches!(err, SieveError::Verification(_)), "{err}");
}

#[test]
fn verification_detects_composites_and_ordering() {
    let mut composite_tail = simple_sieve(100);
    composite_tail.push(99);
    assert!(verify_first_primes(&composite_tail, 5).is_err());

    let mut unordered = simple_sieve(100);
    unordered.swap(3, 4);
    assert!(verify_first_primes(&unordered, 5).is_err());

    assert!(verify_first_primes(&[3, 5, 7], 3).is_err());
}

#[test]
fn empty_sequence_is_trivially_valid() {
    let report = verify_first_primes(&[], 10).expect("empty is valid");
    assert_eq!(report.count, 0);
    assert_eq!(report.last, None);
}

#[test]
fn miller_rabin_agrees_with_sieve() {
    let primes = simple_sieve(10_000);
    for n in 0..=10_000u64 {
        assert_eq!(is_prime_u64(n), primes.binary_search(&n).is_ok(), "n={n}");
    }
    assert!(is_prime_u64(4_294_967_291));
    assert!(is_prime_u64(18_446_744_073_709_551_557));
    assert!(!is_prime_u64(4_294_967_297)); // 641 * 6700417
}

/// 小さい証人だけでは見逃す強擬素数も合成数と判定する。
#[test]
fn strong_pseudoprimes_are_rejected() {
    // 証人 2, 3, 5, 7 をすり抜ける
    assert!(!is_prime_u64(3_215_031_751));
    // 証人 2〜23 をすり抜ける
    assert!(!is_prime_u64(3_825_123_056_546_413_051));
    assert!(!is_prime_u64(37 * 41));
    assert!(is_prime_u64(37));
    assert!(is_prime_u64(41));
}
