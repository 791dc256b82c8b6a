use parallel_primes::sieve_math::{count_odd_in, integer_sqrt, simple_sieve};

#[test]
fn integer_sqrt_matches_known_values() {
    assert_eq!(integer_sqrt(0), 0);
    assert_eq!(integer_sqrt(1), 1);
    assert_eq!(integer_sqrt(3), 1);
    assert_eq!(integer_sqrt(4), 2);
    assert_eq!(integer_sqrt(99), 9);
    assert_eq!(integer_sqrt(100), 10);
    assert_eq!(integer_sqrt(1 << 32), 1 << 16);
    assert_eq!(integer_sqrt(i32::MAX as u64), 46_340);
    assert_eq!(integer_sqrt(u64::MAX), u32::MAX as u64);
}

#[test]
fn count_odd_handles_every_parity() {
    assert_eq!(count_odd_in(0, 0), 0);
    assert_eq!(count_odd_in(0, 1), 0);
    assert_eq!(count_odd_in(1, 1), 1);
    assert_eq!(count_odd_in(1, 4), 2);
    assert_eq!(count_odd_in(2, 5), 2);
    assert_eq!(count_odd_in(3, 5), 3);
    assert_eq!(count_odd_in(100, 50), 25);
}

#[test]
fn simple_sieve_small_limits() {
    assert!(simple_sieve(0).is_empty());
    assert!(simple_sieve(1).is_empty());
    assert_eq!(simple_sieve(2), vec![2]);
    assert_eq!(simple_sieve(30), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    assert_eq!(simple_sieve(1_000_000).len(), 78_498);
}
