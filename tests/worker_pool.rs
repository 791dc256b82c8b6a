#![cfg(target_os = "linux")]
//! ワーカースレッドの後始末を /proc/self/task で確かめる。
//! 他のテストのプールと混ざらないよう、このバイナリにはテストを 1 つだけ置く。

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use parallel_primes::config::{Config, MarkerKind};
use parallel_primes::sieve_math::simple_sieve;
use parallel_primes::worker_pool::WORKER_NAME_PREFIX;
use parallel_primes::{generate_primes, PrimeScheduler};

/// 名前が `sieve-worker-` で始まる生存スレッドの数。
fn live_sieve_workers() -> usize {
    let Ok(tasks) = fs::read_dir("/proc/self/task") else {
        return 0;
    };
    tasks
        .filter_map(Result::ok)
        .filter_map(|task| fs::read_to_string(task.path().join("comm")).ok())
        .filter(|comm| comm.trim_end().starts_with(WORKER_NAME_PREFIX))
        .count()
}

/// join 済みスレッドがカーネルから消えるまでのごく短い猶予だけ待つ。
fn settled_sieve_workers() -> usize {
    let deadline = Instant::now() + Duration::from_millis(20);
    loop {
        let live = live_sieve_workers();
        if live == 0 || Instant::now() >= deadline {
            return live;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn no_worker_threads_survive_a_call() {
    let cfg = Config {
        max_value: 2_000_000,
        worker_threads: 8,
        block_length: 4_096,
        marker: MarkerKind::Auto,
        ..Config::default()
    };
    let expected = simple_sieve(200_000);

    assert_eq!(settled_sieve_workers(), 0);
    for _ in 0..5 {
        let primes = generate_primes(&cfg, 10_000).expect("generate");
        assert_eq!(primes.as_slice(), &expected[..10_000]);
        assert_eq!(settled_sieve_workers(), 0);
    }

    let scheduler = PrimeScheduler::new(cfg).expect("scheduler");
    scheduler.generate_primes(1_000).expect("generate");
    assert!(live_sieve_workers() > 0);
    drop(scheduler);
    assert_eq!(settled_sieve_workers(), 0);

    // 失敗した呼び出しでも残らない
    let bad = Config {
        max_value: 100,
        block_length: 7,
        worker_threads: 8,
        ..Config::default()
    };
    assert!(generate_primes(&bad, 26).is_err());
    assert_eq!(settled_sieve_workers(), 0);
}
