use parallel_primes::config::{Config, OutputFormat};
use parallel_primes::generate_primes;
use parallel_primes::output::{emit_primes, PrimeSink, StreamPrimeWriter, SummarySink};

fn render(primes: &[u64], format: OutputFormat) -> Vec<u8> {
    let mut writer = StreamPrimeWriter::new(Vec::new(), format, 16);
    emit_primes(primes, &mut writer).expect("emit");
    assert_eq!(writer.total_primes_written(), primes.len() as u64);
    writer.into_inner().expect("into_inner")
}

#[test]
fn text_format_writes_one_prime_per_line() {
    assert_eq!(render(&[2, 3, 5], OutputFormat::Text), b"2\n3\n5\n");
    assert!(render(&[], OutputFormat::Text).is_empty());
}

#[test]
fn csv_format() {
    assert_eq!(render(&[2, 3], OutputFormat::CSV), b"2,\n3,\n");
}

#[test]
fn json_format_is_an_array() {
    assert_eq!(render(&[2, 3, 5, 7], OutputFormat::JSON), b"[2,3,5,7]");
    assert_eq!(render(&[], OutputFormat::JSON), b"[]");
}

#[test]
fn binary_format_is_little_endian_u64() {
    let bytes = render(&[2, 4_294_967_291], OutputFormat::Binary);
    assert_eq!(bytes.len(), 16);
    assert_eq!(u64::from_le_bytes(bytes[..8].try_into().unwrap()), 2);
    assert_eq!(
        u64::from_le_bytes(bytes[8..].try_into().unwrap()),
        4_294_967_291
    );
}

#[test]
fn finish_is_idempotent() {
    let mut writer = StreamPrimeWriter::new(Vec::new(), OutputFormat::JSON, 4);
    writer.write_prime(2).unwrap();
    writer.finish().unwrap();
    writer.finish().unwrap();
    assert_eq!(writer.into_inner().unwrap(), b"[2]");
}

#[test]
fn summary_sink_keeps_count_and_endpoints() {
    let mut summary = SummarySink::new();
    assert_eq!(summary.to_string(), "0 primes");
    assert!(summary.is_strictly_ascending());

    emit_primes(&[2, 3, 5, 7, 11], &mut summary).unwrap();
    assert_eq!(summary.count(), 5);
    assert_eq!(summary.first(), Some(2));
    assert_eq!(summary.last(), Some(11));
    assert!(summary.is_strictly_ascending());
    assert_eq!(summary.to_string(), "5 primes, first = 2, last = 11");
}

#[test]
fn summary_sink_notices_out_of_order_input() {
    let mut summary = SummarySink::new();
    emit_primes(&[2, 3, 3, 7, 5], &mut summary).unwrap();
    assert_eq!(summary.count(), 5);
    assert_eq!(summary.last(), Some(5));
    assert!(!summary.is_strictly_ascending());
}

/// スケジューラの出力をそのまま流したときの要約。
#[test]
fn summary_of_generated_primes() {
    let cfg = Config {
        max_value: 1_000_000,
        worker_threads: 2,
        block_length: 5_000,
        ..Config::default()
    };
    let primes = generate_primes(&cfg, 10_000).expect("generate");
    let mut summary = SummarySink::new();
    emit_primes(&primes, &mut summary).unwrap();
    assert_eq!(summary.to_string(), "10000 primes, first = 2, last = 104729");
    assert!(summary.is_strictly_ascending());
}
