use parallel_primes::config::{load_config_from, Config, MarkerKind, OutputFormat};
use parallel_primes::SieveError;

#[test]
fn defaults_are_valid() {
    let cfg = Config::default();
    cfg.validate().expect("default config must validate");
    assert_eq!(cfg.base_limit(), 1 << 16);
    assert_eq!(cfg.marker, MarkerKind::Auto);
}

#[test]
fn partial_toml_is_filled_with_defaults() {
    let cfg: Config = toml::from_str(
        r#"
max_value = 1000000
worker_threads = 8
marker = "Scalar"
output_format = "JSON"
"#,
    )
    .expect("parse");
    assert_eq!(cfg.max_value, 1_000_000);
    assert_eq!(cfg.worker_threads, 8);
    assert_eq!(cfg.marker, MarkerKind::Scalar);
    assert_eq!(cfg.output_format, OutputFormat::JSON);
    assert_eq!(cfg.block_length, Config::default().block_length);
    assert_eq!(cfg.small_sieve_ceiling, 1 << 20);
}

#[test]
fn settings_round_trip_through_a_file() {
    let path = std::env::temp_dir().join(format!("parallel-primes-{}.toml", std::process::id()));
    let cfg = Config {
        max_value: 123_456,
        block_length: 4_096,
        ..Config::default()
    };
    std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
    let loaded = load_config_from(&path).expect("load");
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.max_value, 123_456);
    assert_eq!(loaded.block_length, 4_096);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_config_from("/nonexistent/parallel-primes/settings.toml").unwrap_err();
    assert!(matches!(err, SieveError::Io(_)), "{err}");
}

#[test]
fn validation_rejects_bad_values() {
    let too_small = Config {
        max_value: 1,
        ..Config::default()
    };
    assert!(matches!(too_small.validate(), Err(SieveError::Configuration(_))));

    let too_long = Config {
        block_length: (1 << 32) + 1,
        ..Config::default()
    };
    assert!(matches!(too_long.validate(), Err(SieveError::Configuration(_))));

    let over_ceiling = Config {
        max_value: u64::MAX,
        ..Config::default()
    };
    assert!(matches!(over_ceiling.validate(), Err(SieveError::Configuration(_))));
}
