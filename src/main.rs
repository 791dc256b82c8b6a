use std::io;
use std::process::ExitCode;

use parallel_primes::config::{load_config_from, load_or_create_config, Config};
use parallel_primes::output::{emit_primes, StreamPrimeWriter, SummarySink};
use parallel_primes::prime_pi_engine::compute_prime_pi;
use parallel_primes::verify::verify_first_primes;
use parallel_primes::{PrimeResult, PrimeScheduler};

const USAGE: &str = "Usage: parallel-primes --count <n> [--config <path>] [--verify] [--summary]\n       parallel-primes --prime-pi <x>";

/// 末尾から Miller-Rabin で確認する件数。
const VERIFY_SAMPLE_TAIL: usize = 1_000;

enum Command {
    Generate {
        count: usize,
        config_path: Option<String>,
        verify: bool,
        summary: bool,
    },
    PrimePi(u64),
}

fn main() -> ExitCode {
    env_logger::init();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let result = match command {
        Command::PrimePi(x) => compute_prime_pi(x).map(|pi| println!("pi({x}) = {pi}")),
        Command::Generate {
            count,
            config_path,
            verify,
            summary,
        } => run_generate(count, config_path.as_deref(), verify, summary),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut count: Option<usize> = None;
    let mut config_path = None;
    let mut verify = false;
    let mut summary = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--count" => {
                let v = args.next().ok_or("--count requires a value")?;
                count = Some(v.parse().map_err(|e| format!("Invalid count {v}: {e}"))?);
            }
            "--config" => {
                config_path = Some(args.next().ok_or("--config requires a path")?);
            }
            "--verify" => verify = true,
            "--summary" => summary = true,
            "--prime-pi" => {
                let v = args.next().ok_or("--prime-pi requires a value")?;
                let x: u64 = v.parse().map_err(|e| format!("Invalid x for --prime-pi: {v} ({e})"))?;
                return Ok(Command::PrimePi(x));
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    let count = count.ok_or("--count is required")?;
    Ok(Command::Generate {
        count,
        config_path,
        verify,
        summary,
    })
}

fn run_generate(
    count: usize,
    config_path: Option<&str>,
    verify: bool,
    summary: bool,
) -> PrimeResult<()> {
    let cfg: Config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_or_create_config()?,
    };
    let output_format = cfg.output_format;
    let buf_size = cfg.writer_buffer_size;

    let primes = {
        let scheduler = PrimeScheduler::new(cfg)?;
        scheduler.generate_primes_with_progress(count, |progress| {
            log::info!(
                "progress: {}/{} primes, eta {:?}s",
                progress.processed,
                progress.total,
                progress.eta_secs
            );
        })?
    };

    if verify {
        let report = verify_first_primes(&primes, VERIFY_SAMPLE_TAIL)?;
        log::info!("{report:?}");
    }

    if summary {
        let mut sink = SummarySink::new();
        emit_primes(&primes, &mut sink)?;
        println!("{sink}");
        return Ok(());
    }

    let stdout = io::stdout().lock();
    let mut writer = StreamPrimeWriter::new(stdout, output_format, buf_size);
    emit_primes(&primes, &mut writer)?;
    Ok(())
}
