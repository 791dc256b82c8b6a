pub mod config;
pub mod engine_types;
pub mod sieve_math;
pub mod lane_marker;
pub mod flags;
pub mod base_primes;
pub mod block_sieve;
pub mod scheduler;
pub mod memory;
pub mod output;
pub mod prime_pi_engine;
pub mod verify;
pub mod worker_pool;

pub use engine_types::{PrimeResult, SieveError};
pub use scheduler::{generate_primes, PrimeScheduler};
