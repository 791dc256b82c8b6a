use std::io;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::engine_types::{PrimeResult, SieveError};

/// ワーカースレッド名の接頭辞。
pub const WORKER_NAME_PREFIX: &str = "sieve-worker-";

/// 固定サイズの rayon プールと、そのワーカースレッドの JoinHandle。
///
/// 破棄時にプールを閉じたあと全ワーカーを join するので、
/// drop から戻った時点でワーカースレッドは 1 本も残っていない。
pub struct WorkerPool {
    pool: ManuallyDrop<ThreadPool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WorkerPool {
    /// `num_threads` 本のワーカーでプールを作る。0 なら論理 CPU 数。
    pub fn new(num_threads: usize) -> PrimeResult<Self> {
        let handles: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::default();
        let registry = Arc::clone(&handles);

        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|i| format!("{WORKER_NAME_PREFIX}{i}"))
            .spawn_handler(move |worker| {
                let mut spawner = thread::Builder::new();
                if let Some(name) = worker.name() {
                    spawner = spawner.name(name.to_owned());
                }
                if let Some(size) = worker.stack_size() {
                    spawner = spawner.stack_size(size);
                }
                let handle = spawner.spawn(move || worker.run())?;
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(handle);
                Ok::<(), io::Error>(())
            });
        if num_threads > 0 {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder
            .build()
            .map_err(|e| SieveError::Pool(e.to_string()))?;

        Ok(Self {
            pool: ManuallyDrop::new(pool),
            handles,
        })
    }

    pub fn current_num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// `op` をプール内で実行し、完了まで呼び出しスレッドをブロックする。
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // SAFETY: pool を取り出すのはここ 1 回だけで、以降は触れない
        let pool = unsafe { ManuallyDrop::take(&mut self.pool) };
        drop(pool);

        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
        let count = handles.len();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("a sieve worker thread panicked during shutdown");
            }
        }
        log::debug!("worker pool shut down ({count} threads joined)");
    }
}
