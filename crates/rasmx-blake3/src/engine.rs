//! Engine facade: one-shot and background hashing.
//!
//! [`hash`] blocks the calling thread for the whole computation.
//! [`Engine::hash_async`] hands the same computation to a worker pool and
//! returns a [`HashTask`] that resolves to the identical digest. Tasks
//! cannot be cancelled; dropping a `HashTask` only discards its result.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::digest::Digest;
use crate::error::{HashError, Result};
use crate::hasher::Hasher;
use crate::parallel::hash_parallel;

/// Hash `input` in one call on the current thread.
///
/// # Example
///
/// ```
/// let digest = rasmx_blake3::hash(b"hello world");
/// assert_eq!(
///     digest.to_hex(),
///     "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
/// );
/// ```
#[must_use]
pub fn hash(input: &[u8]) -> Digest {
    let mut hasher = Hasher::new();
    hasher.absorb(input);
    hasher.root_digest()
}

/// Hash `input` on the default engine's worker pool.
///
/// See [`Engine::hash_async`].
pub fn hash_async(input: impl Into<Vec<u8>>) -> HashTask {
    Engine::global().hash_async(input)
}

/// Where background work runs.
#[derive(Clone)]
enum WorkerPool {
    /// rayon's process-wide pool
    Shared,
    /// Pool owned by this engine and its clones
    Dedicated(Arc<rayon::ThreadPool>),
}

impl WorkerPool {
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Shared => rayon::spawn(job),
            Self::Dedicated(pool) => pool.spawn(job),
        }
    }

    fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match self {
            Self::Shared => op(),
            Self::Dedicated(pool) => pool.install(op),
        }
    }

    fn threads(&self) -> usize {
        match self {
            Self::Shared => rayon::current_num_threads(),
            Self::Dedicated(pool) => pool.current_num_threads(),
        }
    }
}

/// Hashing engine bound to a worker pool.
///
/// Cloning is cheap and shares the pool. A dedicated pool shuts down when
/// the last clone (and the last task scheduled on it) is gone.
#[derive(Clone)]
pub struct Engine {
    pool: WorkerPool,
    config: EngineConfig,
}

impl Engine {
    /// Build an engine from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidConfig`] for a rejected configuration and
    /// [`HashError::WorkerPool`] if the dedicated pool cannot be started.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let pool = if config.uses_dedicated_pool() {
            let prefix = config.thread_name.clone();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .thread_name(move |index| format!("{prefix}-{index}"))
                .build()
                .map_err(|e| HashError::WorkerPool(e.to_string()))?;
            debug!(
                threads = config.worker_threads,
                name = %config.thread_name,
                "started dedicated hash pool"
            );
            WorkerPool::Dedicated(Arc::new(pool))
        } else {
            WorkerPool::Shared
        };

        Ok(Self { pool, config })
    }

    /// Process-wide default engine on rayon's shared pool.
    #[must_use]
    pub fn global() -> &'static Engine {
        static GLOBAL: OnceLock<Engine> = OnceLock::new();
        GLOBAL.get_or_init(|| Engine {
            pool: WorkerPool::Shared,
            config: EngineConfig::default(),
        })
    }

    /// Configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Worker threads available to this engine.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.pool.threads()
    }

    /// Hash `input`, blocking until done.
    ///
    /// Inputs of at least `parallel_threshold` bytes are split across the
    /// engine's pool; the digest is the same either way.
    #[must_use]
    pub fn hash(&self, input: &[u8]) -> Digest {
        if input.len() >= self.config.parallel_threshold {
            self.pool.install(|| hash_parallel(input))
        } else {
            hash(input)
        }
    }

    /// Schedule hashing of `input` on the worker pool.
    ///
    /// Exactly one pool task is queued per call. The returned
    /// [`HashTask`] resolves to the same digest [`Engine::hash`] gives.
    ///
    /// # Example
    ///
    /// ```
    /// use rasmx_blake3::{Engine, EngineConfig};
    ///
    /// # fn main() -> rasmx_blake3::Result<()> {
    /// let engine = Engine::new(EngineConfig::default().with_worker_threads(2))?;
    /// let task = engine.hash_async(b"hello world".to_vec());
    /// assert_eq!(task.wait()?, rasmx_blake3::hash(b"hello world"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn hash_async(&self, input: impl Into<Vec<u8>>) -> HashTask {
        let input = input.into();
        let (tx, rx) = oneshot::channel();
        let engine = self.clone();

        trace!(bytes = input.len(), "scheduling hash task");
        self.pool.spawn(move || {
            let digest = engine.hash(&input);
            if tx.send(digest).is_err() {
                trace!("hash task finished after its handle was dropped");
            }
        });

        HashTask { rx }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dedicated_pool", &self.config.uses_dedicated_pool())
            .field("threads", &self.worker_threads())
            .field("parallel_threshold", &self.config.parallel_threshold)
            .finish()
    }
}

/// Pending result of [`Engine::hash_async`].
///
/// Works under any executor. The computation was scheduled when the task
/// was created and runs to completion whether or not it is awaited.
#[must_use = "the digest is lost unless the task is awaited"]
#[derive(Debug)]
pub struct HashTask {
    rx: oneshot::Receiver<Digest>,
}

impl HashTask {
    /// Block the current thread until the digest is ready.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::TaskAborted`] if the worker died first.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an asynchronous runtime; `.await` the
    /// task there instead.
    pub fn wait(self) -> Result<Digest> {
        self.rx.blocking_recv().map_err(|_| HashError::TaskAborted)
    }
}

impl Future for HashTask {
    type Output = Result<Digest>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| HashError::TaskAborted))
    }
}
