use tracing::debug;

const MIN_THREADS: usize = 2;
const MAX_THREADS: usize = 32;

/// Runs `action` on a dedicated rayon pool sized for upstream fetches.
pub fn with_fetch_pool<T>(parallelism: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let threads = clamp_parallelism(parallelism);
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            debug!(error = %err, "fetch pool unavailable, running inline");
            action()
        }
    }
}

pub fn clamp_parallelism(requested: usize) -> usize {
    requested.clamp(MIN_THREADS, MAX_THREADS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelism_is_clamped() {
        assert_eq!(clamp_parallelism(0), 2);
        assert_eq!(clamp_parallelism(6), 6);
        assert_eq!(clamp_parallelism(100), 32);
    }

    #[test]
    fn pool_runs_action() {
        assert_eq!(with_fetch_pool(4, || 40 + 2), 42);
    }
}
