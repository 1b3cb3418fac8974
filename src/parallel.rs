use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use num_traits::Float;
use rayon::prelude::*;

use crate::distance::DistanceMeasure;
use crate::error::{ClusterError, Result};
use crate::mode::{seek_mode, Mode, ShiftSettings};
use crate::points::PointSet;

/// Fans `n_tasks` independent units of work out over a fixed number of workers
/// and returns their outputs in task order, whatever order they finished in.
///
/// A panic in any unit fails the whole call with [`ClusterError::WorkerFailure`];
/// no partial output is returned.
pub trait Scheduler {
    fn workers(&self) -> usize;

    fn execute<O, T>(&self, n_tasks: usize, task: Arc<T>) -> Result<Vec<O>>
    where
        O: Send + 'static,
        T: Fn(usize) -> O + Send + Sync + 'static;
}

/// Resolve a caller-supplied worker count; `<= 0` means all available cores.
pub fn resolve_workers(n_threads: isize) -> usize {
    if n_threads > 0 {
        n_threads as usize
    } else {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Work-stealing pool of `workers` threads. Each task index is written to its
/// own slot of the output, so results need no locking.
///
/// With a single worker the tasks run sequentially on the calling thread.
#[derive(Debug, Clone)]
pub struct ThreadPoolScheduler {
    workers: usize,
}

impl ThreadPoolScheduler {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl Scheduler for ThreadPoolScheduler {
    fn workers(&self) -> usize {
        self.workers
    }

    fn execute<O, T>(&self, n_tasks: usize, task: Arc<T>) -> Result<Vec<O>>
    where
        O: Send + 'static,
        T: Fn(usize) -> O + Send + Sync + 'static,
    {
        let outputs: Vec<Result<O>> = if self.workers == 1 {
            (0..n_tasks).map(|i| guarded(&*task, i)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()?;
            pool.install(|| {
                (0..n_tasks)
                    .into_par_iter()
                    .map(|i| guarded(&*task, i))
                    .collect()
            })
        };
        outputs.into_iter().collect()
    }
}

/// Run one task, turning a panic into a [`ClusterError::WorkerFailure`].
pub(crate) fn guarded<O, T>(task: &T, index: usize) -> Result<O>
where
    T: Fn(usize) -> O,
{
    panic::catch_unwind(AssertUnwindSafe(|| task(index))).map_err(|payload| {
        ClusterError::WorkerFailure(format!("point {}: {}", index, panic_message(&*payload)))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Seek the mode of every point, one task per point, returning modes in input order.
pub fn run<F, S>(
    scheduler: &S,
    points: &PointSet<F>,
    bandwidth: F,
    measure: DistanceMeasure,
    settings: ShiftSettings<F>,
) -> Result<Vec<Mode<F>>>
where
    F: Float + Send + Sync + 'static,
    S: Scheduler,
{
    debug!(
        "seeking {} modes on {} workers",
        points.len(),
        scheduler.workers()
    );
    let shared = points.clone();
    let task = Arc::new(move |i: usize| {
        seek_mode(shared.row(i), &shared, bandwidth, measure, &settings)
    });
    let modes = scheduler.execute(points.len(), task)?;

    let capped = modes.iter().filter(|m| !m.converged).count();
    if capped > 0 {
        warn!(
            "{} of {} points reached the iteration cap of {}",
            capped,
            modes.len(),
            settings.max_iterations
        );
    }
    Ok(modes)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::error::ClusterError;
    use crate::parallel::{resolve_workers, Scheduler, ThreadPoolScheduler};

    #[test]
    fn preserves_task_order() {
        for workers in [1, 3, 8] {
            let out = ThreadPoolScheduler::new(workers)
                .execute(100, Arc::new(|i: usize| i * i))
                .unwrap();
            assert_eq!(out, (0..100).map(|i| i * i).collect::<Vec<usize>>());
        }
    }

    #[test]
    fn panic_fails_the_run() {
        for workers in [1, 4] {
            let err = ThreadPoolScheduler::new(workers)
                .execute(
                    20,
                    Arc::new(|i: usize| {
                        if i == 13 {
                            panic!("bad point");
                        }
                        i
                    }),
                )
                .unwrap_err();
            match err {
                ClusterError::WorkerFailure(message) => {
                    assert!(message.contains("point 13"));
                    assert!(message.contains("bad point"));
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn no_tasks() {
        let out: Vec<u8> = ThreadPoolScheduler::new(4)
            .execute(0, Arc::new(|_| 0u8))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn worker_count_resolution() {
        assert_eq!(resolve_workers(3), 3);
        assert!(resolve_workers(0) >= 1);
        assert!(resolve_workers(-1) >= 1);
    }
}
