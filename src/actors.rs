use std::marker::PhantomData;
use std::sync::Arc;
use std::thread;

use actix::{Actor, Handler, Message, MessageResult, SyncArbiter, SyncContext, System};
use futures::future::join_all;
use log::debug;

use crate::error::{ClusterError, Result};
use crate::parallel::{guarded, Scheduler};

/// Message-passing strategy: `workers` synchronous actors each receive one
/// contiguous batch of task indices and reply with `(index, output)` pairs,
/// which the collector puts back in task order.
///
/// The actor system runs on its own thread, so this can be called from inside
/// another async runtime.
#[derive(Debug, Clone)]
pub struct ActorScheduler {
    workers: usize,
}

impl ActorScheduler {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

struct ModeSeeker<T> {
    task: Arc<T>,
}

impl<T> Actor for ModeSeeker<T>
where
    T: 'static,
{
    type Context = SyncContext<Self>;
}

struct WorkBatch<O> {
    indices: Vec<usize>,
    _output: PhantomData<fn() -> O>,
}

impl<O> Message for WorkBatch<O>
where
    O: Send + 'static,
{
    type Result = Result<Vec<(usize, O)>>;
}

impl<O, T> Handler<WorkBatch<O>> for ModeSeeker<T>
where
    O: Send + 'static,
    T: Fn(usize) -> O + Send + Sync + 'static,
{
    type Result = MessageResult<WorkBatch<O>>;

    fn handle(&mut self, batch: WorkBatch<O>, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(
            batch
                .indices
                .into_iter()
                .map(|i| guarded(&*self.task, i).map(|out| (i, out)))
                .collect(),
        )
    }
}

impl Scheduler for ActorScheduler {
    fn workers(&self) -> usize {
        self.workers
    }

    fn execute<O, T>(&self, n_tasks: usize, task: Arc<T>) -> Result<Vec<O>>
    where
        O: Send + 'static,
        T: Fn(usize) -> O + Send + Sync + 'static,
    {
        if n_tasks == 0 {
            return Ok(Vec::new());
        }
        let workers = self.workers.min(n_tasks);
        let batch_size = (n_tasks + workers - 1) / workers;
        debug!(
            "starting {} actors, batches of up to {} points",
            workers, batch_size
        );

        let collector = thread::spawn(move || {
            System::new().block_on(async move {
                let addr = SyncArbiter::start(workers, move || ModeSeeker { task: task.clone() });
                let requests = (0..n_tasks)
                    .step_by(batch_size)
                    .map(|start| {
                        addr.send(WorkBatch::<O> {
                            indices: (start..(start + batch_size).min(n_tasks)).collect(),
                            _output: PhantomData,
                        })
                    })
                    .collect::<Vec<_>>();
                let replies = join_all(requests).await;

                let mut slots: Vec<Option<O>> = (0..n_tasks).map(|_| None).collect();
                for reply in replies {
                    let outputs = reply.map_err(|e| ClusterError::WorkerFailure(e.to_string()))??;
                    for (i, out) in outputs {
                        slots[i] = Some(out);
                    }
                }
                slots
                    .into_iter()
                    .enumerate()
                    .map(|(i, slot)| {
                        slot.ok_or_else(|| {
                            ClusterError::WorkerFailure(format!("point {}: no result", i))
                        })
                    })
                    .collect::<Result<Vec<O>>>()
            })
        });

        collector
            .join()
            .map_err(|_| ClusterError::WorkerFailure("actor system panicked".to_string()))?
    }
}
