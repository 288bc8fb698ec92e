//! Fan-out within a stage.
//!
//! A [`TaskGroup`] runs one tokio task per connection or model and settles
//! when every task has succeeded or the first one has failed. The first
//! failure observed, in completion order, is the stage's result.
//!
//! Siblings are NOT cancelled on failure: they are detached and run to
//! completion, and whatever they produce is dropped. Dropping a `JoinSet`
//! aborts its tasks, so every early return goes through `detach_all`.

use std::future::Future;

use tokio::task::JoinSet;

use crate::error::PipelineError;
use crate::pipeline::Stage;

pub(crate) struct TaskGroup<T> {
    stage: Stage,
    tasks: JoinSet<Result<T, PipelineError>>,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub(crate) fn new(stage: Stage) -> Self {
        Self {
            stage,
            tasks: JoinSet::new(),
        }
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T, PipelineError>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Join every task, handing each success to `accept` as it arrives.
    pub(crate) async fn settle<F>(mut self, mut accept: F) -> Result<(), PipelineError>
    where
        F: FnMut(T),
    {
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|err| {
                Err(PipelineError::TaskPanicked {
                    stage: self.stage,
                    message: err.to_string(),
                })
            });
            match outcome {
                Ok(value) => accept(value),
                Err(err) => {
                    let detached = self.tasks.len();
                    self.tasks.detach_all();
                    tracing::debug!(
                        stage = %self.stage,
                        detached,
                        error = %err,
                        "stage failed; remaining tasks left to finish"
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
