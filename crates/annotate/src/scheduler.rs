//! Run on background, complete on foreground.
//!
//! Remote calls run as tokio tasks. Anything that touches user-visible
//! state is marshaled onto one foreground task, which runs completions one
//! at a time in the order they were posted.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::SchedulerError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle used to post completions onto the foreground context.
#[derive(Clone)]
pub struct Foreground {
    sender: mpsc::UnboundedSender<Job>,
}

/// The foreground context itself. Runs until every [`Foreground`] handle is dropped.
pub struct ForegroundLoop {
    receiver: mpsc::UnboundedReceiver<Job>,
}

/// Create a foreground context and the handle that posts to it.
#[must_use]
pub fn foreground() -> (Foreground, ForegroundLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Foreground { sender }, ForegroundLoop { receiver })
}

impl Foreground {
    /// Run `f` on the foreground context and wait for its result.
    pub async fn run<F, R>(&self, f: F) -> Result<R, SchedulerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done, result) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The waiter may have gone away; the completion still ran.
            let _ = done.send(f());
        });

        self.sender
            .send(job)
            .map_err(|_| SchedulerError::ForegroundClosed)?;
        result.await.map_err(|_| SchedulerError::ForegroundClosed)
    }
}

impl ForegroundLoop {
    /// Run queued completions until all handles are dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            job();
        }
        debug!("Foreground context closed");
    }

    /// Run the loop on its own task.
    #[must_use = "dropping the handle detaches the foreground loop"]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Dispatch `future` onto the background executor.
pub fn spawn_background<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_run_returns_completion_result() {
        let (fg, ui) = foreground();
        let ui = ui.spawn();

        let value = fg.run(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);

        drop(fg);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_completions_run_in_post_order() {
        let (fg, ui) = foreground();
        let ui = ui.spawn();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let push = |i| {
            let seen = Arc::clone(&seen);
            move || seen.lock().unwrap().push(i)
        };
        let (a, b, c) = tokio::join!(fg.run(push(0)), fg.run(push(1)), fg.run(push(2)));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        drop(fg);
        ui.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_background_tasks_complete_on_foreground() {
        let (fg, ui) = foreground();
        let ui = ui.spawn();
        let completed = Arc::new(Mutex::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let fg = fg.clone();
            let completed = Arc::clone(&completed);
            handles.push(spawn_background(async move {
                let n = i * 10;
                fg.run(move || {
                    *completed.lock().unwrap() += 1;
                    n + 1
                })
                .await
                .unwrap()
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, (0..8).map(|i| i * 10 + 1).sum::<i32>());
        assert_eq!(*completed.lock().unwrap(), 8);
        drop(fg);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_foreground_is_reported() {
        let (fg, ui) = foreground();
        drop(ui);

        assert!(matches!(
            fg.run(|| ()).await,
            Err(SchedulerError::ForegroundClosed)
        ));
    }
}
