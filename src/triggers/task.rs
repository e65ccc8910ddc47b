//! Tasks fired by triggers and the executor that runs them
//!
//! Triggers never run tasks on the publishing thread. They hand a
//! [`TaskJob`] to the executor's queue and return; the executor's worker
//! thread runs jobs in submission order and contains any error or panic.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::core::Notification;

/// Errors reported by a task run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task ran and failed
    #[error("task failed: {0}")]
    Failed(String),

    /// The command sink has no receiver anymore
    #[error("command sink closed")]
    SinkClosed,
}

/// What a task gets to see when it runs
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Name of the trigger that fired
    pub trigger: String,
    /// The notification that fired it
    pub notification: Notification,
}

/// A unit of automation bound to a trigger
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError>;
}

/// Task backed by a closure
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F> FnTask<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> Task for FnTask<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx)
    }
}

/// Task that only logs the firing
#[derive(Debug, Default)]
pub struct LogTask;

impl Task for LogTask {
    fn name(&self) -> &str {
        "log"
    }

    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        log::info!(
            "Trigger '{}' fired: {} {} ({} online)",
            ctx.trigger,
            ctx.notification.kind,
            ctx.notification.player_name(),
            ctx.notification.player_count
        );
        Ok(())
    }
}

/// Sends a rendered console command to the server's input.
///
/// The template may use `{player}`, `{address}`, `{count}` and `{trigger}`.
pub struct ConsoleCommandTask {
    template: String,
    sink: Sender<String>,
}

impl ConsoleCommandTask {
    pub fn new(template: impl Into<String>, sink: Sender<String>) -> Self {
        Self {
            template: template.into(),
            sink,
        }
    }

    /// Fill the template for one firing
    pub fn render(&self, ctx: &TaskContext) -> String {
        let (player, address) = match &ctx.notification.player {
            Some(p) => (p.name.as_str(), p.address.as_str()),
            None => ("", ""),
        };
        self.template
            .replace("{player}", player)
            .replace("{address}", address)
            .replace("{count}", &ctx.notification.player_count.to_string())
            .replace("{trigger}", &ctx.trigger)
    }
}

impl Task for ConsoleCommandTask {
    fn name(&self) -> &str {
        &self.template
    }

    fn run(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        let command = self.render(ctx);
        log::debug!("Sending console command: {}", command);
        self.sink.send(command).map_err(|_| TaskError::SinkClosed)
    }
}

/// One queued task run
pub struct TaskJob {
    pub task: Arc<dyn Task>,
    pub context: TaskContext,
}

/// Cloneable handle for queueing jobs on an executor
#[derive(Clone)]
pub struct TaskSubmitter {
    tx: Sender<TaskJob>,
}

impl TaskSubmitter {
    /// Queue a job without waiting for it to run
    pub fn submit(&self, job: TaskJob) {
        if self.tx.send(job).is_err() {
            log::warn!("Task executor is gone, dropping task");
        }
    }
}

#[derive(Default)]
struct ExecutorCounters {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Runs fired tasks on a dedicated worker thread.
///
/// The worker is detached: triggers may still hold submitters when the
/// executor is dropped, and the worker keeps draining jobs until the last
/// submitter is gone.
pub struct TaskExecutor {
    submitter: TaskSubmitter,
    counters: Arc<ExecutorCounters>,
}

impl TaskExecutor {
    /// Spawn the worker thread
    pub fn new() -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<TaskJob>();
        let counters = Arc::new(ExecutorCounters::default());

        let thread_counters = Arc::clone(&counters);
        thread::Builder::new()
            .name("servermon-tasks".to_string())
            .spawn(move || worker_loop(rx, thread_counters))?;

        Ok(Self {
            submitter: TaskSubmitter { tx },
            counters,
        })
    }

    /// Handle for triggers to submit jobs with
    pub fn submitter(&self) -> TaskSubmitter {
        self.submitter.clone()
    }

    /// Tasks that ran to completion
    pub fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    /// Tasks that returned an error or panicked
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }
}

fn worker_loop(rx: Receiver<TaskJob>, counters: Arc<ExecutorCounters>) {
    log::debug!("Task executor started");

    for job in rx.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| job.task.run(&job.context)));
        match result {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Task '{}' for trigger '{}' failed: {}",
                    job.task.name(),
                    job.context.trigger,
                    e
                );
            }
            Err(_) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "Task '{}' for trigger '{}' panicked",
                    job.task.name(),
                    job.context.trigger
                );
            }
        }
    }

    log::debug!("Task executor stopped");
}
