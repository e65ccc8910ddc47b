//! Server monitor: wires classifier, registry, bus and triggers together

use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::bus::NotificationBus;
use super::events::{Notification, NotificationKind};
use super::registry::PlayerRegistry;
use super::state::MonitorState;
use crate::classifier::{classify, Action};
use crate::config::{MonitorConfig, MonitorSettings};
use crate::triggers::{ConsoleCommandTask, LogTask, Task, TriggerConfig, TriggerManager, TaskExecutor};
use crate::{Result, ServermonError};

/// One run of the read loop
struct ReaderThread {
    /// Cleared by `stop` or when the loop exits; owned by this run only
    active: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owns the whole pipeline for one server process
pub struct ServerMonitor {
    settings: MonitorSettings,
    bus: Arc<NotificationBus>,
    registry: Arc<PlayerRegistry>,
    triggers: TriggerManager,
    executor: TaskExecutor,
    /// Where console command tasks send rendered commands
    command_sink: Option<Sender<String>>,
    lines_processed: Arc<AtomicU64>,
    reader: Mutex<Option<ReaderThread>>,
}

impl ServerMonitor {
    /// Create a monitor. Triggers with a `command` only log when fired,
    /// since there is nowhere to send the command.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a monitor whose command triggers write to `sink`
    pub fn with_command_sink(config: MonitorConfig, sink: Sender<String>) -> Result<Self> {
        Self::build(config, Some(sink))
    }

    fn build(config: MonitorConfig, command_sink: Option<Sender<String>>) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(NotificationBus::with_max_depth(config.monitor.max_dispatch_depth));
        let registry = Arc::new(PlayerRegistry::new(Arc::clone(&bus)));
        registry.initialize();

        let executor = TaskExecutor::new()?;
        let triggers = TriggerManager::new(Arc::clone(&bus), executor.submitter());

        let monitor = Self {
            settings: config.monitor,
            bus,
            registry,
            triggers,
            executor,
            command_sink,
            lines_processed: Arc::new(AtomicU64::new(0)),
            reader: Mutex::new(None),
        };

        for trigger in &config.triggers {
            monitor.configure_trigger(trigger)?;
        }
        log::info!(
            "Server monitor ready with {} triggers ({} enabled)",
            monitor.triggers.len(),
            monitor.triggers.enabled_names().len()
        );

        Ok(monitor)
    }

    /// Create or reconfigure a trigger, binding its command to the sink
    pub fn configure_trigger(&self, config: &TriggerConfig) -> Result<()> {
        let task: Arc<dyn Task> = match (&config.command, &self.command_sink) {
            (Some(command), Some(sink)) => Arc::new(ConsoleCommandTask::new(command.as_str(), sink.clone())),
            (Some(_), None) => {
                log::warn!(
                    "Trigger '{}' has a command but no command sink is attached; it will only log",
                    config.name
                );
                Arc::new(LogTask)
            }
            (None, _) => Arc::new(LogTask),
        };
        self.triggers.configure(config, task)?;
        Ok(())
    }

    /// Classify one line and apply it to the registry
    pub fn process_line(&self, line: &str) -> Action {
        process_line(&self.registry, &self.lines_processed, line)
    }

    /// Start reading server output on a background thread.
    ///
    /// When the stream ends the loop stops and, if configured, every
    /// remaining player is removed. Fails with `AlreadyRunning` while a
    /// previous reader thread is alive, even if it was asked to stop and
    /// is still blocked on its stream.
    pub fn start<R>(&self, reader: R) -> Result<()>
    where
        R: BufRead + Send + 'static,
    {
        let mut slot = self.reader.lock();
        if let Some(previous) = slot.take() {
            if !previous.handle.is_finished() {
                *slot = Some(previous);
                return Err(ServermonError::AlreadyRunning);
            }
            if previous.handle.join().is_err() {
                log::error!("Server output reader panicked");
            }
        }

        let active = Arc::new(AtomicBool::new(true));
        let running = Arc::clone(&active);
        let registry = Arc::clone(&self.registry);
        let lines_processed = Arc::clone(&self.lines_processed);
        let clear_on_stop = self.settings.clear_on_stop;

        let spawned = thread::Builder::new()
            .name("servermon-reader".to_string())
            .spawn(move || {
                log::info!("Server output reader started");
                run_reader_loop(reader, &running, &registry, &lines_processed);
                running.store(false, Ordering::SeqCst);
                if clear_on_stop {
                    registry.clear();
                }
                log::info!("Server output reader stopped");
            });

        let handle = spawned?;
        *slot = Some(ReaderThread { active, handle });
        Ok(())
    }

    /// Ask the read loop to stop.
    ///
    /// Takes effect when the loop next wakes up: any line read after this
    /// call is discarded unprocessed.
    pub fn stop(&self) {
        if let Some(reader) = self.reader.lock().as_ref() {
            if reader.active.swap(false, Ordering::SeqCst) {
                log::info!("Server monitor stopping");
            }
        }
    }

    /// Block until the read loop has exited
    pub fn wait(&self) {
        let reader = self.reader.lock().take();
        if let Some(reader) = reader {
            if reader.handle.join().is_err() {
                log::error!("Server output reader panicked");
            }
        }
    }

    /// Check if the read loop is currently running
    pub fn is_running(&self) -> bool {
        self.reader
            .lock()
            .as_ref()
            .map_or(false, |reader| reader.active.load(Ordering::SeqCst))
    }

    /// Receive notifications of one kind on another thread
    pub fn observe(&self, kind: NotificationKind) -> Receiver<Notification> {
        self.bus.subscribe_channel(kind).1
    }

    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    pub fn triggers(&self) -> &TriggerManager {
        &self.triggers
    }

    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    /// Total lines classified so far
    pub fn lines_processed(&self) -> u64 {
        self.lines_processed.load(Ordering::Relaxed)
    }

    /// Snapshot for display layers
    pub fn state(&self) -> MonitorState {
        MonitorState {
            running: self.is_running(),
            players: self.registry.get_all(),
            enabled_triggers: self.triggers.enabled_names(),
            stats: self.registry.stats(),
        }
    }

    /// Snapshot as a JSON string
    pub fn state_json(&self) -> String {
        serde_json::to_string(&self.state()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Drop for ServerMonitor {
    fn drop(&mut self) {
        self.stop();
        self.triggers.disable_all();
    }
}

fn process_line(registry: &PlayerRegistry, lines_processed: &AtomicU64, line: &str) -> Action {
    lines_processed.fetch_add(1, Ordering::Relaxed);
    let action = classify(line);
    if action.is_mutating() {
        registry.apply(&action);
    } else if action.is_recognized() {
        log::trace!("Classified {:?}", action);
    }
    action
}

/// Lines that arrive after `running` is cleared are dropped unprocessed
fn run_reader_loop<R: BufRead>(
    reader: R,
    running: &AtomicBool,
    registry: &PlayerRegistry,
    lines_processed: &AtomicU64,
) {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match line {
            Ok(line) => {
                process_line(registry, lines_processed, &line);
            }
            Err(e) => {
                log::warn!("Error reading server output: {}", e);
                break;
            }
        }
    }
}
