//! Generic trigger lifecycle shared by every rule

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::TriggerKind;
use super::task::{Task, TaskContext, TaskJob, TaskSubmitter};
use super::types::{Trigger, TriggerInfo, TriggerRule};
use crate::core::{NotificationBus, NotificationKind, SubscriberId};

struct TriggerState<P> {
    raw: String,
    params: Option<Arc<P>>,
    subscription: Option<SubscriberId>,
}

/// A [`Trigger`] driven by a [`TriggerRule`].
///
/// The bus handler captures the parameters that were loaded when it
/// subscribed; reloading swaps the whole subscription rather than mutating
/// what a live handler reads.
pub struct RuleTrigger<R: TriggerRule> {
    info: TriggerInfo,
    rule: Arc<R>,
    bus: Arc<NotificationBus>,
    task: Arc<dyn Task>,
    submitter: TaskSubmitter,
    state: Mutex<TriggerState<R::Params>>,
    fired: Arc<AtomicU64>,
}

impl<R: TriggerRule> RuleTrigger<R> {
    /// Create a disabled trigger with empty parameters
    pub fn new(
        name: impl Into<String>,
        rule: R,
        bus: Arc<NotificationBus>,
        task: Arc<dyn Task>,
        submitter: TaskSubmitter,
    ) -> Self {
        let info = TriggerInfo {
            name: name.into(),
            description: rule.description().to_string(),
            parameter_description: rule.parameter_description().to_string(),
        };
        let params = rule.parse("").map(Arc::new);

        Self {
            info,
            rule: Arc::new(rule),
            bus,
            task,
            submitter,
            state: Mutex::new(TriggerState {
                raw: String::new(),
                params,
                subscription: None,
            }),
            fired: Arc::new(AtomicU64::new(0)),
        }
    }

    fn subscribe(&self, params: Option<Arc<R::Params>>) -> SubscriberId {
        let rule = Arc::clone(&self.rule);
        let task = Arc::clone(&self.task);
        let submitter = self.submitter.clone();
        let fired = Arc::clone(&self.fired);
        let name = self.info.name.clone();

        self.bus.subscribe(self.rule.kind(), move |notification| {
            let Some(params) = params.as_deref() else {
                return;
            };
            if !rule.matches(params, notification) {
                return;
            }
            fired.fetch_add(1, Ordering::Relaxed);
            log::debug!("Trigger '{}' fired on {}", name, notification.kind);
            submitter.submit(TaskJob {
                task: Arc::clone(&task),
                context: TaskContext {
                    trigger: name.clone(),
                    notification: notification.clone(),
                },
            });
        })
    }
}

impl<R: TriggerRule> Trigger for RuleTrigger<R> {
    fn info(&self) -> &TriggerInfo {
        &self.info
    }

    fn kind(&self) -> NotificationKind {
        self.rule.kind()
    }

    fn trigger_kind(&self) -> TriggerKind {
        self.rule.trigger_kind()
    }

    fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    fn validate_input(&self, text: &str) -> bool {
        self.rule.parse(text).is_some()
    }

    fn parameters(&self) -> String {
        self.state.lock().raw.clone()
    }

    fn load(&self, parameters: &str) {
        let mut state = self.state.lock();

        // disable -> replace -> enable, all under the state lock
        let was_enabled = match state.subscription.take() {
            Some(id) => {
                self.bus.unsubscribe(self.rule.kind(), id);
                true
            }
            None => false,
        };

        state.raw = parameters.to_string();
        state.params = self.rule.parse(parameters).map(Arc::new);
        if state.params.is_none() {
            log::warn!(
                "Trigger '{}' loaded unparsable parameters {:?}; it will not fire",
                self.info.name,
                parameters
            );
        }

        if was_enabled {
            state.subscription = Some(self.subscribe(state.params.clone()));
        }
        log::debug!("Trigger '{}' loaded parameters {:?}", self.info.name, parameters);
    }

    fn enable(&self) {
        let mut state = self.state.lock();
        if state.subscription.is_some() {
            return;
        }
        state.subscription = Some(self.subscribe(state.params.clone()));
        log::info!("Trigger '{}' enabled", self.info.name);
    }

    fn disable(&self) {
        let mut state = self.state.lock();
        if let Some(id) = state.subscription.take() {
            self.bus.unsubscribe(self.rule.kind(), id);
            log::info!("Trigger '{}' disabled", self.info.name);
        }
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().subscription.is_some()
    }

    fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

impl<R: TriggerRule> Drop for RuleTrigger<R> {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().subscription.take() {
            self.bus.unsubscribe(self.rule.kind(), id);
        }
    }
}
