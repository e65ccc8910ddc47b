//! Named collection of trigger instances

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::config::{TriggerConfig, TriggerKind};
use super::rule_trigger::RuleTrigger;
use super::rules::{PlayerCount, PlayerJoined, PlayerLeft, ServerEmpty};
use super::task::{Task, TaskSubmitter};
use super::types::Trigger;
use crate::core::NotificationBus;
use crate::{Result, ServermonError};

/// Owns every trigger instance, keyed by name
pub struct TriggerManager {
    triggers: Mutex<BTreeMap<String, Arc<dyn Trigger>>>,
    bus: Arc<NotificationBus>,
    submitter: TaskSubmitter,
}

impl TriggerManager {
    /// Create an empty manager whose triggers subscribe to `bus` and queue
    /// tasks through `submitter`
    pub fn new(bus: Arc<NotificationBus>, submitter: TaskSubmitter) -> Self {
        Self {
            triggers: Mutex::new(BTreeMap::new()),
            bus,
            submitter,
        }
    }

    /// Build a disabled trigger of a built-in kind
    pub fn create(&self, kind: TriggerKind, name: &str, task: Arc<dyn Task>) -> Arc<dyn Trigger> {
        let bus = Arc::clone(&self.bus);
        let submitter = self.submitter.clone();
        match kind {
            TriggerKind::PlayerJoined => Arc::new(RuleTrigger::new(name, PlayerJoined, bus, task, submitter)),
            TriggerKind::PlayerLeft => Arc::new(RuleTrigger::new(name, PlayerLeft, bus, task, submitter)),
            TriggerKind::PlayerCount => Arc::new(RuleTrigger::new(name, PlayerCount, bus, task, submitter)),
            TriggerKind::ServerEmpty => Arc::new(RuleTrigger::new(name, ServerEmpty, bus, task, submitter)),
        }
    }

    /// Add a trigger under its own name
    pub fn register(&self, trigger: Arc<dyn Trigger>) -> Result<()> {
        let name = trigger.info().name.clone();
        let mut triggers = self.triggers.lock();
        if triggers.contains_key(&name) {
            return Err(ServermonError::DuplicateTrigger(name));
        }
        log::debug!("Registered trigger '{}' ({})", name, trigger.kind());
        triggers.insert(name, trigger);
        Ok(())
    }

    /// Create (or reconfigure) a trigger from configuration.
    ///
    /// Parameters are validated before anything changes; an existing trigger
    /// keeps its old state if validation fails. An existing trigger with the
    /// same kind and the same task is reloaded in place. Otherwise it is
    /// disabled and replaced by a new trigger built from `config` and `task`.
    pub fn configure(&self, config: &TriggerConfig, task: Arc<dyn Task>) -> Result<Arc<dyn Trigger>> {
        let existing = self.get(&config.name);
        let reusable = existing
            .as_ref()
            .filter(|t| t.trigger_kind() == config.kind && Arc::ptr_eq(t.task(), &task))
            .cloned();

        let trigger = match reusable {
            Some(trigger) => {
                if !trigger.validate_input(&config.parameters) {
                    return Err(invalid(config));
                }
                trigger.load(&config.parameters);
                trigger
            }
            None => {
                let trigger = self.create(config.kind, &config.name, task);
                if !trigger.validate_input(&config.parameters) {
                    return Err(invalid(config));
                }
                trigger.load(&config.parameters);
                match existing {
                    Some(old) => {
                        old.disable();
                        self.triggers
                            .lock()
                            .insert(config.name.clone(), Arc::clone(&trigger));
                        log::info!(
                            "Replaced trigger '{}' ({:?} -> {:?})",
                            config.name,
                            old.trigger_kind(),
                            config.kind
                        );
                    }
                    None => self.register(Arc::clone(&trigger))?,
                }
                trigger
            }
        };

        if config.enabled {
            trigger.enable();
        } else {
            trigger.disable();
        }
        Ok(trigger)
    }

    /// Validate and load new parameters into a registered trigger
    pub fn load_parameters(&self, name: &str, parameters: &str) -> Result<()> {
        let trigger = self.require(name)?;
        if !trigger.validate_input(parameters) {
            return Err(ServermonError::InvalidParameters {
                trigger: name.to_string(),
                parameters: parameters.to_string(),
            });
        }
        trigger.load(parameters);
        Ok(())
    }

    pub fn enable(&self, name: &str) -> Result<()> {
        self.require(name)?.enable();
        Ok(())
    }

    pub fn disable(&self, name: &str) -> Result<()> {
        self.require(name)?.disable();
        Ok(())
    }

    /// Disable every trigger
    pub fn disable_all(&self) {
        let triggers: Vec<Arc<dyn Trigger>> = self.triggers.lock().values().cloned().collect();
        for trigger in triggers {
            trigger.disable();
        }
    }

    /// Disable and drop a trigger
    pub fn remove(&self, name: &str) -> Result<()> {
        let trigger = self
            .triggers
            .lock()
            .remove(name)
            .ok_or_else(|| ServermonError::UnknownTrigger(name.to_string()))?;
        trigger.disable();
        log::debug!("Removed trigger '{}'", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers.lock().get(name).cloned()
    }

    fn require(&self, name: &str) -> Result<Arc<dyn Trigger>> {
        self.get(name)
            .ok_or_else(|| ServermonError::UnknownTrigger(name.to_string()))
    }

    /// All trigger names, sorted
    pub fn names(&self) -> Vec<String> {
        self.triggers.lock().keys().cloned().collect()
    }

    /// Names of enabled triggers, sorted
    pub fn enabled_names(&self) -> Vec<String> {
        self.triggers
            .lock()
            .iter()
            .filter(|(_, t)| t.is_enabled())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.lock().is_empty()
    }
}

fn invalid(config: &TriggerConfig) -> ServermonError {
    ServermonError::InvalidParameters {
        trigger: config.name.clone(),
        parameters: config.parameters.clone(),
    }
}
