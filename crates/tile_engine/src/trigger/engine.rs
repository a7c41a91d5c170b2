//! Trigger execution and callback polling

use super::scenery::SceneryItem;
use super::TriggerError;
use crate::animation::Animator;
use crate::config::TriggerConfig;
use crate::foundation::collections::{CallbackKey, SlotMap};
use std::collections::{HashMap, HashSet};

/// Bookkeeping for one top-level trigger invocation
#[derive(Debug, Clone)]
pub struct TriggerCallback {
    starter_item: usize,
    starter_trigger: String,
    affected: Vec<usize>,
    visited: HashSet<(usize, usize)>,
}

impl TriggerCallback {
    /// Start tracking an invocation of `starter_trigger` on `starter_item`
    pub fn new(starter_item: usize, starter_trigger: impl Into<String>) -> Self {
        Self {
            starter_item,
            starter_trigger: starter_trigger.into(),
            affected: Vec::new(),
            visited: HashSet::new(),
        }
    }

    /// Item the invocation started on
    pub fn starter_item(&self) -> usize {
        self.starter_item
    }

    /// Trigger the invocation started with
    pub fn starter_trigger(&self) -> &str {
        &self.starter_trigger
    }

    /// Items whose state changed, in execution order
    pub fn affected(&self) -> &[usize] {
        &self.affected
    }

    fn record(&mut self, item: usize) {
        if !self.affected.contains(&item) {
            self.affected.push(item);
        }
    }
}

/// Payload of a completed invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerCompletion {
    /// Callback that completed
    pub callback: CallbackKey,
    /// Id of the item the invocation started on
    pub starter_item: String,
    /// Name of the starting trigger
    pub starter_trigger: String,
    /// Indices of every affected item
    pub affected: Vec<usize>,
}

/// Notifications produced by the trigger engine
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    /// An invocation changed at least one item
    Started {
        /// Callback tracking the invocation
        callback: CallbackKey,
        /// Id of the item the invocation started on
        item: String,
        /// Name of the starting trigger
        trigger: String,
    },
    /// No item affected by an invocation is animating any more
    Completed(TriggerCompletion),
}

/// Per-level trigger state machine
#[derive(Debug, Default)]
pub struct TriggerEngine {
    items: Vec<SceneryItem>,
    by_id: HashMap<String, usize>,
    callbacks: SlotMap<CallbackKey, TriggerCallback>,
    events: Vec<TriggerEvent>,
    max_depth: usize,
}

impl TriggerEngine {
    /// Create an engine over a level's scenery items
    pub fn new(items: Vec<SceneryItem>, config: &TriggerConfig) -> Self {
        let by_id = items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id().to_string(), index))
            .collect();
        Self {
            items,
            by_id,
            callbacks: SlotMap::with_key(),
            events: Vec::new(),
            max_depth: config.max_cascade_depth,
        }
    }

    /// All scenery items
    pub fn items(&self) -> &[SceneryItem] {
        &self.items
    }

    /// Item by index
    pub fn item(&self, index: usize) -> Option<&SceneryItem> {
        self.items.get(index)
    }

    /// Index of the item with `id`
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Item by id
    pub fn item_by_id(&self, id: &str) -> Option<&SceneryItem> {
        self.index_of(id).map(|index| &self.items[index])
    }

    /// Run a named trigger on an item as a new top-level invocation
    ///
    /// Returns the callback key when at least one item changed state, and
    /// `Ok(None)` when the state guard rejected the trigger.
    pub fn invoke(
        &mut self,
        item_id: &str,
        trigger_name: &str,
        animator: &mut dyn Animator,
    ) -> Result<Option<CallbackKey>, TriggerError> {
        let item = self.index_of(item_id).ok_or_else(|| TriggerError::UnknownItem(item_id.to_string()))?;
        let trigger = self.items[item].find_trigger(trigger_name).ok_or_else(|| TriggerError::UnknownTrigger {
            item: item_id.to_string(),
            trigger: trigger_name.to_string(),
        })?;
        Ok(self.run_top_level(item, trigger, animator))
    }

    /// Player interaction: run the first trigger that fits the item's state
    pub fn interact(&mut self, item_id: &str, animator: &mut dyn Animator) -> Result<Option<CallbackKey>, TriggerError> {
        let item = self.index_of(item_id).ok_or_else(|| TriggerError::UnknownItem(item_id.to_string()))?;
        match self.items[item].first_applicable_trigger() {
            Some(trigger) => Ok(self.run_top_level(item, trigger, animator)),
            None => {
                log::debug!("Item '{}' has no trigger from state '{}'", item_id, self.items[item].current_state());
                Ok(None)
            }
        }
    }

    fn run_top_level(&mut self, item: usize, trigger: usize, animator: &mut dyn Animator) -> Option<CallbackKey> {
        let trigger_name = self.items[item].triggers()[trigger].name.clone();
        let mut callback = TriggerCallback::new(item, trigger_name.clone());
        self.execute_trigger(&mut callback, item, trigger, animator);

        if callback.affected.is_empty() {
            log::debug!(
                "Trigger '{}' on '{}' rejected in state '{}'",
                trigger_name,
                self.items[item].id(),
                self.items[item].current_state()
            );
            return None;
        }

        let key = self.callbacks.insert(callback);
        self.events.push(TriggerEvent::Started {
            callback: key,
            item: self.items[item].id().to_string(),
            trigger: trigger_name,
        });
        Some(key)
    }

    /// Execute trigger `trigger` of item `item`, cascading through its actions
    ///
    /// The item's state must equal the trigger's `state_from`, otherwise
    /// nothing happens. Every item that changes state is recorded in
    /// `callback`. A trigger already executed within this callback, or a
    /// chain deeper than the configured limit, aborts that branch only.
    pub fn execute_trigger(
        &mut self,
        callback: &mut TriggerCallback,
        item: usize,
        trigger: usize,
        animator: &mut dyn Animator,
    ) {
        self.execute_at_depth(callback, item, trigger, animator, 0);
    }

    fn execute_at_depth(
        &mut self,
        callback: &mut TriggerCallback,
        item: usize,
        trigger_index: usize,
        animator: &mut dyn Animator,
        depth: usize,
    ) {
        let Some(trigger) = self.items.get(item).and_then(|entry| entry.triggers().get(trigger_index)).cloned() else {
            return;
        };

        if self.items[item].current_state() != trigger.state_from {
            return;
        }
        if !callback.visited.insert((item, trigger_index)) {
            log::warn!(
                "Trigger cycle: '{}' on '{}' already ran in this cascade, stopping branch",
                trigger.name,
                self.items[item].id()
            );
            return;
        }

        self.items[item].set_state(&trigger.state_to);

        if let Some(plan_name) = &trigger.animation {
            match (self.items[item].slot(), self.items[item].animation(plan_name)) {
                (Some(slot), Some(plan)) => animator.start(slot, plan),
                (None, _) => log::debug!("Item '{}' has no instance to animate", self.items[item].id()),
                (_, None) => log::warn!("Item '{}' has no animation plan '{}'", self.items[item].id(), plan_name),
            }
        }

        callback.record(item);

        for action in &trigger.actions {
            let Some(target) = self.index_of(&action.item_id) else {
                log::warn!("Trigger '{}' targets unknown item '{}', skipping", trigger.name, action.item_id);
                continue;
            };
            let Some(target_trigger) = self.items[target].find_trigger(&action.action_name) else {
                log::warn!(
                    "Item '{}' has no trigger '{}', skipping action",
                    action.item_id,
                    action.action_name
                );
                continue;
            };
            if depth + 1 > self.max_depth {
                log::warn!(
                    "Trigger cascade from '{}' exceeded depth {}, dropping action '{}' on '{}'",
                    callback.starter_trigger,
                    self.max_depth,
                    action.action_name,
                    action.item_id
                );
                continue;
            }
            self.execute_at_depth(callback, target, target_trigger, animator, depth + 1);
        }
    }

    /// Resolve every callback whose items stopped animating
    ///
    /// Each callback completes exactly once and is then forgotten.
    pub fn poll(&mut self, animator: &dyn Animator) -> Vec<TriggerCompletion> {
        let items = &self.items;
        let finished: Vec<CallbackKey> = self
            .callbacks
            .iter()
            .filter(|(_, callback)| {
                !callback
                    .affected
                    .iter()
                    .filter_map(|&index| items[index].slot())
                    .any(|slot| animator.is_playing(slot))
            })
            .map(|(key, _)| key)
            .collect();

        let mut completions = Vec::with_capacity(finished.len());
        for key in finished {
            let Some(callback) = self.callbacks.remove(key) else {
                continue;
            };
            let completion = TriggerCompletion {
                callback: key,
                starter_item: self.items[callback.starter_item].id().to_string(),
                starter_trigger: callback.starter_trigger,
                affected: callback.affected,
            };
            log::debug!(
                "Trigger '{}' on '{}' completed, {} items affected",
                completion.starter_trigger,
                completion.starter_item,
                completion.affected.len()
            );
            self.events.push(TriggerEvent::Completed(completion.clone()));
            completions.push(completion);
        }
        completions
    }

    /// Callbacks still waiting on animations
    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<TriggerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forget in-flight callbacks and queued events without completing them
    pub fn discard_callbacks(&mut self) {
        if !self.callbacks.is_empty() {
            log::info!("Discarding {} in-flight trigger callbacks", self.callbacks.len());
        }
        self.callbacks.clear();
        self.events.clear();
    }
}
