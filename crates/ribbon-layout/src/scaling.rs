#![forbid(unsafe_code)]

//! Ordered scale-down recipe for one tab.
//!
//! A [`Scaling`] maps each group to its largest layout (its *max size*) and
//! keeps an ordered list of [`ScalingStep`]s. Walking the list front to back
//! shrinks the tab one group at a time; walking it back restores the layout
//! that the nearest earlier step for the same group chose, or the max size.
//!
//! # Invariants
//!
//! 1. Every step's group has a registered max size.
//! 2. A step instance belongs to at most one registry at a time, and appears
//!    in it at most once.
//!
//! Both are checked before the list changes.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

static NEXT_SCALING_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Scaling`] registry, used for step ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalingId(u64);

/// Shared handle to a step; identity is pointer identity.
pub type StepRef = Rc<ScalingStep>;

// ============================================================================
// ScalingStep
// ============================================================================

/// One scale-down move: show `layout_name` for `group_id`.
#[derive(Debug)]
pub struct ScalingStep {
    group_id: String,
    layout_name: String,
    popup_size_hint: Option<String>,
    warning_message: Option<String>,
    owner: Cell<Option<ScalingId>>,
}

impl ScalingStep {
    /// Both fields must be non-empty.
    pub fn new(group_id: impl Into<String>, layout_name: impl Into<String>) -> Result<Self> {
        let group_id = group_id.into();
        let layout_name = layout_name.into();
        if group_id.is_empty() {
            return Err(LayoutError::EmptyStepField { field: "group_id" });
        }
        if layout_name.is_empty() {
            return Err(LayoutError::EmptyStepField {
                field: "layout_name",
            });
        }
        Ok(Self {
            group_id,
            layout_name,
            popup_size_hint: None,
            warning_message: None,
            owner: Cell::new(None),
        })
    }

    /// Source layout for the popup when `layout_name` is `Popup`.
    #[must_use]
    pub fn with_popup_size_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.popup_size_hint = (!hint.is_empty()).then_some(hint);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.warning_message = (!message.is_empty()).then_some(message);
        self
    }

    #[must_use]
    pub fn into_ref(self) -> StepRef {
        Rc::new(self)
    }

    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    #[must_use]
    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    #[must_use]
    pub fn popup_size_hint(&self) -> Option<&str> {
        self.popup_size_hint.as_deref()
    }

    #[must_use]
    pub fn warning_message(&self) -> Option<&str> {
        self.warning_message.as_deref()
    }

    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.warning_message.is_some()
    }

    #[must_use]
    pub fn owner(&self) -> Option<ScalingId> {
        self.owner.get()
    }
}

impl Clone for ScalingStep {
    /// Copies are unowned.
    fn clone(&self) -> Self {
        Self {
            group_id: self.group_id.clone(),
            layout_name: self.layout_name.clone(),
            popup_size_hint: self.popup_size_hint.clone(),
            warning_message: self.warning_message.clone(),
            owner: Cell::new(None),
        }
    }
}

// ============================================================================
// Scaling
// ============================================================================

/// Max sizes plus the ordered step list of one tab.
#[derive(Debug)]
pub struct Scaling {
    id: ScalingId,
    max_sizes: FxHashMap<String, String>,
    steps: Vec<StepRef>,
    dirty: bool,
}

impl Default for Scaling {
    fn default() -> Self {
        Self::new()
    }
}

impl Scaling {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ScalingId(NEXT_SCALING_ID.fetch_add(1, Ordering::Relaxed)),
            max_sizes: FxHashMap::default(),
            steps: Vec::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> ScalingId {
        self.id
    }

    /// Register the largest layout of `group_id`.
    pub fn set_group_max_size(
        &mut self,
        group_id: impl Into<String>,
        layout_name: impl Into<String>,
    ) {
        let group_id = group_id.into();
        let layout_name = layout_name.into();
        if self.max_sizes.get(&group_id) != Some(&layout_name) {
            self.max_sizes.insert(group_id, layout_name);
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn max_size(&self, group_id: &str) -> Option<&str> {
        self.max_sizes.get(group_id).map(String::as_str)
    }

    /// Max sizes sorted by group id.
    #[must_use]
    pub fn max_sizes_sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self
            .max_sizes
            .iter()
            .map(|(g, l)| (g.as_str(), l.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    fn check_insertable(&self, step: &StepRef) -> Result<()> {
        if !self.max_sizes.contains_key(step.group_id()) {
            return Err(LayoutError::MissingMaxSize {
                group_id: step.group_id().to_owned(),
            });
        }
        if self.steps.iter().any(|s| Rc::ptr_eq(s, step)) {
            return Err(LayoutError::DuplicateStep {
                group_id: step.group_id().to_owned(),
                layout_name: step.layout_name().to_owned(),
            });
        }
        if step.owner().is_some_and(|owner| owner != self.id) {
            return Err(LayoutError::StepOwnedElsewhere {
                group_id: step.group_id().to_owned(),
            });
        }
        Ok(())
    }

    /// Append a step.
    pub fn add_scaling_step(&mut self, step: StepRef) -> Result<()> {
        let index = self.steps.len();
        self.add_scaling_step_at_index(step, index)
    }

    /// Insert a step at `index` (`index == len` appends).
    pub fn add_scaling_step_at_index(&mut self, step: StepRef, index: usize) -> Result<()> {
        if index > self.steps.len() {
            return Err(LayoutError::StepIndexOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        self.check_insertable(&step)?;
        step.owner.set(Some(self.id));
        self.steps.insert(index, step);
        self.dirty = true;
        Ok(())
    }

    /// Remove `step`; returns whether it was present.
    pub fn remove_scaling_step(&mut self, step: &StepRef) -> bool {
        match self.steps.iter().position(|s| Rc::ptr_eq(s, step)) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Remove and return the step at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<StepRef> {
        if index >= self.steps.len() {
            return Err(LayoutError::StepIndexOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        let step = self.steps.remove(index);
        step.owner.set(None);
        self.dirty = true;
        Ok(step)
    }

    #[must_use]
    pub fn steps(&self) -> &[StepRef] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&StepRef> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn position_of(&self, step: &StepRef) -> Option<usize> {
        self.steps.iter().position(|s| Rc::ptr_eq(s, step))
    }

    /// Nearest step before `index` that targets the same group.
    #[must_use]
    pub fn previous_step(&self, index: usize) -> Option<&StepRef> {
        let group = self.steps.get(index)?.group_id();
        self.steps[..index]
            .iter()
            .rev()
            .find(|s| s.group_id() == group)
    }

    /// Layout the group showed before step `index` was applied.
    #[must_use]
    pub fn previous_layout_name(&self, index: usize) -> Option<&str> {
        match self.previous_step(index) {
            Some(step) => Some(step.layout_name()),
            None => self.max_size(self.steps.get(index)?.group_id()),
        }
    }

    /// Whether the registry changed since the last [`clear_dirty`](Self::clear_dirty).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Build from a declarative definition.
    pub fn from_definition(def: &ScalingDefinition) -> Result<Self> {
        let mut scaling = Self::new();
        for max in &def.max_sizes {
            scaling.set_group_max_size(&max.group_id, &max.size);
        }
        for step_def in &def.steps {
            let mut step = ScalingStep::new(&step_def.group_id, &step_def.size)?;
            if let Some(hint) = &step_def.popup_size {
                step = step.with_popup_size_hint(hint);
            }
            if let Some(message) = &step_def.warning_message {
                step = step.with_warning(message);
            }
            scaling.add_scaling_step(step.into_ref())?;
        }
        scaling.dirty = false;
        Ok(scaling)
    }
}

impl Drop for Scaling {
    fn drop(&mut self) {
        for step in &self.steps {
            step.owner.set(None);
        }
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// `{ "groupId": ..., "size": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxSizeDefinition {
    pub group_id: String,
    pub size: String,
}

/// One declarative scaling step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStepDefinition {
    pub group_id: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

/// Declarative form of [`Scaling`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingDefinition {
    #[serde(default)]
    pub max_sizes: Vec<MaxSizeDefinition>,
    #[serde(default)]
    pub steps: Vec<ScaleStepDefinition>,
}
