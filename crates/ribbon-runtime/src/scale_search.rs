#![forbid(unsafe_code)]

//! Scale search: fit the selected tab into the viewport.
//!
//! Each pass follows the same order:
//!
//! 1. **Visibility gate**: below `min_visible_width` the ribbon is hidden
//!    instead of scaled; once space returns it is shown and re-measured.
//! 2. **Fast path**: a persisted record for this tab whose viewport and
//!    scaling hint match is replayed with `scale_index`, skipping search.
//! 3. **Baseline**: render the tab at its current scale (max when it was
//!    never scaled) so there is something to measure.
//! 4. **Scale down** while horizontal room, vertical room, or any group's
//!    overflow says the tab does not fit.
//! 5. **Scale up**, only if nothing was scaled down, while horizontal room
//!    exceeds `scale_up_margin`. An overshoot is reverted and ends the
//!    phase.
//! 6. **Persist** `{viewport, index, horizontal room, hint}`, unless the
//!    pass was hidden, replayed, or cut short by the retry budget. An
//!    unfinished search is never replayed; the next pass resumes it.
//!
//! Every mutation is followed by a refresh before the next measurement, so
//! no decision is made against stale geometry.
//!
//! # Failure Modes
//!
//! - Running out of steps while still too wide sets
//!   [`ScaleOutcome::no_room`]; the tab stays at its smallest scale.
//! - Spending `retry_budget` attempts sets
//!   [`ScaleOutcome::budget_exhausted`]; the tab stays where it got to and
//!   nothing is persisted.
//! - A pass started while the resize latch is held does nothing and
//!   reports [`ScaleOutcome::suppressed`].
//!
//! None of these are errors.

use ribbon_core::geometry::Size;
use ribbon_layout::{Host, Measure, NodeId, ScalePosition};
use serde::Serialize;
use tracing::{debug, debug_span, warn};
use web_time::Instant;

use crate::error::Result;
use crate::hint::scaling_hint;
use crate::ribbon::{Ribbon, RibbonEvent};
use crate::scale_cache::ScaleRecord;

/// Free space around the selected tab's groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Room {
    /// Tab width minus the summed group widths.
    pub h_room: i64,
    /// Tab height minus the tallest group.
    pub v_room: i64,
    /// Some group's shown layout spills out of the group box.
    pub overflowing: bool,
}

impl Room {
    /// Whether the tab has to shrink.
    #[must_use]
    pub fn needs_down(&self) -> bool {
        self.h_room < 0 || self.v_room < 0 || self.overflowing
    }
}

/// Result of one scale pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScaleOutcome {
    /// The scale index differs from the one the pass started at.
    pub changed: bool,
    pub down_count: u32,
    pub up_count: u32,
    /// Every step is applied and the tab still does not fit.
    pub no_room: bool,
    pub budget_exhausted: bool,
    /// A persisted decision was replayed.
    pub fast_path: bool,
    /// The ribbon is hidden for lack of width.
    pub hidden: bool,
    /// Another pass held the resize latch; nothing was done.
    pub suppressed: bool,
    /// Scale index at the end of the pass.
    pub index: i32,
    pub h_room: i64,
    pub v_room: i64,
}

impl ScaleOutcome {
    fn suppressed(index: i32) -> Self {
        Self {
            suppressed: true,
            index,
            ..Self::default()
        }
    }

    fn with_room(mut self, room: Room) -> Self {
        self.h_room = room.h_room;
        self.v_room = room.v_room;
        self
    }
}

/// Structured record of a scale pass, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleEvidence {
    pub schema: &'static str,
    pub tab: Option<String>,
    pub viewport_w: u32,
    pub viewport_h: u32,
    #[serde(flatten)]
    pub outcome: ScaleOutcome,
    pub elapsed_us: u64,
}

impl ScaleEvidence {
    pub const SCHEMA: &'static str = "ribbon-scale-v1";

    fn new(tab: Option<String>, viewport: Size, outcome: ScaleOutcome, started: Instant) -> Self {
        Self {
            schema: Self::SCHEMA,
            tab,
            viewport_w: viewport.width,
            viewport_h: viewport.height,
            outcome,
            elapsed_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        }
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Ribbon {
    /// Run one scale pass for the selected tab.
    pub fn scale<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<ScaleOutcome> {
        let Some(_guard) = self.latch.try_engage() else {
            let index = self
                .selected_tab()
                .and_then(|t| self.tree.scale_position(t).ok())
                .map_or(ScalePosition::NEVER_SCALED_INDEX, ScalePosition::index);
            debug!("scale pass suppressed, resize already in progress");
            return Ok(ScaleOutcome::suppressed(index));
        };

        let started = Instant::now();
        let viewport = host.viewport();
        let Some(tab) = self.selected_tab() else {
            self.refresh(host)?;
            let outcome = ScaleOutcome {
                hidden: self.hidden,
                index: ScalePosition::NEVER_SCALED_INDEX,
                ..ScaleOutcome::default()
            };
            self.last_evidence = Some(ScaleEvidence::new(None, viewport, outcome, started));
            return Ok(outcome);
        };
        self.tree.ensure_ready(tab)?;
        let tab_id = self
            .tree
            .get(tab)?
            .component_id()
            .to_owned();

        let span = debug_span!(
            "ribbon.scale",
            tab = %tab_id,
            viewport_w = viewport.width,
            viewport_h = viewport.height
        );
        let _enter = span.enter();

        let start_index = self.tree.scale_position(tab)?.index();
        let hint = scaling_hint(&self.tree, tab)?;
        let mut outcome = self.search(tab, &tab_id, &hint, viewport, host)?;

        outcome.index = self.tree.scale_position(tab)?.index();
        outcome.changed = outcome.index != start_index;
        if self.config.scale.use_cache
            && !outcome.hidden
            && !outcome.fast_path
            && !outcome.budget_exhausted
        {
            let record = ScaleRecord::new(viewport, outcome.index, outcome.h_room, hint);
            self.store.set(&tab_id, record.encode());
        }
        if outcome.changed {
            self.emit(RibbonEvent::ScaleOccurred {
                tab: tab_id.clone(),
                index: outcome.index,
            });
        }
        self.reconcile_popup(host)?;

        let evidence = ScaleEvidence::new(Some(tab_id), viewport, outcome, started);
        debug!(evidence = %evidence.to_jsonl(), "scale pass complete");
        self.last_evidence = Some(evidence);
        Ok(outcome)
    }

    fn search<H: Host + ?Sized>(
        &mut self,
        tab: NodeId,
        tab_id: &str,
        hint: &str,
        viewport: Size,
        host: &mut H,
    ) -> Result<ScaleOutcome> {
        let mut outcome = ScaleOutcome::default();

        if viewport.width < self.config.scale.min_visible_width {
            self.refresh(host)?;
            self.set_hidden(true, host);
            outcome.hidden = true;
            return Ok(outcome);
        }

        if let Some(record) = self.cached_record(tab_id, viewport, hint) {
            if self.tree.scale_position(tab)?.index() != record.index {
                self.tree.scale_index(tab, record.index)?;
            }
            self.set_hidden(false, host);
            self.refresh(host)?;
            debug!(index = record.index, "replayed persisted scale");
            outcome.fast_path = true;
            outcome.h_room = record.h_room;
            outcome.v_room = self.measure(tab, host)?.v_room;
            return Ok(outcome);
        }

        if self.tree.scale_position(tab)? == ScalePosition::NeverScaled {
            self.tree.scale_max(tab)?;
        }
        self.set_hidden(false, host);
        self.refresh(host)?;

        let budget = self.config.scale.retry_budget;
        let mut attempts = 0;
        let mut room = self.measure(tab, host)?;

        while room.needs_down() {
            if attempts >= budget {
                outcome.budget_exhausted = true;
                warn!(attempts, "scale retry budget exhausted while shrinking");
                break;
            }
            attempts += 1;
            if !self.tree.scale_down(tab)? {
                outcome.no_room = true;
                warn!(h_room = room.h_room, v_room = room.v_room, "no room: every scaling step applied");
                break;
            }
            outcome.down_count += 1;
            self.refresh(host)?;
            room = self.measure(tab, host)?;
            debug!(
                index = self.tree.scale_position(tab)?.index(),
                h_room = room.h_room,
                v_room = room.v_room,
                overflowing = room.overflowing,
                "scaled down"
            );
        }

        if outcome.down_count == 0 && !room.needs_down() {
            let margin = i64::from(self.config.scale.scale_up_margin);
            while room.h_room > margin {
                if attempts >= budget {
                    outcome.budget_exhausted = true;
                    warn!(attempts, "scale retry budget exhausted while growing");
                    break;
                }
                attempts += 1;
                if !self.tree.scale_up(tab)? {
                    break;
                }
                self.refresh(host)?;
                let next = self.measure(tab, host)?;
                if next.needs_down() {
                    self.tree.scale_down(tab)?;
                    self.refresh(host)?;
                    room = self.measure(tab, host)?;
                    debug!(index = self.tree.scale_position(tab)?.index(), "scale up overshot, reverted");
                    break;
                }
                outcome.up_count += 1;
                room = next;
                debug!(
                    index = self.tree.scale_position(tab)?.index(),
                    h_room = room.h_room,
                    "scaled up"
                );
            }
        }

        Ok(outcome.with_room(room))
    }

    fn cached_record(&self, tab_id: &str, viewport: Size, hint: &str) -> Option<ScaleRecord> {
        if !self.config.scale.use_cache {
            return None;
        }
        let raw = self.store.get(tab_id)?;
        match ScaleRecord::parse(&raw) {
            Some(record) if record.matches(viewport, hint) => Some(record),
            Some(_) => None,
            None => {
                debug!(record = %raw, "ignoring malformed scale record");
                None
            }
        }
    }

    /// Measure the selected tab's free space against its rendered groups.
    pub fn measure<M: Measure + ?Sized>(&mut self, tab: NodeId, host: &M) -> Result<Room> {
        let Some(tab_box) = self.tree.element_box(tab, host) else {
            return Ok(Room::default());
        };
        let mut used_w = 0_i64;
        let mut used_h = 0_i64;
        let mut overflowing = false;
        for group in self.tree.tab_groups(tab)? {
            if let Some(group_box) = self.tree.element_box(group, host) {
                used_w += i64::from(group_box.width);
                used_h = used_h.max(i64::from(group_box.height));
            }
            overflowing |= self.tree.is_overflowing(group, host)?;
        }
        Ok(Room {
            h_room: i64::from(tab_box.width) - used_w,
            v_room: i64::from(tab_box.height) - used_h,
            overflowing,
        })
    }
}
