//! Flight reconciliation
//!
//!  Keeps one live entity per aircraft identity across snapshots. Each cycle
//!  classifies the new batch, then diffs it against the live map and drives
//!  the view sink in three passes: remove, update, create.
//!
//!  The live map and the selection are owned here and nowhere else. After a
//!  cycle every live identity is part of the batch, and at most one entity
//!  carries the selected flag (the one named by the selection).

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info};

use crate::airport::AirportRegistry;
use crate::classifier;
use crate::error::{Result, TrackerError};
use crate::eta;
use crate::flight::ClassifiedFlight;
use crate::selection::SelectionState;
use crate::source::Snapshot;
use crate::view::ViewSink;

/// One tracked, drawn aircraft
#[derive(Debug, Clone)]
pub struct LiveEntity<H> {
    /// Last classification seen for this identity
    pub flight: ClassifiedFlight,
    /// View handle returned by the sink on creation
    pub handle: H,
    pub is_selected: bool,
}

/// Identity map plus the selection
#[derive(Debug)]
pub struct ReconciliationState<H> {
    entities: HashMap<String, LiveEntity<H>>,
    selection: SelectionState,
}

impl<H> Default for ReconciliationState<H> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            selection: SelectionState::new(),
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Source was unavailable, nothing touched
    pub skipped: bool,
    pub created: usize,
    pub updated: usize,
    /// Live entities whose new sample had no position (visual left in place)
    pub held: usize,
    /// New identities without a position, not drawn yet
    pub deferred: usize,
    pub removed: usize,
}

pub struct Reconciler<S: ViewSink> {
    airports: AirportRegistry,
    sink: S,
    state: ReconciliationState<S::Handle>,
}

impl<S: ViewSink> Reconciler<S> {
    pub fn new(airports: AirportRegistry, sink: S) -> Self {
        Self {
            airports,
            sink,
            state: ReconciliationState::default(),
        }
    }

    /// Run one cycle. An unavailable snapshot leaves everything untouched.
    pub fn process_cycle(&mut self, snapshot: Snapshot) -> Result<CycleReport> {
        let samples = match snapshot {
            Snapshot::Observed(samples) => samples,
            Snapshot::Unavailable => {
                debug!("Source unavailable, keeping {} live flights", self.state.entities.len());
                return Ok(CycleReport {
                    skipped: true,
                    ..Default::default()
                });
            }
        };

        let batch = samples
            .iter()
            .map(|s| classifier::classify(s, &self.airports))
            .collect();
        let report = self.reconcile(batch)?;

        info!(
            "Cycle: {} live, {} created, {} updated, {} held, {} deferred, {} removed",
            self.state.entities.len(),
            report.created,
            report.updated,
            report.held,
            report.deferred,
            report.removed
        );
        Ok(report)
    }

    /// Diff an already classified batch against the live map
    pub fn reconcile(&mut self, batch: Vec<ClassifiedFlight>) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        // Last sample wins for an identity repeated within one batch
        let mut order = Vec::with_capacity(batch.len());
        let mut by_id: HashMap<String, ClassifiedFlight> = HashMap::with_capacity(batch.len());
        for flight in batch {
            let id = flight.identity().to_string();
            if by_id.insert(id.clone(), flight).is_none() {
                order.push(id);
            } else {
                debug!("Duplicate sample for {} in batch, keeping the last one", id);
            }
        }
        let batch_ids: HashSet<String> = order.iter().cloned().collect();

        let mut gone: Vec<String> = self
            .state
            .entities
            .keys()
            .filter(|id| !batch_ids.contains(*id))
            .cloned()
            .collect();
        gone.sort();
        for id in &gone {
            self.remove(id);
            report.removed += 1;
        }

        let mut fresh = Vec::new();
        for id in order {
            let Some(flight) = by_id.remove(&id) else {
                continue;
            };
            let Some(entity) = self.state.entities.get_mut(&id) else {
                fresh.push(flight);
                continue;
            };

            entity.flight = flight;
            if entity.flight.position().is_none() {
                report.held += 1;
                continue;
            }
            self.sink.update(&entity.handle, &entity.flight);
            if entity.is_selected {
                show_detail(&mut self.sink, &entity.flight);
            }
            report.updated += 1;
        }

        for flight in fresh {
            if flight.position().is_none() {
                debug!("Deferring {}: no position yet", flight.identity());
                report.deferred += 1;
                continue;
            }
            self.create(flight);
            report.created += 1;
        }

        self.check_invariants(&batch_ids)?;
        Ok(report)
    }

    /// Select an identity. Unknown identities are remembered and highlighted
    /// once they show up.
    pub fn select(&mut self, identity: &str) {
        if let Some(prev) = self.state.selection.replace(identity) {
            self.unmark(&prev);
        }

        match self.state.entities.get_mut(identity) {
            Some(entity) => {
                entity.is_selected = true;
                self.sink.set_selected_visual(&entity.handle, true);
                show_detail(&mut self.sink, &entity.flight);
                debug!("Selected {}", identity);
            }
            None => debug!("Selected {} (not live yet)", identity),
        }
    }

    /// Drop the selection and hide the detail view
    pub fn clear_selection(&mut self) {
        if let Some(prev) = self.state.selection.take() {
            self.unmark(&prev);
            debug!("Cleared selection of {}", prev);
        }
        self.sink.hide_detail();
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.selection.selected()
    }

    #[allow(dead_code)]
    pub fn entity(&self, identity: &str) -> Option<&LiveEntity<S::Handle>> {
        self.state.entities.get(identity)
    }

    #[cfg(test)]
    pub fn entity_mut(&mut self, identity: &str) -> Option<&mut LiveEntity<S::Handle>> {
        self.state.entities.get_mut(identity)
    }

    #[allow(dead_code)]
    pub fn entities(&self) -> impl Iterator<Item = (&str, &LiveEntity<S::Handle>)> {
        self.state.entities.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.state.entities.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.state.entities.is_empty()
    }

    #[allow(dead_code)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[allow(dead_code)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn create(&mut self, flight: ClassifiedFlight) {
        let id = flight.identity().to_string();
        let handle = self.sink.create(&id, &flight);
        let is_selected = self.state.selection.is_selected(&id);
        if is_selected {
            self.sink.set_selected_visual(&handle, true);
            show_detail(&mut self.sink, &flight);
        }
        debug!("New flight {} ({}) {}", id, flight.label(), flight.phase);

        self.state.entities.insert(
            id,
            LiveEntity {
                flight,
                handle,
                is_selected,
            },
        );
    }

    fn remove(&mut self, identity: &str) {
        let Some(entity) = self.state.entities.remove(identity) else {
            return;
        };
        self.sink.destroy(&entity.handle);
        debug!("Removed flight {} ({})", identity, entity.flight.label());

        if self.state.selection.is_selected(identity) {
            self.state.selection.take();
            self.sink.hide_detail();
        }
    }

    fn unmark(&mut self, identity: &str) {
        if let Some(entity) = self.state.entities.get_mut(identity) {
            if entity.is_selected {
                entity.is_selected = false;
                self.sink.set_selected_visual(&entity.handle, false);
            }
        }
    }

    /// Internal consistency of the identity map and the selection
    fn check_invariants(&self, batch_ids: &HashSet<String>) -> Result<()> {
        let violation = |msg: String| {
            error!("Reconciliation invariant violated: {}", msg);
            Err(TrackerError::InvariantViolation(msg))
        };

        let mut marked = Vec::new();
        for (id, entity) in &self.state.entities {
            if entity.flight.identity() != id {
                return violation(format!("entity {} stores flight {}", id, entity.flight.identity()));
            }
            if !batch_ids.contains(id) {
                return violation(format!("entity {} is not part of the batch", id));
            }
            if entity.is_selected {
                marked.push(id.as_str());
            }
        }

        let selected = self.state.selection.selected();
        match marked.as_slice() {
            [] => {
                if let Some(id) = selected {
                    if self.state.entities.contains_key(id) {
                        return violation(format!("selected entity {} is not marked", id));
                    }
                }
            }
            [id] if selected == Some(*id) => {}
            [id] => return violation(format!("entity {} marked but selection is {:?}", id, selected)),
            many => return violation(format!("{} entities marked selected: {:?}", many.len(), many)),
        }
        Ok(())
    }
}

fn show_detail<S: ViewSink>(sink: &mut S, flight: &ClassifiedFlight) {
    sink.render_detail(flight, eta::estimate(flight), eta::flight_level(flight.sample.baro_altitude));
}
