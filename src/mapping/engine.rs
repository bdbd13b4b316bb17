use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use super::store::{MappingStore, PurgeCounts};
use super::MappingError;
use crate::models::{ehr, FormField, MappableItem, Mapping, MappingKey, MappingSuggestion};

/// Candidate items from one settled snapshot that still need a suggestion.
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub id: Uuid,
    pub items: Vec<MappableItem>,
}

impl EvaluationPlan {
    pub fn keys(&self) -> impl Iterator<Item = MappingKey> + '_ {
        self.items.iter().map(MappableItem::key)
    }
}

/// Result of planning one settled snapshot.
#[derive(Debug, Default)]
pub struct PlanOutcome {
    /// `None` when no field needs a lookup.
    pub plan: Option<EvaluationPlan>,
    pub fields_analyzed: usize,
    pub suggestions_dropped: usize,
}

/// Keeps the suggestion set consistent with the field list and confirmed mappings.
///
/// Synchronous and I/O free: `plan` decides what to ask for, the caller
/// acquires suggestions, `complete` merges them against the state at that time.
#[derive(Debug, Default)]
pub struct MappingSuggestionEngine {
    store: MappingStore,
    /// Field list as of the previous settled snapshot.
    settled: HashMap<String, FormField>,
    /// Field ids in the most recently observed list.
    live: HashSet<String>,
    /// Settled fields purged since the last settle. Restoring one with the
    /// same content re-analyzes it without clearing its dismissals.
    purged: HashSet<String>,
    /// Keys each in-flight plan is waiting on.
    in_flight: HashMap<Uuid, HashSet<MappingKey>>,
}

/// How a field in a settled snapshot relates to the previous one.
enum FieldChange {
    New,
    Changed,
    Restored,
}

impl MappingSuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop suggestions for fields absent from `fields`. Not debounced.
    /// Returns the number of suggestions dropped.
    pub fn purge_removed(&mut self, fields: &[FormField]) -> usize {
        self.live = fields.iter().map(|f| f.id.clone()).collect();
        let live = &self.live;
        self.purged
            .extend(self.settled.keys().filter(|id| !live.contains(*id)).cloned());
        let dropped = self.store.retain_suggestions(|s| live.contains(&s.field_id));
        if dropped > 0 {
            tracing::debug!(dropped, "Purged suggestions for removed fields");
        }
        dropped
    }

    /// Upsert mappings confirmed outside the engine (e.g. manual UI links).
    /// Mappings for fields absent from `fields` are stale and skipped.
    pub fn sync_confirmed(&mut self, fields: &[FormField], mappings: &[Mapping]) {
        let field_ids: HashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        for mapping in mappings {
            if !field_ids.contains(mapping.field_id.as_str()) {
                tracing::debug!(key = %mapping.key(), "Skipping confirmed mapping for absent field");
                continue;
            }
            if !ehr::is_known(&mapping.ehr_path) {
                tracing::warn!(
                    key = %mapping.key(),
                    path = %mapping.ehr_path,
                    "Ignoring confirmed mapping with unknown EHR path"
                );
                continue;
            }
            let unchanged = self
                .store
                .confirmed()
                .any(|m| m.key() == mapping.key() && m.ehr_path == mapping.ehr_path);
            if !unchanged {
                self.store.confirm(mapping.clone());
            }
        }
    }

    /// Diff a settled snapshot against the previous one and collect the
    /// items that need a suggestion lookup. Marks those keys as analyzing.
    pub fn plan(&mut self, fields: &[FormField]) -> PlanOutcome {
        let mut outcome = PlanOutcome {
            suggestions_dropped: self.purge_removed(fields),
            ..PlanOutcome::default()
        };

        let mut candidates = Vec::new();
        for field in fields {
            let change = match self.settled.get(&field.id) {
                None => FieldChange::New,
                Some(previous) if field.mapping_content_changed(previous) => FieldChange::Changed,
                Some(_) if self.purged.contains(&field.id) => FieldChange::Restored,
                Some(_) => continue,
            };
            outcome.fields_analyzed += 1;

            let items = field.mappable_items();
            match change {
                FieldChange::New => {
                    self.store.clear_dismissals_for_field(&field.id);
                }
                FieldChange::Changed => {
                    outcome.suggestions_dropped += self.refresh_changed_field(field, &items);
                }
                FieldChange::Restored => {}
            }

            candidates.extend(items.into_iter().filter(|item| !self.store.blocks(&item.key())));
        }

        self.settled = fields.iter().map(|f| (f.id.clone(), f.clone())).collect();
        self.purged.clear();

        if candidates.is_empty() {
            tracing::debug!(
                analyzed = outcome.fields_analyzed,
                "No mapping candidates in settled snapshot"
            );
            return outcome;
        }

        let plan = EvaluationPlan {
            id: Uuid::new_v4(),
            items: candidates,
        };
        self.in_flight.insert(plan.id, plan.keys().collect());

        tracing::debug!(
            plan_id = %plan.id,
            analyzed = outcome.fields_analyzed,
            candidates = plan.items.len(),
            "Planned mapping evaluation"
        );

        outcome.plan = Some(plan);
        outcome
    }

    /// A changed field's content moved on: earlier dismissals no longer
    /// apply, and suggestions for sub-items it no longer exposes are dropped.
    fn refresh_changed_field(&mut self, field: &FormField, items: &[MappableItem]) -> usize {
        self.store.clear_dismissals_for_field(&field.id);
        let current: HashSet<MappingKey> = items.iter().map(MappableItem::key).collect();
        self.store
            .retain_suggestions(|s| s.field_id != field.id || current.contains(&s.key()))
    }

    /// Merge acquired suggestions for `plan` against the current state.
    /// Always releases the plan's analyzing keys. Returns how many were added.
    ///
    /// A suggestion is kept only if its key was planned and is still a
    /// mappable item of a live field in the latest settled snapshot.
    pub fn complete(&mut self, plan: &EvaluationPlan, suggestions: Vec<MappingSuggestion>) -> usize {
        self.in_flight.remove(&plan.id);

        let plan_keys: HashSet<MappingKey> = plan.keys().collect();
        let plan_fields: HashSet<&str> = plan.items.iter().map(|i| i.field_id.as_str()).collect();
        let current: HashSet<MappingKey> = plan_fields
            .into_iter()
            .filter(|id| self.live.contains(*id))
            .filter_map(|id| self.settled.get(id))
            .flat_map(FormField::mappable_items)
            .map(|item| item.key())
            .collect();

        let mut added = 0;
        for suggestion in suggestions {
            let key = suggestion.key();
            if !plan_keys.contains(&key) || !current.contains(&key) {
                continue;
            }
            if self.store.insert_suggestion(suggestion) {
                added += 1;
            }
        }

        let live = &self.live;
        let dropped = self.store.retain_suggestions(|s| live.contains(&s.field_id));

        tracing::debug!(plan_id = %plan.id, added, dropped, "Merged mapping suggestions");
        added
    }

    /// Promote a suggestion to a confirmed mapping. No-op if absent.
    pub fn accept_suggestion(&mut self, key: &MappingKey) -> Option<Mapping> {
        let suggestion = self.store.take_suggestion(key)?;
        let mapping = suggestion.into_mapping();
        self.store.confirm(mapping.clone());
        tracing::info!(key = %key, path = %mapping.ehr_path, "Mapping suggestion accepted");
        Some(mapping)
    }

    /// Record a dismissal and drop the matching suggestion. Idempotent.
    pub fn dismiss_suggestion(&mut self, key: &MappingKey) -> bool {
        let newly = self.store.dismiss(key.clone());
        if newly {
            tracing::info!(key = %key, "Mapping suggestion dismissed");
        }
        newly
    }

    /// Manually link a field (or sub-item) to a catalog path.
    pub fn confirm_mapping(
        &mut self,
        field_id: &str,
        sub_field_key: Option<&str>,
        ehr_path: &str,
    ) -> Result<Mapping, MappingError> {
        if !ehr::is_known(ehr_path) {
            return Err(MappingError::UnknownEhrPath(ehr_path.to_string()));
        }
        let mapping = Mapping::new(field_id, sub_field_key, ehr_path);
        self.store.confirm(mapping.clone());
        tracing::info!(key = %mapping.key(), path = ehr_path, "Mapping confirmed");
        Ok(mapping)
    }

    pub fn remove_mapping(&mut self, key: &MappingKey) -> Option<Mapping> {
        let removed = self.store.remove_mapping(key);
        if removed.is_some() {
            tracing::info!(key = %key, "Mapping removed");
        }
        removed
    }

    /// Cascade delete: mappings, suggestions, dismissals and in-flight state
    /// referencing `field_id`.
    pub fn remove_field(&mut self, field_id: &str) -> PurgeCounts {
        let counts = self.store.purge_field(field_id);
        self.settled.remove(field_id);
        self.live.remove(field_id);
        self.purged.remove(field_id);
        for keys in self.in_flight.values_mut() {
            keys.retain(|k| k.field_id() != field_id);
        }
        tracing::info!(
            field_id,
            mappings = counts.mappings,
            suggestions = counts.suggestions,
            dismissals = counts.dismissals,
            "Field removed"
        );
        counts
    }

    pub fn suggestions(&self) -> &[MappingSuggestion] {
        self.store.suggestions()
    }

    pub fn confirmed(&self) -> Vec<Mapping> {
        self.store.confirmed().cloned().collect()
    }

    pub fn dismissed(&self) -> Vec<MappingKey> {
        self.store.dismissed().cloned().collect()
    }

    pub fn analyzing_keys(&self) -> Vec<MappingKey> {
        let keys: BTreeSet<&MappingKey> = self.in_flight.values().flatten().collect();
        keys.into_iter().cloned().collect()
    }

    pub fn is_analyzing(&self, key: &MappingKey) -> bool {
        self.in_flight.values().any(|keys| keys.contains(key))
    }
}
