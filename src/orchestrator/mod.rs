//! Runs assigners end to end
//!
//! A run validates the request, loads the assigner record and the roster,
//! hands everything to the matching engine and saves the new history in one
//! write. Nothing is written unless the whole run succeeded, so a rejected
//! run can simply be retried.

pub mod response;
pub mod validation;

use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

use crate::assign::{assign_random, assign_rotation, assign_seats, AssignmentResult, SeatLayout};
use crate::error::{AssignError, CapacityRule, Result};
use crate::history::documents::{decode_or_fresh, encode};
use crate::history::{AssignerKind, AssignerRecord, HistoryStore, RotationHistoryDoc, SeatingHistoryDoc, StoreError};
use crate::roster::{ClassRoster, Group, RosterProvider};

pub use response::{RunData, RunResponse, GENERIC_FAILURE};
use validation::{
    build_units, check_capacity, require_items, require_kind, require_selection, require_students,
    require_user, resolve_groups, union_of_groups, AssignmentUnit,
};

pub struct Orchestrator {
    roster: Arc<dyn RosterProvider>,
    store: Arc<dyn HistoryStore>,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    pub fn new(roster: Arc<dyn RosterProvider>, store: Arc<dyn HistoryStore>, rng: StdRng) -> Self {
        Self {
            roster,
            store,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    pub async fn run_random_assigner(
        &self,
        user_id: &str,
        class_id: &str,
        assigner_id: &str,
        selected_group_ids: &[String],
    ) -> RunResponse {
        let result = async {
            let (class, record) = self.prepare(user_id, class_id, assigner_id).await?;
            require_kind(&record, AssignerKind::Random)?;
            self.random_run(&class, &record, selected_group_ids).await
        }
        .await;
        RunResponse::from_result(result, assigner_id, class_id)
    }

    pub async fn run_rotation_assigner(
        &self,
        user_id: &str,
        class_id: &str,
        assigner_id: &str,
        selected_group_ids: &[String],
    ) -> RunResponse {
        let result = async {
            let (class, record) = self.prepare(user_id, class_id, assigner_id).await?;
            require_kind(&record, AssignerKind::Rotation)?;
            self.rotation_run(&class, &record, selected_group_ids).await
        }
        .await;
        RunResponse::from_result(result, assigner_id, class_id)
    }

    /// Runs a seat assigner on data the caller has already loaded
    pub async fn run_seat_assigner(
        &self,
        class_data: &ClassRoster,
        assigner_data: &AssignerRecord,
        selected_group_ids: &[String],
    ) -> RunResponse {
        let result = async {
            require_kind(assigner_data, AssignerKind::Seat)?;
            self.seat_run(class_data, assigner_data, selected_group_ids).await
        }
        .await;
        RunResponse::from_result(result, &assigner_data.id, &class_data.class_id)
    }

    /// Loads the assigner and runs whichever engine its kind calls for
    pub async fn run_assigner(
        &self,
        user_id: &str,
        class_id: &str,
        assigner_id: &str,
        selected_group_ids: &[String],
    ) -> RunResponse {
        let result = async {
            let (class, record) = self.prepare(user_id, class_id, assigner_id).await?;
            match record.kind {
                AssignerKind::Random => self.random_run(&class, &record, selected_group_ids).await,
                AssignerKind::Rotation => self.rotation_run(&class, &record, selected_group_ids).await,
                AssignerKind::Seat => self.seat_run(&class, &record, selected_group_ids).await,
            }
        }
        .await;
        RunResponse::from_result(result, assigner_id, class_id)
    }

    /// Request checks plus loading the assigner (owned by `user_id`) and the class
    async fn prepare(
        &self,
        user_id: &str,
        class_id: &str,
        assigner_id: &str,
    ) -> Result<(ClassRoster, AssignerRecord)> {
        require_user(user_id)?;
        require_selection(class_id, assigner_id)?;

        let record = self
            .store
            .load(assigner_id)
            .await?
            .filter(|r| r.owner_id == user_id)
            .ok_or_else(|| AssignError::NotFound("Assigner".to_string()))?;
        let class = self
            .roster
            .get_class_roster(class_id)
            .await?
            .ok_or_else(|| AssignError::NotFound("Class".to_string()))?;
        Ok((class, record))
    }

    async fn selected_groups(&self, class_id: &str, selected_ids: &[String]) -> Result<Vec<Group>> {
        if selected_ids.is_empty() {
            return Ok(Vec::new());
        }
        let groups = self.roster.get_groups_with_students(class_id).await?;
        resolve_groups(&groups, selected_ids)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    async fn random_run(
        &self,
        class: &ClassRoster,
        record: &AssignerRecord,
        selected_group_ids: &[String],
    ) -> Result<RunData> {
        require_items(record)?;
        let groups = self.selected_groups(&class.class_id, selected_group_ids).await?;
        let units = build_units(&class.class_name, &class.students, &groups);
        require_students(&units)?;
        check_capacity(
            &record.name,
            record.items.len(),
            CapacityRule::ItemPerStudent,
            &units,
            !groups.is_empty(),
        )?;

        let assigned_data = self.with_rng(|rng| {
            let mut result = AssignmentResult::new();
            for unit in &units {
                result.insert(unit.label.clone(), assign_random(&unit.students, &record.items, rng));
            }
            result
        });

        tracing::info!(
            assigner_id = %record.id,
            class_id = %class.class_id,
            units = units.len(),
            "Random assigner run"
        );
        Ok(RunData {
            assigned_data,
            name: record.name.clone(),
        })
    }

    async fn rotation_run(
        &self,
        class: &ClassRoster,
        record: &AssignerRecord,
        selected_group_ids: &[String],
    ) -> Result<RunData> {
        require_items(record)?;
        let groups = self.selected_groups(&class.class_id, selected_group_ids).await?;
        let units: Vec<AssignmentUnit> = build_units(&class.class_name, &class.students, &groups);
        require_students(&units)?;
        check_capacity(
            &record.name,
            record.items.len(),
            CapacityRule::StudentPerItem,
            &units,
            !groups.is_empty(),
        )?;

        let mut doc: RotationHistoryDoc = decode_or_fresh(&record.history, &record.id);
        let class_history = doc.classes.remove(&class.class_id).unwrap_or_default();

        let (assigned_data, class_history, pool_resets) = self.with_rng(|rng| {
            let mut result = AssignmentResult::new();
            let mut history = class_history;
            let mut resets = 0;
            for unit in &units {
                let outcome = assign_rotation(&unit.students, &record.items, &history, rng);
                resets += outcome.pool_resets;
                history = outcome.history;
                result.insert(unit.label.clone(), outcome.assignments);
            }
            (result, history, resets)
        });

        doc.classes.insert(class.class_id.clone(), class_history);
        let value = encode(&doc).map_err(StoreError::from)?;
        let version = self.store.save(&record.id, value, record.version).await?;

        tracing::info!(
            assigner_id = %record.id,
            class_id = %class.class_id,
            version,
            pool_resets,
            "Rotation assigner run"
        );
        Ok(RunData {
            assigned_data,
            name: record.name.clone(),
        })
    }

    async fn seat_run(
        &self,
        class: &ClassRoster,
        record: &AssignerRecord,
        selected_group_ids: &[String],
    ) -> Result<RunData> {
        require_items(record)?;
        let groups = self.selected_groups(&class.class_id, selected_group_ids).await?;
        let students = if groups.is_empty() {
            class.students.clone()
        } else {
            union_of_groups(&groups)
        };

        let layout = SeatLayout::build(&record.items, &record.zones, &class.class_name)
            .map_err(AssignError::InvalidSeat)?;
        let unit = AssignmentUnit {
            label: class.class_name.clone(),
            students,
        };
        require_students(std::slice::from_ref(&unit))?;
        check_capacity(
            &record.name,
            layout.len(),
            CapacityRule::ItemPerStudent,
            std::slice::from_ref(&unit),
            false,
        )?;

        let mut doc: SeatingHistoryDoc = decode_or_fresh(&record.history, &record.id);
        let class_history = doc.classes.remove(&class.class_id).unwrap_or_default();

        let outcome = self.with_rng(|rng| assign_seats(&unit.students, &layout, &class_history, rng));

        doc.classes.insert(class.class_id.clone(), outcome.history);
        let value = encode(&doc).map_err(StoreError::from)?;
        let version = self.store.save(&record.id, value, record.version).await?;

        tracing::info!(
            assigner_id = %record.id,
            class_id = %class.class_id,
            version,
            even_sex = %outcome.even_sex,
            fallback = outcome.fallback_placements,
            "Seat assigner run"
        );
        Ok(RunData {
            assigned_data: outcome.result,
            name: record.name.clone(),
        })
    }
}
