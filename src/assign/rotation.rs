//! Round-robin duty rotation
//!
//! Every item goes to the students who have had it least often. Ties are
//! broken by the fewest assignments over all items, then randomly. Within a
//! run nobody gets a second item while someone else is still waiting; the
//! candidate pool is only widened once the unassigned students run out:
//!
//! 1. students not yet assigned anything this run
//! 2. plus students who have never had this item
//! 3. the whole roster again (the "used this run" set is cleared)
//!
//! An item listed twice needs two students and is filled as a pair: the best
//! ranked boy and the best ranked girl when both are available.

use rand::Rng;
use std::collections::HashSet;

use super::types::{item_slots, AssignedItem};
use crate::history::ItemAssignmentHistory;
use crate::roster::{Sex, Student};

/// How far the candidate pool had to be widened for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTier {
    Unassigned,
    NeverHadItem,
    Reset,
}

#[derive(Debug, Clone)]
pub struct RotationOutcome {
    pub assignments: Vec<AssignedItem>,
    pub history: ItemAssignmentHistory,
    /// Number of times the run fell back to the full roster
    pub pool_resets: usize,
}

/// Runs one rotation over `items` and returns the winners with the updated history.
/// The input history is left untouched.
pub fn assign_rotation<R: Rng + ?Sized>(
    students: &[Student],
    items: &[String],
    history: &ItemAssignmentHistory,
    rng: &mut R,
) -> RotationOutcome {
    let mut history = history.clone();
    let mut assignments = Vec::new();
    let mut pool_resets = 0;

    if students.is_empty() || items.is_empty() {
        return RotationOutcome {
            assignments,
            history,
            pool_resets,
        };
    }

    let slots = item_slots(items);
    let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
    history.ensure_keys(slots.iter().map(|s| s.item.as_str()), &ids);

    let mut used: HashSet<String> = HashSet::new();

    for slot in &slots {
        let needed = slot.multiplicity.min(students.len());
        let (pool, tier) = available_pool(students, &slot.item, &history, &mut used, needed);
        match tier {
            PoolTier::Unassigned => {}
            PoolTier::NeverHadItem => {
                tracing::debug!(item = %slot.item, "Widened pool to students who never had this item")
            }
            PoolTier::Reset => {
                pool_resets += 1;
                tracing::debug!(item = %slot.item, "Pool exhausted, resetting to full roster");
            }
        }

        let ranked = rank_candidates(&pool, &slot.item, &history, rng);
        let winners = if needed == 2 {
            pick_pair(&ranked)
        } else {
            ranked.into_iter().take(needed).collect()
        };

        for student in winners {
            history.increment(&slot.item, &student.id);
            used.insert(student.id.clone());
            assignments.push(AssignedItem::new(&slot.item, student));
        }
    }

    RotationOutcome {
        assignments,
        history,
        pool_resets,
    }
}

/// Returns the narrowest pool holding at least `needed` students
fn available_pool<'a>(
    students: &'a [Student],
    item: &str,
    history: &ItemAssignmentHistory,
    used: &mut HashSet<String>,
    needed: usize,
) -> (Vec<&'a Student>, PoolTier) {
    let unassigned: Vec<&Student> = students.iter().filter(|s| !used.contains(&s.id)).collect();
    if unassigned.len() >= needed {
        return (unassigned, PoolTier::Unassigned);
    }

    let widened: Vec<&Student> = students
        .iter()
        .filter(|s| !used.contains(&s.id) || history.count(item, &s.id) == 0)
        .collect();
    if widened.len() >= needed {
        return (widened, PoolTier::NeverHadItem);
    }

    used.clear();
    (students.iter().collect(), PoolTier::Reset)
}

/// Sorts candidates by (item count, total count, random tiebreak), lowest first
fn rank_candidates<'a, R: Rng + ?Sized>(
    pool: &[&'a Student],
    item: &str,
    history: &ItemAssignmentHistory,
    rng: &mut R,
) -> Vec<&'a Student> {
    let mut keyed: Vec<((u32, u32, u64), &Student)> = pool
        .iter()
        .map(|s| {
            let key = (history.count(item, &s.id), history.total_for(&s.id), rng.gen::<u64>());
            (key, *s)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, s)| s).collect()
}

/// Best ranked male and female in rank order, or the top two if one sex is missing
fn pick_pair<'a>(ranked: &[&'a Student]) -> Vec<&'a Student> {
    let best_of = |sex: Sex| ranked.iter().position(|s| s.sex == sex);
    match (best_of(Sex::Male), best_of(Sex::Female)) {
        (Some(m), Some(f)) => {
            let (first, second) = if m < f { (m, f) } else { (f, m) };
            vec![ranked[first], ranked[second]]
        }
        _ => ranked.iter().take(2).copied().collect(),
    }
}
