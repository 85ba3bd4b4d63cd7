//! Seat plans with gender parity and repeat avoidance
//!
//! One sex fills the even-numbered seats and the other the odd ones, chosen
//! at random once per run. Each student, in random order, takes the free seat
//! of their parity with the highest score:
//!
//! - 3 for matching parity (other seats are not considered)
//! - +2 when no seat next to it holds someone they have sat next to before
//! - +1 when they have never had this seat
//!
//! Students left over because the sexes are unevenly split then take any free
//! seat, scored the same way with the parity term dropped to 0.

use rand::seq::SliceRandom;
use rand::Rng;

use super::seat_utils::{is_even_seat, SeatLayout};
use super::types::{AssignedItem, AssignmentResult};
use crate::history::SeatingHistory;
use crate::roster::{Sex, Student};

const PARITY_SCORE: i32 = 3;
const FRESH_NEIGHBORS_SCORE: i32 = 2;
const FRESH_SEAT_SCORE: i32 = 1;

#[derive(Debug, Clone)]
pub struct SeatOutcome {
    pub result: AssignmentResult,
    pub history: SeatingHistory,
    /// The sex that was given the even-numbered seats
    pub even_sex: Sex,
    /// Students placed by the fallback pass, ignoring parity
    pub fallback_placements: usize,
    /// Students with no seat left at all
    pub unplaced: Vec<String>,
}

/// Seats everyone, picking the parity rule at random
pub fn assign_seats<R: Rng + ?Sized>(
    students: &[Student],
    layout: &SeatLayout,
    history: &SeatingHistory,
    rng: &mut R,
) -> SeatOutcome {
    let even_sex = if rng.gen_bool(0.5) { Sex::Male } else { Sex::Female };
    assign_seats_with_parity(students, layout, history, even_sex, rng)
}

/// Seats everyone with a fixed parity rule
pub fn assign_seats_with_parity<R: Rng + ?Sized>(
    students: &[Student],
    layout: &SeatLayout,
    history: &SeatingHistory,
    even_sex: Sex,
    rng: &mut R,
) -> SeatOutcome {
    let mut order: Vec<&Student> = students.iter().collect();
    order.shuffle(rng);

    let mut plan = SeatingPlan::new(layout, history, even_sex);
    let leftovers = plan.place_all(&order, true);
    let still_left = plan.place_all(&leftovers, false);
    let fallback_placements = leftovers.len() - still_left.len();
    let unplaced: Vec<String> = still_left.iter().map(|s| s.id.clone()).collect();
    if fallback_placements > 0 {
        tracing::debug!(fallback_placements, "Seated leftover students ignoring parity");
    }
    if !unplaced.is_empty() {
        tracing::warn!(count = unplaced.len(), "Not enough seats for every student");
    }

    SeatOutcome {
        result: plan.result(),
        history: plan.updated_history(),
        even_sex,
        fallback_placements,
        unplaced,
    }
}

/// Seat occupancy during one run
struct SeatingPlan<'a> {
    layout: &'a SeatLayout,
    history: &'a SeatingHistory,
    even_sex: Sex,
    occupants: Vec<Option<&'a Student>>,
}

impl<'a> SeatingPlan<'a> {
    fn new(layout: &'a SeatLayout, history: &'a SeatingHistory, even_sex: Sex) -> Self {
        Self {
            layout,
            history,
            even_sex,
            occupants: vec![None; layout.len()],
        }
    }

    fn parity_matches(&self, student: &Student, seat: usize) -> bool {
        is_even_seat(self.layout.seats[seat].number) == (student.sex == self.even_sex)
    }

    /// None when the seat is excluded (strict pass, wrong parity)
    fn score(&self, student: &Student, seat: usize, strict: bool) -> Option<i32> {
        let mut score = if self.parity_matches(student, seat) {
            PARITY_SCORE
        } else if strict {
            return None;
        } else {
            0
        };

        let next_to_old_neighbor = self.layout.neighbors(seat).into_iter().any(|n| {
            self.occupants[n]
                .map(|other| self.history.has_sat_next_to(&student.id, &other.id))
                .unwrap_or(false)
        });
        if !next_to_old_neighbor {
            score += FRESH_NEIGHBORS_SCORE;
        }
        if !self.history.has_used_seat(&student.id, &self.layout.seats[seat].label) {
            score += FRESH_SEAT_SCORE;
        }
        Some(score)
    }

    /// Highest scoring free seat; the first one wins a tie
    fn best_seat(&self, student: &Student, strict: bool) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for seat in 0..self.layout.len() {
            if self.occupants[seat].is_some() {
                continue;
            }
            if let Some(score) = self.score(student, seat, strict) {
                if best.map(|(_, s)| score > s).unwrap_or(true) {
                    best = Some((seat, score));
                }
            }
        }
        best.map(|(seat, _)| seat)
    }

    /// Places students in order and returns those who found no seat
    fn place_all(&mut self, order: &[&'a Student], strict: bool) -> Vec<&'a Student> {
        let mut left = Vec::new();
        for &student in order {
            match self.best_seat(student, strict) {
                Some(seat) => self.occupants[seat] = Some(student),
                None => left.push(student),
            }
        }
        left
    }

    fn result(&self) -> AssignmentResult {
        let mut result = AssignmentResult::new();
        for name in &self.layout.zone_names {
            result.entry(name.clone()).or_default();
        }
        for (idx, seat) in self.layout.seats.iter().enumerate() {
            if let Some(student) = self.occupants[idx] {
                let zone = &self.layout.zone_names[seat.zone];
                result
                    .entry(zone.clone())
                    .or_default()
                    .push(AssignedItem::new(&seat.label, student));
            }
        }
        result
    }

    /// Appends this run's neighbors and seats to every seated student's record
    fn updated_history(&self) -> SeatingHistory {
        let mut history = self.history.clone();
        for (idx, seat) in self.layout.seats.iter().enumerate() {
            let student = match self.occupants[idx] {
                Some(s) => s,
                None => continue,
            };
            let neighbor_ids: Vec<String> = self
                .layout
                .neighbors(idx)
                .into_iter()
                .filter_map(|n| self.occupants[n].map(|other| other.id.clone()))
                .collect();
            let record = history.record_mut(&student.id);
            record.neighbors.extend(neighbor_ids);
            record.seats.push(seat.label.clone());
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SeatZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seats(n: u32) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    fn layout(n: u32) -> SeatLayout {
        SeatLayout::build(&seats(n), &[], "Class").unwrap()
    }

    fn seat_of<'r>(result: &'r AssignmentResult, student_id: &str) -> Option<&'r str> {
        result
            .values()
            .flatten()
            .find(|a| a.student_id == student_id)
            .map(|a| a.item.as_str())
    }

    #[test]
    fn parity_rule_places_each_sex() {
        let students = vec![
            Student::new("s1", "Sam", Sex::Male, 1),
            Student::new("s2", "Sue", Sex::Female, 2),
        ];
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = assign_seats_with_parity(
                &students,
                &layout(2),
                &SeatingHistory::new(),
                Sex::Female,
                &mut rng,
            );
            assert_eq!(seat_of(&outcome.result, "s2"), Some("2"));
            assert_eq!(seat_of(&outcome.result, "s1"), Some("1"));
        }
    }

    #[test]
    fn balanced_class_never_breaks_parity() {
        let students: Vec<Student> = (1..=8)
            .map(|i| {
                let sex = if i <= 4 { Sex::Male } else { Sex::Female };
                Student::new(&format!("s{}", i), "x", sex, i)
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(99);
        let outcome = assign_seats(&students, &layout(8), &SeatingHistory::new(), &mut rng);

        assert_eq!(outcome.fallback_placements, 0);
        for assigned in outcome.result.values().flatten() {
            let student = students.iter().find(|s| s.id == assigned.student_id).unwrap();
            let even = assigned.item.parse::<u32>().unwrap() % 2 == 0;
            assert_eq!(even, student.sex == outcome.even_sex);
        }
    }

    #[test]
    fn avoids_seat_next_to_previous_neighbor() {
        let t = Student::new("t", "Tia", Sex::Female, 1);
        let s = Student::new("s", "Sol", Sex::Male, 2);
        let mut history = SeatingHistory::new();
        let record = history.record_mut("s");
        record.seats.push("5".to_string());
        record.neighbors.push("t".to_string());

        let layout = layout(6);
        let mut plan = SeatingPlan::new(&layout, &history, Sex::Female);
        assert!(plan.place_all(&[&t], true).is_empty());
        // T takes the first fresh even seat
        assert_eq!(plan.occupants[1].map(|o| o.id.as_str()), Some("t"));

        // Seats 1 and 3 sit next to T, seat 5 was used before but is still better
        assert_eq!(plan.score(&s, 0, true), Some(4));
        assert_eq!(plan.score(&s, 2, true), Some(4));
        assert_eq!(plan.score(&s, 4, true), Some(5));
        assert_eq!(plan.score(&s, 1, true), None);

        assert!(plan.place_all(&[&s], true).is_empty());
        assert_eq!(plan.occupants[4].map(|o| o.id.as_str()), Some("s"));
    }

    #[test]
    fn leftover_students_take_any_seat() {
        let students: Vec<Student> = (1..=3)
            .map(|i| Student::new(&format!("m{}", i), "x", Sex::Male, i))
            .collect();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = assign_seats_with_parity(
            &students,
            &layout(4),
            &SeatingHistory::new(),
            Sex::Female,
            &mut rng,
        );
        assert_eq!(outcome.fallback_placements, 1);
        assert!(outcome.unplaced.is_empty());
        assert_eq!(outcome.result["Class"].len(), 3);
    }

    #[test]
    fn reports_students_without_a_seat() {
        let students: Vec<Student> = (1..=3)
            .map(|i| Student::new(&format!("s{}", i), "x", Sex::Female, i))
            .collect();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = assign_seats(&students, &layout(2), &SeatingHistory::new(), &mut rng);
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.result["Class"].len(), 2);
    }

    #[test]
    fn seats_students_at_the_top_of_the_number_range() {
        let layout = SeatLayout::build(
            &["4294967294".to_string(), "4294967295".to_string()],
            &[],
            "Class",
        )
        .unwrap();
        let students = vec![
            Student::new("a", "A", Sex::Male, 1),
            Student::new("b", "B", Sex::Female, 2),
        ];
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = assign_seats_with_parity(&students, &layout, &SeatingHistory::new(), Sex::Female, &mut rng);
        assert_eq!(seat_of(&outcome.result, "b"), Some("4294967294"));
        assert_eq!(seat_of(&outcome.result, "a"), Some("4294967295"));
        assert!(outcome.history.has_sat_next_to("a", "b"));
    }

    #[test]
    fn history_records_neighbors_and_seats() {
        let students = vec![
            Student::new("a", "A", Sex::Male, 1),
            Student::new("b", "B", Sex::Female, 2),
            Student::new("c", "C", Sex::Male, 3),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = assign_seats_with_parity(
            &students,
            &layout(3),
            &SeatingHistory::new(),
            Sex::Female,
            &mut rng,
        );
        // b is the only one on an even seat, between a and c
        let b = outcome.history.get("b").unwrap();
        assert_eq!(b.seats, vec!["2".to_string()]);
        assert_eq!(b.neighbors.len(), 2);
        assert!(outcome.history.has_sat_next_to("a", "b"));
        assert!(outcome.history.has_sat_next_to("c", "b"));
        assert!(!outcome.history.has_sat_next_to("a", "c"));
    }

    #[test]
    fn zones_appear_in_result_even_when_empty() {
        let zones = vec![
            SeatZone { name: "Front".to_string(), seats: seats(2) },
            SeatZone { name: "Back".to_string(), seats: vec!["3".to_string(), "4".to_string()] },
        ];
        let layout = SeatLayout::build(&seats(4), &zones, "Class").unwrap();
        let students = vec![Student::new("a", "A", Sex::Male, 1)];
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = assign_seats_with_parity(&students, &layout, &SeatingHistory::new(), Sex::Female, &mut rng);
        assert_eq!(outcome.result.len(), 2);
        assert_eq!(seat_of(&outcome.result, "a"), Some("1"));
        assert!(outcome.result["Back"].is_empty());
    }
}
