use rand::seq::SliceRandom;
use rand::Rng;

use super::types::AssignedItem;
use crate::roster::Student;

/// Shuffles the students and pairs them index-wise with the items.
///
/// Items beyond the number of students are left unassigned; students beyond
/// the number of items are dropped, so callers check capacity first.
pub fn assign_random<R: Rng + ?Sized>(
    students: &[Student],
    items: &[String],
    rng: &mut R,
) -> Vec<AssignedItem> {
    let mut shuffled: Vec<&Student> = students.iter().collect();
    shuffled.shuffle(rng);

    shuffled
        .into_iter()
        .zip(items.iter())
        .map(|(student, item)| AssignedItem::new(item, student))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Sex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn students(n: usize) -> Vec<Student> {
        (1..=n)
            .map(|i| Student::new(&format!("s{}", i), &format!("Student {}", i), Sex::Male, i as u32))
            .collect()
    }

    fn items(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Job {}", i)).collect()
    }

    #[test]
    fn every_student_gets_one_distinct_item() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = assign_random(&students(5), &items(8), &mut rng);

        assert_eq!(result.len(), 5);
        let ids: HashSet<&str> = result.iter().map(|a| a.student_id.as_str()).collect();
        let jobs: HashSet<&str> = result.iter().map(|a| a.item.as_str()).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(jobs.len(), 5);
        // Items are used in their defined order
        assert_eq!(result[0].item, "Job 1");
        assert_eq!(result[4].item, "Job 5");
    }

    #[test]
    fn same_seed_same_permutation() {
        let a = assign_random(&students(6), &items(6), &mut StdRng::seed_from_u64(42));
        let b = assign_random(&students(6), &items(6), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_roster_assigns_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(assign_random(&[], &items(3), &mut rng).is_empty());
    }
}
