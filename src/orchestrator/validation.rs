use crate::error::{AssignError, CapacityRule, CapacityShortfall, Result};
use crate::history::{AssignerKind, AssignerRecord};
use crate::roster::{Group, Student};

/// Students assigned together: the whole class or one selected group
#[derive(Debug, Clone)]
pub struct AssignmentUnit {
    pub label: String,
    pub students: Vec<Student>,
}

pub fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AssignError::Auth);
    }
    Ok(())
}

pub fn require_selection(class_id: &str, assigner_id: &str) -> Result<()> {
    if class_id.trim().is_empty() {
        return Err(AssignError::MissingSelection("a class"));
    }
    if assigner_id.trim().is_empty() {
        return Err(AssignError::MissingSelection("an assigner"));
    }
    Ok(())
}

pub fn require_kind(record: &AssignerRecord, expected: AssignerKind) -> Result<()> {
    if record.kind != expected {
        return Err(AssignError::KindMismatch {
            name: record.name.clone(),
            expected: expected.as_str(),
            actual: record.kind.as_str(),
        });
    }
    Ok(())
}

/// Picks the selected groups out of the class groups, in selection order
pub fn resolve_groups(available: &[Group], selected_ids: &[String]) -> Result<Vec<Group>> {
    let mut resolved = Vec::with_capacity(selected_ids.len());
    let mut missing = Vec::new();
    for id in selected_ids {
        match available.iter().find(|g| g.id == *id) {
            Some(group) => resolved.push(group.clone()),
            None => missing.push(id.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(AssignError::MissingGroupData(missing));
    }
    Ok(resolved)
}

/// The class as one unit, or one unit per selected group
pub fn build_units(class_label: &str, students: &[Student], groups: &[Group]) -> Vec<AssignmentUnit> {
    if groups.is_empty() {
        return vec![AssignmentUnit {
            label: class_label.to_string(),
            students: students.to_vec(),
        }];
    }
    groups
        .iter()
        .map(|g| AssignmentUnit {
            label: g.name.clone(),
            students: g.students.clone(),
        })
        .collect()
}

pub fn require_items(record: &AssignerRecord) -> Result<()> {
    if record.items.is_empty() {
        return Err(AssignError::NothingToAssign(format!(
            "the assigner \"{}\" has no items",
            record.name
        )));
    }
    Ok(())
}

pub fn require_students(units: &[AssignmentUnit]) -> Result<()> {
    let empty: Vec<&str> = units
        .iter()
        .filter(|u| u.students.is_empty())
        .map(|u| u.label.as_str())
        .collect();
    if !empty.is_empty() {
        return Err(AssignError::NothingToAssign(format!(
            "no students in {}",
            empty.join(", ")
        )));
    }
    Ok(())
}

/// Checks every unit against the item count; all failing groups are
/// reported together
pub fn check_capacity(
    assigner_name: &str,
    item_count: usize,
    rule: CapacityRule,
    units: &[AssignmentUnit],
    grouped: bool,
) -> Result<()> {
    let offenders: Vec<(String, usize)> = units
        .iter()
        .filter(|u| match rule {
            CapacityRule::ItemPerStudent => item_count < u.students.len(),
            CapacityRule::StudentPerItem => item_count > u.students.len(),
        })
        .map(|u| (u.label.clone(), u.students.len()))
        .collect();

    if offenders.is_empty() {
        return Ok(());
    }
    Err(AssignError::InsufficientCapacity(CapacityShortfall {
        assigner: assigner_name.to_string(),
        items: item_count,
        rule,
        offenders,
        grouped,
    }))
}

/// Members of all selected groups, first membership wins
pub fn union_of_groups(groups: &[Group]) -> Vec<Student> {
    let mut students: Vec<Student> = Vec::new();
    for student in groups.iter().flat_map(|g| g.students.iter()) {
        if !students.iter().any(|s| s.id == student.id) {
            students.push(student.clone());
        }
    }
    students
}
