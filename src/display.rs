use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::assign::AssignmentResult;

/// Formats a student with their class number
pub fn format_student_label(number: u32, name: &str) -> String {
    if number == 0 {
        name.to_string()
    } else {
        format!("[{}] {}", number, name)
    }
}

/// Renders a result as text: one header per group, one `item: student` line per assignment
pub fn render_result(assigner_name: &str, result: &AssignmentResult) -> String {
    let mut out = format!("** {} **\n", assigner_name);
    for (label, assignments) in result {
        out.push_str(&format!("\n{}\n", label));
        if assignments.is_empty() {
            out.push_str("  [EMPTY]\n");
        }
        for assigned in assignments {
            out.push_str(&format!(
                "  {}: {}\n",
                assigned.item,
                format_student_label(assigned.student_number, &assigned.student_name)
            ));
        }
    }
    out
}

/// Writes a result to a file in the same format as `print_result`
pub fn write_result_to_file<P: AsRef<Path>>(
    assigner_name: &str,
    result: &AssignmentResult,
    path: P,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(render_result(assigner_name, result).as_bytes())?;
    Ok(())
}

/// Prints a result in a readable format
pub fn print_result(assigner_name: &str, result: &AssignmentResult) {
    let total: usize = result.values().map(|a| a.len()).sum();
    println!("\n=== {} ===", assigner_name);
    println!("Total assignments: {}", total);
    print!("{}", render_result(assigner_name, result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::AssignedItem;
    use crate::roster::{Sex, Student};

    #[test]
    fn formats_labels() {
        assert_eq!(format_student_label(4, "Ann"), "[4] Ann");
        assert_eq!(format_student_label(0, "Ann"), "Ann");
    }

    #[test]
    fn renders_groups_in_order() {
        let mut result = AssignmentResult::new();
        let ann = Student::new("s1", "Ann", Sex::Female, 1);
        result.insert("Blue".to_string(), vec![AssignedItem::new("Sweep", &ann)]);
        result.insert("Red".to_string(), vec![]);

        let text = render_result("Jobs", &result);
        assert_eq!(text, "** Jobs **\n\nBlue\n  Sweep: [1] Ann\n\nRed\n  [EMPTY]\n");
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_result_to_file("Jobs", &AssignmentResult::new(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "** Jobs **\n");
    }
}
