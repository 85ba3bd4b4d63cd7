use async_trait::async_trait;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::{ClassRoster, Group, Sex, Student};
use super::{RosterError, RosterProvider};

/// A class roster parsed from one CSV export
#[derive(Debug, Clone)]
pub struct ParsedRoster {
    pub class_name: Option<String>,
    pub students: Vec<Student>,
    pub groups: Vec<Group>,
}

/// Reads rosters from `<dir>/<class_id>.csv`
///
/// Expected columns (matched loosely on header text): id, name, sex, number,
/// and optionally group and class.
#[derive(Debug, Clone)]
pub struct CsvRosterProvider {
    dir: PathBuf,
}

impl CsvRosterProvider {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// None for ids that could name a file outside the roster directory
    fn class_path(&self, class_id: &str) -> Option<PathBuf> {
        let valid = !class_id.is_empty()
            && class_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.dir.join(format!("{}.csv", class_id)))
    }

    async fn load(&self, class_id: &str) -> Result<Option<ParsedRoster>, RosterError> {
        let path = match self.class_path(class_id) {
            Some(path) => path,
            None => {
                tracing::warn!(class_id, "Rejected roster lookup for invalid class id");
                return Ok(None);
            }
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => parse_roster(&bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RosterProvider for CsvRosterProvider {
    async fn get_class_roster(&self, class_id: &str) -> Result<Option<ClassRoster>, RosterError> {
        Ok(self.load(class_id).await?.map(|parsed| ClassRoster {
            class_id: class_id.to_string(),
            class_name: parsed.class_name.unwrap_or_else(|| class_id.to_string()),
            students: parsed.students,
        }))
    }

    async fn get_groups_with_students(&self, class_id: &str) -> Result<Vec<Group>, RosterError> {
        Ok(self.load(class_id).await?.map(|parsed| parsed.groups).unwrap_or_default())
    }
}

/// Parses a roster CSV. Rows with a repeated student id replace the earlier row.
pub fn parse_roster(bytes: &[u8]) -> Result<ParsedRoster, RosterError> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let headers = reader.headers()?.clone();

    let find = |needle: &str| {
        headers
            .iter()
            .position(|h| h.to_lowercase().contains(needle))
    };
    let id_col = find("id").unwrap_or(0);
    let name_col = find("name").unwrap_or(1);
    let sex_col = find("sex").or_else(|| find("gender")).unwrap_or(2);
    let number_col = find("number").or_else(|| find("no")).unwrap_or(3);
    let group_col = find("group");
    let class_col = find("class");

    let mut students: Vec<Student> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut memberships: Vec<(String, String)> = Vec::new();
    let mut class_name = None;

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let id = record.get(id_col).unwrap_or("").to_string();
        let name = record.get(name_col).unwrap_or("").to_string();

        // Skip rows without the essentials
        if id.is_empty() || name.is_empty() {
            continue;
        }

        let sex = match Sex::parse(record.get(sex_col).unwrap_or("")) {
            Some(sex) => sex,
            None => {
                return Err(RosterError::Malformed(format!(
                    "row {}: unrecognised sex for student {}",
                    line + 2,
                    id
                )))
            }
        };
        let number = record
            .get(number_col)
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);

        if class_name.is_none() {
            if let Some(col) = class_col {
                class_name = record.get(col).filter(|c| !c.is_empty()).map(str::to_string);
            }
        }
        if let Some(col) = group_col {
            if let Some(group) = record.get(col).filter(|g| !g.is_empty()) {
                memberships.retain(|(_, student_id)| *student_id != id);
                memberships.push((group.to_string(), id.clone()));
            }
        }

        let student = Student {
            id: id.clone(),
            display_name: name,
            sex,
            number,
        };
        match index_by_id.get(&id) {
            Some(&idx) => students[idx] = student,
            None => {
                index_by_id.insert(id, students.len());
                students.push(student);
            }
        }
    }

    // Groups keep the order in which they first appear
    let mut groups: Vec<Group> = Vec::new();
    for (group_name, student_id) in memberships {
        let student = match index_by_id.get(&student_id) {
            Some(&idx) => students[idx].clone(),
            None => continue,
        };
        match groups.iter_mut().find(|g| g.id == group_name) {
            Some(group) => group.students.push(student),
            None => groups.push(Group {
                id: group_name.clone(),
                name: group_name,
                students: vec![student],
            }),
        }
    }

    Ok(ParsedRoster {
        class_name,
        students,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "student id,name,sex,number,group,class\n\
        s1,Ann,F,1,Red,7B\n\
        s2,Ben,M,2,Blue,7B\n\
        s3,Cat,female,3,Red,7B\n\
        s2,Benjamin,male,2,Red,7B\n";

    #[test]
    fn parses_students_and_merges_repeated_ids() {
        let parsed = parse_roster(ROSTER.as_bytes()).unwrap();
        assert_eq!(parsed.class_name.as_deref(), Some("7B"));
        assert_eq!(parsed.students.len(), 3);
        assert_eq!(parsed.students[1].display_name, "Benjamin");
        assert_eq!(parsed.students[2].sex, Sex::Female);
    }

    #[test]
    fn groups_follow_latest_row() {
        let parsed = parse_roster(ROSTER.as_bytes()).unwrap();
        assert_eq!(parsed.groups.len(), 1);
        let red = &parsed.groups[0];
        assert_eq!(red.name, "Red");
        let ids: Vec<&str> = red.students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3", "s2"]);
    }

    #[test]
    fn rejects_unknown_sex() {
        let csv = "id,name,sex,number\ns1,Ann,?,1\n";
        assert!(matches!(
            parse_roster(csv.as_bytes()),
            Err(RosterError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn missing_class_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvRosterProvider::new(dir.path());
        assert!(provider.get_class_roster("nope").await.unwrap().is_none());
        assert!(provider.get_groups_with_students("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn class_ids_cannot_leave_the_roster_dir() {
        let root = tempfile::tempdir().unwrap();
        let rosters = root.path().join("rosters");
        std::fs::create_dir(&rosters).unwrap();
        std::fs::write(root.path().join("secret.csv"), ROSTER).unwrap();
        std::fs::write(rosters.join("c-1_b.csv"), ROSTER).unwrap();

        let provider = CsvRosterProvider::new(&rosters);
        assert!(provider.get_class_roster("../secret").await.unwrap().is_none());
        assert!(provider.get_groups_with_students("../secret").await.unwrap().is_empty());
        assert!(provider.get_class_roster("").await.unwrap().is_none());
        assert!(provider.get_class_roster("c-1_b").await.unwrap().is_some());
    }
}
