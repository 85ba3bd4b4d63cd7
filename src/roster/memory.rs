use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::types::{ClassRoster, Group};
use super::{RosterError, RosterProvider};

/// Roster provider backed by a map, used by tests and demos
#[derive(Debug, Default)]
pub struct InMemoryRosterProvider {
    classes: RwLock<HashMap<String, (ClassRoster, Vec<Group>)>>,
}

impl InMemoryRosterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&self, roster: ClassRoster, groups: Vec<Group>) {
        if let Ok(mut classes) = self.classes.write() {
            classes.insert(roster.class_id.clone(), (roster, groups));
        }
    }
}

#[async_trait]
impl RosterProvider for InMemoryRosterProvider {
    async fn get_class_roster(&self, class_id: &str) -> Result<Option<ClassRoster>, RosterError> {
        let classes = self
            .classes
            .read()
            .map_err(|_| RosterError::Malformed("roster lock poisoned".to_string()))?;
        Ok(classes.get(class_id).map(|(roster, _)| roster.clone()))
    }

    async fn get_groups_with_students(&self, class_id: &str) -> Result<Vec<Group>, RosterError> {
        let classes = self
            .classes
            .read()
            .map_err(|_| RosterError::Malformed("roster lock poisoned".to_string()))?;
        Ok(classes
            .get(class_id)
            .map(|(_, groups)| groups.clone())
            .unwrap_or_default())
    }
}
