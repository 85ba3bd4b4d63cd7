use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parses the spellings found in roster exports ("M", "male", "girl", ...)
    pub fn parse(value: &str) -> Option<Sex> {
        match value.trim().to_lowercase().as_str() {
            "m" | "male" | "boy" => Some(Sex::Male),
            "f" | "female" | "girl" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub display_name: String,
    pub sex: Sex,
    pub number: u32,
}

impl Student {
    pub fn new(id: &str, display_name: &str, sex: Sex, number: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            sex,
            number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub students: Vec<Student>,
}

/// A class and its full student list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoster {
    pub class_id: String,
    pub class_name: String,
    pub students: Vec<Student>,
}
