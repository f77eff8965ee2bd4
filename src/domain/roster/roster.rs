//! Immutable roster snapshot.
//!
//! Built once at startup from the class -> {label -> username} import feed
//! and shared read-only (`Arc<Roster>`) with every component that needs to
//! know which classes exist and who is enrolled in them.

use std::collections::{BTreeMap, HashMap};

use crate::domain::foundation::{ClassName, Username};

use super::RosterError;

/// A student enrolled in exactly one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    label: String,
    username: Username,
    class: ClassName,
}

impl Student {
    /// Display label from the roster (usually the student's name).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }
}

/// One class and its students, ordered by display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRoster {
    name: ClassName,
    students: Vec<Student>,
}

impl ClassRoster {
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Finds an enrolled student by username.
    pub fn student(&self, username: &Username) -> Option<&Student> {
        self.students.iter().find(|s| &s.username == username)
    }
}

/// The whole roster, keyed and ordered by class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    classes: BTreeMap<ClassName, ClassRoster>,
}

impl Roster {
    /// Parses a roster from its JSON form: `{"10A": {"Alice": "alice_u"}}`.
    pub fn from_json(raw: &str) -> Result<Self, RosterError> {
        let parsed: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(raw)?;
        Self::from_map(parsed)
    }

    /// Builds a roster from raw class -> {label -> username} entries.
    ///
    /// # Errors
    ///
    /// - `Invalid` for blank class names or malformed usernames
    /// - `DuplicateEnrollment` if a username appears more than once
    /// - `Empty` if there are no classes at all
    pub fn from_map(
        entries: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self, RosterError> {
        if entries.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut classes = BTreeMap::new();
        let mut enrolled_in: HashMap<Username, ClassName> = HashMap::new();

        for (raw_class, students) in entries {
            let class = ClassName::new(&raw_class)?;
            let mut class_students = Vec::with_capacity(students.len());

            for (label, raw_username) in students {
                let username = Username::new(&raw_username)?;
                if let Some(first) = enrolled_in.get(&username) {
                    return Err(RosterError::DuplicateEnrollment {
                        username,
                        first: first.clone(),
                        second: class,
                    });
                }
                enrolled_in.insert(username.clone(), class.clone());
                class_students.push(Student {
                    label: label.trim().to_string(),
                    username,
                    class: class.clone(),
                });
            }

            classes.insert(
                class.clone(),
                ClassRoster {
                    name: class,
                    students: class_students,
                },
            );
        }

        Ok(Self { classes })
    }

    pub fn class(&self, name: &ClassName) -> Option<&ClassRoster> {
        self.classes.get(name)
    }

    pub fn contains_class(&self, name: &ClassName) -> bool {
        self.classes.contains_key(name)
    }

    /// Class names in display order.
    pub fn class_names(&self) -> impl Iterator<Item = &ClassName> {
        self.classes.keys()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassRoster> {
        self.classes.values()
    }

    /// Every enrolled student across all classes.
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.classes.values().flat_map(|c| c.students.iter())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn student_count(&self) -> usize {
        self.classes.values().map(ClassRoster::len).sum()
    }
}
