//! Syllabus catalogs
//!
//! A catalog is a TOML document describing cycles, subjects, modules and
//! subtopic titles. Parsing it produces a fresh [`CycleData`] tree with new
//! UUIDs for every module and subtopic, ready for
//! [`Database::seed_syllabus`](crate::Database::seed_syllabus).
//!
//! ```toml
//! [[cycles]]
//! id = "physics"
//! subjects = ["maths-1", "physics"]
//!
//! [[cycles]]
//! id = "chemistry"
//! subjects = [{ subject = "maths-1", id = "maths-1-chem" }]
//!
//! [[subjects]]
//! id = "maths-1"
//! course_code = "25MAT11"
//! name = "Applied Mathematics I"
//! credits = 4
//!
//! [[subjects.modules]]
//! number = 1
//! title = "Elements of Linear Algebra"
//! subtopics = ["Rank of a Matrix", "Gauss-Jordan Method"]
//! ```

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Cycle, CycleData, Module, Subject, Subtopic};

/// The built-in first-year syllabus.
pub const DEFAULT_CATALOG: &str = include_str!("../data/default_syllabus.toml");

#[derive(Debug, Deserialize)]
struct Catalog {
    cycles: Vec<CatalogCycle>,
    #[serde(default)]
    subjects: Vec<CatalogSubject>,
}

#[derive(Debug, Deserialize)]
struct CatalogCycle {
    id: Cycle,
    name: Option<String>,
    subjects: Vec<SubjectRef>,
}

/// A subject listed in a cycle, optionally under a different id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubjectRef {
    Id(String),
    Alias { subject: String, id: String },
}

impl SubjectRef {
    fn subject(&self) -> &str {
        match self {
            SubjectRef::Id(id) => id,
            SubjectRef::Alias { subject, .. } => subject,
        }
    }

    fn id(&self) -> &str {
        match self {
            SubjectRef::Id(id) => id,
            SubjectRef::Alias { id, .. } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogSubject {
    id: String,
    course_code: String,
    name: String,
    credits: u32,
    #[serde(default)]
    modules: Vec<CatalogModule>,
}

#[derive(Debug, Deserialize)]
struct CatalogModule {
    number: u32,
    title: String,
    description: Option<String>,
    #[serde(default)]
    subtopics: Vec<String>,
}

/// Parse the built-in syllabus.
pub fn default_syllabus() -> Result<Vec<CycleData>> {
    parse_catalog(DEFAULT_CATALOG)
}

/// Parse a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<CycleData>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Catalog(format!("failed to read catalog {:?}: {}", path, e)))?;
    parse_catalog(&content)
}

/// Parse catalog text into a syllabus tree with fresh ids.
pub fn parse_catalog(text: &str) -> Result<Vec<CycleData>> {
    let catalog: Catalog = toml::from_str(text)
        .map_err(|e| Error::Catalog(format!("failed to parse catalog: {}", e)))?;

    let mut definitions: HashMap<&str, &CatalogSubject> = HashMap::new();
    for subject in &catalog.subjects {
        validate_subject(subject)?;
        if definitions.insert(subject.id.as_str(), subject).is_some() {
            return Err(Error::Catalog(format!(
                "subject {} is defined twice",
                subject.id
            )));
        }
    }

    let mut seen_cycles = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut referenced = HashSet::new();
    let mut cycles = Vec::with_capacity(catalog.cycles.len());

    for cycle in &catalog.cycles {
        if !seen_cycles.insert(cycle.id) {
            return Err(Error::Catalog(format!("cycle {} is listed twice", cycle.id)));
        }

        let mut subjects = Vec::with_capacity(cycle.subjects.len());
        for entry in &cycle.subjects {
            let definition = definitions.get(entry.subject()).ok_or_else(|| {
                Error::Catalog(format!(
                    "cycle {} lists unknown subject {}",
                    cycle.id,
                    entry.subject()
                ))
            })?;
            if !seen_ids.insert(entry.id().to_string()) {
                return Err(Error::Catalog(format!(
                    "subject id {} appears more than once",
                    entry.id()
                )));
            }
            referenced.insert(entry.subject());
            subjects.push(build_subject(entry.id(), cycle.id, definition));
        }

        cycles.push(CycleData {
            id: cycle.id,
            name: cycle
                .name
                .clone()
                .unwrap_or_else(|| cycle.id.display_name().to_string()),
            subjects,
        });
    }

    for subject in &catalog.subjects {
        if !referenced.contains(subject.id.as_str()) {
            tracing::warn!(subject_id = %subject.id, "Catalog subject is not listed in any cycle");
        }
    }

    Ok(cycles)
}

fn validate_subject(subject: &CatalogSubject) -> Result<()> {
    let mut numbers = HashSet::new();
    for module in &subject.modules {
        if !numbers.insert(module.number) {
            return Err(Error::Catalog(format!(
                "subject {} has two modules numbered {}",
                subject.id, module.number
            )));
        }
    }
    Ok(())
}

fn build_subject(id: &str, cycle: Cycle, definition: &CatalogSubject) -> Subject {
    let mut modules: Vec<Module> = definition
        .modules
        .iter()
        .map(|m| Module {
            id: uuid::Uuid::new_v4().to_string(),
            number: m.number,
            title: m.title.clone(),
            description: m.description.clone(),
            subtopics: m
                .subtopics
                .iter()
                .map(|title| Subtopic {
                    id: uuid::Uuid::new_v4().to_string(),
                    title: title.clone(),
                    completed: false,
                })
                .collect(),
            attachments: Vec::new(),
        })
        .collect();
    modules.sort_by_key(|m| m.number);

    Subject {
        id: id.to_string(),
        course_code: definition.course_code.clone(),
        name: definition.name.clone(),
        cycle,
        credits: definition.credits,
        modules,
    }
}
