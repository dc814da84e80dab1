//! Document revisions and semantic version bumps.
//!
//! An update is diffed against the stored document. The kind of change
//! decides which part of `major.minor.patch` moves:
//! - **major**: anything under `model`, `context` or `protocol.steps`
//! - **minor**: any added property, or any other `protocol` change
//! - **patch**: everything else (status, metadata)

use chrono::{DateTime, Utc};
use optiflow_core::{ConfigurationDocument, OptiflowError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Top-level fields the repository owns; never part of a diff.
const STAMPED_FIELDS: &[&str] = &["version", "lastModified"];

/// Size of a change, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Patch,
    Minor,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Add,
    Remove,
    Modify,
}

/// One property-level difference between two revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// Property path from the document root, e.g. `["protocol", "steps"]`.
    pub path: Vec<String>,

    pub operation: ChangeOperation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl Change {
    fn at(path: &[String], operation: ChangeOperation) -> Self {
        Self {
            path: path.to_vec(),
            operation,
            previous_value: None,
            new_value: None,
        }
    }

    /// The path as a JSON pointer.
    pub fn pointer(&self) -> String {
        self.path.iter().map(|p| format!("/{}", p)).collect()
    }

    /// How large a version bump this change alone calls for.
    pub fn change_type(&self) -> ChangeType {
        let head = self.path.first().map(String::as_str);
        let second = self.path.get(1).map(String::as_str);
        match (head, second) {
            (Some("model") | Some("context"), _) => ChangeType::Major,
            (Some("protocol"), Some("steps")) => ChangeType::Major,
            (Some("protocol"), _) => ChangeType::Minor,
            _ if self.operation == ChangeOperation::Add => ChangeType::Minor,
            _ => ChangeType::Patch,
        }
    }
}

/// One stored version of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: Uuid,

    /// Semantic version of `document`.
    pub version: String,

    pub timestamp: DateTime<Utc>,

    /// Differences from the previous revision; empty for the first one.
    pub changes: Vec<Change>,

    /// `None` for the first revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,

    pub document: ConfigurationDocument,
}

impl Revision {
    /// The first revision of a newly stored document.
    pub fn initial(document: ConfigurationDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: document.version.clone(),
            timestamp: Utc::now(),
            changes: Vec::new(),
            change_type: None,
            document,
        }
    }

    /// Derive the next revision from `self` and an edited document.
    ///
    /// Returns `Ok(None)` when nothing but repository-stamped fields
    /// changed. Otherwise the new document gets the bumped version and a
    /// fresh `lastModified`.
    pub fn next(&self, mut document: ConfigurationDocument) -> Result<Option<Self>> {
        let changes = diff_documents(&self.document, &document)?;
        let Some(change_type) = classify(&changes) else {
            return Ok(None);
        };

        let version = bump(&self.document.version, change_type)?;
        let timestamp = Utc::now();
        document.version = version.clone();
        document.last_modified = timestamp;

        Ok(Some(Self {
            id: Uuid::new_v4(),
            version,
            timestamp,
            changes,
            change_type: Some(change_type),
            document,
        }))
    }
}

/// Diff two documents, ignoring the repository-stamped fields.
pub fn diff_documents(
    old: &ConfigurationDocument,
    new: &ConfigurationDocument,
) -> Result<Vec<Change>> {
    let mut old = serde_json::to_value(old)?;
    let mut new = serde_json::to_value(new)?;
    for value in [&mut old, &mut new] {
        if let Value::Object(map) = value {
            for field in STAMPED_FIELDS {
                map.remove(*field);
            }
        }
    }
    Ok(diff(&old, &new))
}

/// Property-level diff of two JSON values.
///
/// Objects are compared key by key. Arrays and scalars are compared whole.
pub fn diff(old: &Value, new: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_into(&mut Vec::new(), old, new, &mut changes);
    changes
}

fn diff_into(path: &mut Vec<String>, old: &Value, new: &Value, changes: &mut Vec<Change>) {
    if old == new {
        return;
    }

    let (Value::Object(old_map), Value::Object(new_map)) = (old, new) else {
        changes.push(Change {
            previous_value: Some(old.clone()),
            new_value: Some(new.clone()),
            ..Change::at(path, ChangeOperation::Modify)
        });
        return;
    };

    for (key, previous) in old_map {
        if !new_map.contains_key(key) {
            path.push(key.clone());
            changes.push(Change {
                previous_value: Some(previous.clone()),
                ..Change::at(path, ChangeOperation::Remove)
            });
            path.pop();
        }
    }

    for (key, value) in new_map {
        path.push(key.clone());
        match old_map.get(key) {
            None => changes.push(Change {
                new_value: Some(value.clone()),
                ..Change::at(path, ChangeOperation::Add)
            }),
            Some(previous) => diff_into(path, previous, value, changes),
        }
        path.pop();
    }
}

/// The largest change type among `changes`, or `None` if there are none.
pub fn classify(changes: &[Change]) -> Option<ChangeType> {
    changes.iter().map(Change::change_type).max()
}

/// Split a `major.minor.patch` version string.
pub fn parse_version(version: &str) -> Result<(u64, u64, u64)> {
    let parts: Vec<u64> = version
        .split('.')
        .map(str::parse::<u64>)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid_version(version))?;

    match parts.as_slice() {
        &[major, minor, patch] => Ok((major, minor, patch)),
        _ => Err(invalid_version(version)),
    }
}

/// Bump a `major.minor.patch` version string.
pub fn bump(version: &str, change: ChangeType) -> Result<String> {
    let (major, minor, patch) = parse_version(version)?;

    Ok(match change {
        ChangeType::Major => format!("{}.0.0", major + 1),
        ChangeType::Minor => format!("{}.{}.0", major, minor + 1),
        ChangeType::Patch => format!("{}.{}.{}", major, minor, patch + 1),
    })
}

fn invalid_version(version: &str) -> OptiflowError {
    OptiflowError::InvalidDocument {
        session_id: None,
        message: format!("Invalid semantic version '{}'", version),
    }
}
