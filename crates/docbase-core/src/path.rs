//! Resource path resolution.
//!
//! A [`ResourcePath`] is a non-empty sequence of non-empty segments relative
//! to a database's documents root. Odd segment counts name collections, even
//! counts name documents. [`DatabasePath`] anchors relative paths to a
//! concrete `projects/{project}/databases/{database}` root.
//!
//! Resolution is pure and never fails loudly: malformed input yields `None`
//! so callers can propagate absence through chained navigation.

use std::fmt;

use crate::auto_id::auto_id;

/// Path separator.
pub const SEPARATOR: char = '/';

/// Database ID used when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Segment under a database that roots every document path.
pub const DOCUMENTS_SEGMENT: &str = "documents";

/// A `projects/{project}/databases/{database}` root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabasePath {
    project_id: String,
    database_id: String,
}

impl DatabasePath {
    /// Creates a database path.
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// The project ID.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The database ID.
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// `projects/{project}/databases/{database}`.
    pub fn path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.project_id, self.database_id
        )
    }

    /// `projects/{project}/databases/{database}/documents`.
    pub fn documents_path(&self) -> String {
        format!("{}/{DOCUMENTS_SEGMENT}", self.path())
    }

    /// Fully-qualified resource name of a relative path.
    pub fn resource_name(&self, path: &ResourcePath) -> String {
        format!("{}/{path}", self.documents_path())
    }

    /// Strips the documents root off a fully-qualified resource name.
    ///
    /// Returns `None` if `name` belongs to another database or is not a
    /// well-formed path below the documents root.
    pub fn relative(&self, name: &str) -> Option<ResourcePath> {
        let root = self.documents_path();
        let rest = name.strip_prefix(root.as_str())?.strip_prefix(SEPARATOR)?;
        ResourcePath::parse(rest)
    }
}

impl fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A validated path relative to the documents root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parses a `/`-separated path.
    ///
    /// Returns `None` for an empty string or any empty segment (leading,
    /// trailing or doubled separators).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_segments(raw.split(SEPARATOR))
    }

    /// Builds a path from individual segments.
    ///
    /// Returns `None` if there are no segments, or any segment is empty or
    /// contains the separator.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || !segments.iter().all(|s| is_valid_segment(s)) {
            return None;
        }
        Some(Self { segments })
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// True for an even segment count.
    pub fn is_document(&self) -> bool {
        self.segments.len() % 2 == 0
    }

    /// True for an odd segment count.
    pub fn is_collection(&self) -> bool {
        !self.is_document()
    }

    /// The final segment.
    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// This path with `id` appended, or `None` if `id` is not a valid segment.
    pub fn child(&self, id: &str) -> Option<Self> {
        if !is_valid_segment(id) {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Some(Self { segments })
    }

    /// This path with a freshly generated ID appended.
    pub fn auto_child(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(auto_id());
        Self { segments }
    }

    /// This path minus its final segment, or `None` for a single segment.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(SEPARATOR)
}
