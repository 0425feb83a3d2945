use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authored shape of the `visibility` frontmatter field.
///
/// A note either names a single sharing group or lists several. The shape is
/// preserved as written so re-serialized metadata matches what the user typed;
/// matching itself is order-preserving but shape-agnostic (see `sharing`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Visibility {
    One(String),
    Many(Vec<String>),
}

/// The two metadata fields the sync core understands.
///
/// Everything else in a note's frontmatter is carried opaquely in
/// `NoteRecord::frontmatter` and never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_emails: Option<HashMap<String, Vec<String>>>,
}

/// Canonical in-memory note.
///
/// Built fresh from raw document text on every parse; persisted rows remain
/// the source of truth between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Opaque identifier, unique per owner (not globally).
    pub id: String,
    /// Document text after the metadata block, leading whitespace trimmed.
    pub body: String,
    pub metadata: NoteMetadata,
    /// Raw metadata block exactly as authored, when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<String>,
    /// Display label, independent of `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Milliseconds since epoch; authoritative for conflict resolution.
    pub last_modified: i64,
    #[serde(default)]
    pub auto_update_timestamp: bool,
}

impl NoteRecord {
    /// Reassemble the document text for download: preserved frontmatter
    /// block plus body, or the bare body when the note had no metadata.
    pub fn to_markdown(&self) -> String {
        match &self.frontmatter {
            Some(block) => format!("---\n{}\n---\n{}", block, self.body),
            None => self.body.clone(),
        }
    }
}

/// One incoming note in a sync batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteInput {
    pub id: String,
    pub markdown: String,
    #[serde(default)]
    pub source_name: Option<String>,
    /// Client-supplied merge timestamp; stamped with the current time when
    /// missing.
    #[serde(default)]
    pub last_modified: Option<i64>,
}

/// A sharing group and the emails allowed to read notes tagged with it.
/// One record per (owner, term); replaced wholesale on every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityTerm {
    pub term: String,
    pub emails: Vec<String>,
}

/// Full sync call payload: the note batch plus, optionally, the owner's new
/// term set. `None` leaves stored terms untouched; an empty list clears them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub notes: Vec<NoteInput>,
    #[serde(default)]
    pub visibility_terms: Option<Vec<VisibilityTerm>>,
}

/// Stored note row as the document store returns it for one owner.
#[derive(Debug, Clone)]
pub struct NoteRow {
    pub id: String,
    pub markdown: String,
    pub source_name: Option<String>,
    pub last_modified: i64,
}

/// Cross-owner row from the discovery pre-filter scan.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub owner: String,
    pub id: String,
    pub markdown: String,
    pub source_name: Option<String>,
    pub last_modified: i64,
}
