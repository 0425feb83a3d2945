pub mod note;

pub use note::{
    CandidateRow, NoteInput, NoteMetadata, NoteRecord, NoteRow, SyncRequest, Visibility,
    VisibilityTerm,
};
