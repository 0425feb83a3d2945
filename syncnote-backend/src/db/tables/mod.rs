pub mod notes;
pub mod visibility_terms;
