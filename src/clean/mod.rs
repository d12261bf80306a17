//! Row-level cleaning stages shared by both export kinds.

pub mod dedup;
pub mod roles;
pub mod sections;

pub use dedup::{deduplicate, Deduplicated, IdentityRule};
pub use roles::{PanelistMatcher, Role};
pub use sections::{split_sections, SectionBounds, Sections};
