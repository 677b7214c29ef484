//! Well-known processing modes. The backend accepts any mode string; these are
//! the ones it ships with.

/// Expand the ideas in a document or selected fragment into a child document.
pub const IDEA_EXPAND: &str = "idea_expand";

/// Research the topic of a document or fragment into a child document.
pub const RESEARCH: &str = "research";
