// Content normalization: stored résumé value -> canonical sections.

pub mod model;
pub mod normalize;
pub mod sections;

pub use model::StructuredContent;
pub use normalize::normalize_content;
pub use sections::{expand_sections, Paragraph};
