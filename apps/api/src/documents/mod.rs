pub mod handlers;
pub mod service;

pub use service::{GeneratedPdf, PdfSettings, ResumeService};
