//! Section expansion: walks `StructuredContent` in the fixed print order and emits
//! unwrapped paragraphs per section. Width-dependent wrapping happens in the layout engine.

use serde::{Deserialize, Serialize};

use crate::content::model::StructuredContent;

/// Print order of résumé sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Personal,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
    /// Legacy plain text. Rendered without a section header.
    FreeText,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 9] = [
        SectionKind::Personal,
        SectionKind::Summary,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Skills,
        SectionKind::Projects,
        SectionKind::Certifications,
        SectionKind::Languages,
        SectionKind::FreeText,
    ];

    /// Header label, `None` for the unlabeled free-text section.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            SectionKind::Personal => Some("Personal Information"),
            SectionKind::Summary => Some("Summary"),
            SectionKind::Experience => Some("Experience"),
            SectionKind::Education => Some("Education"),
            SectionKind::Skills => Some("Skills"),
            SectionKind::Projects => Some("Projects"),
            SectionKind::Certifications => Some("Certifications"),
            SectionKind::Languages => Some("Languages"),
            SectionKind::FreeText => None,
        }
    }
}

/// One paragraph of body text. `Heading` paragraphs print bold (entry titles);
/// `Detail` paragraphs are indented and wrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum Paragraph {
    Heading(String),
    Plain(String),
    Detail(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub paragraphs: Vec<Paragraph>,
}

/// Expands content into non-empty sections in print order.
pub fn expand_sections(content: &StructuredContent) -> Vec<Section> {
    SectionKind::ORDER
        .iter()
        .map(|&kind| Section {
            kind,
            paragraphs: paragraphs_for(kind, content),
        })
        .filter(|s| !s.paragraphs.is_empty())
        .collect()
}

fn paragraphs_for(kind: SectionKind, c: &StructuredContent) -> Vec<Paragraph> {
    let mut out = Vec::new();
    match kind {
        SectionKind::Personal => {
            let p = &c.personal;
            push_labeled(&mut out, "Name", &p.full_name);
            push_labeled(&mut out, "Email", &p.email);
            push_labeled(&mut out, "Phone", &p.phone);
            push_labeled(&mut out, "Location", &p.location);
        }
        SectionKind::Summary => {
            for para in c.summary.split("\n\n").map(str::trim).filter(|s| !s.is_empty()) {
                out.push(Paragraph::Plain(para.to_string()));
            }
        }
        SectionKind::Experience => {
            for e in &c.experience {
                let mut heading = join_nonempty(&[&e.position, &e.company], " at ");
                if !e.duration.is_empty() {
                    heading = join_nonempty(&[&heading, &format!("({})", e.duration)], " ");
                }
                if !heading.is_empty() {
                    out.push(Paragraph::Heading(heading));
                }
                push_detail(&mut out, &e.description);
            }
        }
        SectionKind::Education => {
            for e in &c.education {
                let degree = join_nonempty(&[&e.degree, &e.field], " in ");
                let mut line = join_nonempty(&[&degree, &e.institution], ", ");
                if !e.year.is_empty() {
                    line = join_nonempty(&[&line, &format!("({})", e.year)], " ");
                }
                out.push(Paragraph::Plain(line));
            }
        }
        SectionKind::Skills => {
            for s in &c.skills {
                out.push(Paragraph::Plain(with_level(&s.skill, &s.proficiency_level)));
            }
        }
        SectionKind::Projects => {
            for p in &c.projects {
                if !p.title.is_empty() {
                    out.push(Paragraph::Heading(p.title.clone()));
                }
                push_detail(&mut out, &p.description);
                if !p.link.is_empty() {
                    out.push(Paragraph::Detail(format!("Link: {}", p.link)));
                }
            }
        }
        SectionKind::Certifications => {
            for cert in &c.certifications {
                let mut line = join_nonempty(&[&cert.name, &cert.issuer], ", ");
                if !cert.date.is_empty() {
                    line = join_nonempty(&[&line, &format!("({})", cert.date)], " ");
                }
                out.push(Paragraph::Plain(line));
            }
        }
        SectionKind::Languages => {
            for l in &c.languages {
                out.push(Paragraph::Plain(with_level(&l.language, &l.proficiency_level)));
            }
        }
        SectionKind::FreeText => {
            for line in &c.free_text {
                out.push(Paragraph::Plain(line.clone()));
            }
        }
    }
    out.retain(|p| match p {
        Paragraph::Heading(s) | Paragraph::Plain(s) | Paragraph::Detail(s) => !s.trim().is_empty(),
    });
    out
}

fn push_labeled(out: &mut Vec<Paragraph>, label: &str, value: &str) {
    if !value.is_empty() {
        out.push(Paragraph::Plain(format!("{label}: {value}")));
    }
}

/// Descriptions keep author line breaks; each non-empty line becomes its own paragraph.
fn push_detail(out: &mut Vec<Paragraph>, text: &str) {
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        out.push(Paragraph::Detail(line.to_string()));
    }
}

fn with_level(name: &str, level: &str) -> String {
    if level.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({level})")
    }
}

fn join_nonempty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{ExperienceEntry, SkillEntry};

    #[test]
    fn test_empty_content_has_no_sections() {
        assert!(expand_sections(&StructuredContent::default()).is_empty());
    }

    #[test]
    fn test_sections_follow_fixed_order() {
        let content = StructuredContent {
            summary: "Hello".to_string(),
            skills: vec![SkillEntry {
                skill: "Rust".to_string(),
                proficiency_level: "Expert".to_string(),
            }],
            experience: vec![ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let kinds: Vec<_> = expand_sections(&content).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Summary, SectionKind::Experience, SectionKind::Skills]
        );
    }

    #[test]
    fn test_experience_heading_and_detail() {
        let content = StructuredContent {
            experience: vec![ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                duration: "2020-2022".to_string(),
                description: "Built things.\nShipped more.".to_string(),
            }],
            ..Default::default()
        };
        let sections = expand_sections(&content);
        assert_eq!(
            sections[0].paragraphs,
            vec![
                Paragraph::Heading("Engineer at Acme (2020-2022)".to_string()),
                Paragraph::Detail("Built things.".to_string()),
                Paragraph::Detail("Shipped more.".to_string()),
            ]
        );
    }

    #[test]
    fn test_free_text_section_is_unlabeled() {
        let content = StructuredContent {
            free_text: vec!["Line one".to_string(), "Line two".to_string()],
            ..Default::default()
        };
        let sections = expand_sections(&content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind.label(), None);
        assert_eq!(sections[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_skill_without_level_prints_name_only() {
        assert_eq!(with_level("Go", ""), "Go");
        assert_eq!(with_level("Go", "Intermediate"), "Go (Intermediate)");
    }
}
