pub mod edit;

use serde::{Deserialize, Serialize};

pub use edit::{SlideEdit, SlideIds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlideType {
    Title,
    ContentList,
    TwoColumn,
    GridFour,
    Quote,
}

impl SlideType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::ContentList => "Content list",
            Self::TwoColumn => "Two columns",
            Self::GridFour => "Four-way grid",
            Self::Quote => "Quote",
        }
    }

    pub fn all() -> &'static [SlideType] {
        &[
            SlideType::Title,
            SlideType::ContentList,
            SlideType::TwoColumn,
            SlideType::GridFour,
            SlideType::Quote,
        ]
    }
}

impl std::fmt::Display for SlideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SlideType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Rendered top-to-bottom, or in grid-index order for `GridFour`.
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Slide {
    /// A freshly inserted slide, before the user has typed anything.
    pub fn placeholder(id: String, kind: SlideType) -> Self {
        Self {
            id,
            kind,
            title: "New title".to_string(),
            subtitle: None,
            content: vec!["Enter content".to_string()],
            footer: None,
        }
    }
}

/// Error returned when a slide list would leave the deck empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a document must contain at least one slide")]
pub struct EmptyDocument;

/// An ordered, never-empty list of slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Slide>", into = "Vec<Slide>")]
pub struct Document {
    slides: Vec<Slide>,
}

impl TryFrom<Vec<Slide>> for Document {
    type Error = EmptyDocument;

    fn try_from(slides: Vec<Slide>) -> Result<Self, Self::Error> {
        Self::new(slides).ok_or(EmptyDocument)
    }
}

impl From<Document> for Vec<Slide> {
    fn from(document: Document) -> Self {
        document.slides
    }
}

impl Default for Document {
    fn default() -> Self {
        default_deck()
    }
}

impl Document {
    pub fn new(slides: Vec<Slide>) -> Option<Self> {
        if slides.is_empty() {
            None
        } else {
            Some(Self { slides })
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false; kept so `len` has its usual companion.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Clamp a slide index into range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.slides.len() - 1)
    }

    pub(crate) fn insert_after(&mut self, index: usize, slide: Slide) -> usize {
        let at = (index + 1).min(self.slides.len());
        self.slides.insert(at, slide);
        at
    }

    /// Returns false when removal would empty the deck or the index is out of range.
    pub(crate) fn remove(&mut self, index: usize) -> bool {
        if self.slides.len() <= 1 || index >= self.slides.len() {
            return false;
        }
        self.slides.remove(index);
        true
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.slides.len() || b >= self.slides.len() || a == b {
            return false;
        }
        self.slides.swap(a, b);
        true
    }

    pub(crate) fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }
}

/// The deck shown before anything has been saved or loaded.
pub fn default_deck() -> Document {
    let slides = vec![
        Slide {
            id: "1".to_string(),
            kind: SlideType::Title,
            title: "Team introduction and project name".to_string(),
            subtitle: Some("LimeFlow: synergy through collaboration".to_string()),
            content: vec![
                "Team roles".to_string(),
                "Project identity".to_string(),
                "Our vision".to_string(),
            ],
            footer: None,
        },
        Slide {
            id: "2".to_string(),
            kind: SlideType::GridFour,
            title: "Goals and shared work".to_string(),
            subtitle: Some("The core goals we want to reach together".to_string()),
            content: vec![
                "Clear goals: set the direction of the project".to_string(),
                "Live collaboration: share ideas immediately".to_string(),
                "Shared growth: learn from each other".to_string(),
                "Results: polished output through teamwork".to_string(),
            ],
            footer: None,
        },
        Slide {
            id: "3".to_string(),
            kind: SlideType::Quote,
            title: "The value of collaboration".to_string(),
            subtitle: Some("Teamwork makes the dream work".to_string()),
            content: vec!["Beyond individual limits, toward collective intelligence.".to_string()],
            footer: None,
        },
        Slide {
            id: "4".to_string(),
            kind: SlideType::TwoColumn,
            title: "Execution plan".to_string(),
            subtitle: Some("Phases and detailed strategy".to_string()),
            content: vec![
                "Phase 1: choose a topic and research".to_string(),
                "Phase 2: plan the slide structure and split roles".to_string(),
                "Phase 3: edit together and refine the design".to_string(),
                "Phase 4: final rehearsal and feedback".to_string(),
            ],
            footer: None,
        },
    ];
    Document { slides }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deck_has_four_slides() {
        let deck = default_deck();
        assert_eq!(deck.len(), 4);
        assert_eq!(deck.slides()[0].kind, SlideType::Title);
        assert_eq!(deck.slides()[3].kind, SlideType::TwoColumn);
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(default_deck()).unwrap();
        let first = &json[0];
        assert_eq!(first["id"], "1");
        assert_eq!(first["type"], "TITLE");
        assert!(first.get("footer").is_none());
        assert_eq!(json[1]["type"], "GRID_FOUR");
    }

    #[test]
    fn test_parse_slide_without_optional_fields() {
        let json = r#"[{"id":"9","type":"QUOTE","title":"Q","content":["a"]}]"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.slides()[0].subtitle, None);
        assert_eq!(doc.slides()[0].content, vec!["a"]);
    }

    #[test]
    fn test_empty_array_is_not_a_document() {
        let result: Result<Document, _> = serde_json::from_str("[]");
        assert!(result.is_err());
        assert!(Document::new(Vec::new()).is_none());
    }

    #[test]
    fn test_remove_keeps_last_slide() {
        let mut doc = default_deck();
        assert!(doc.remove(0));
        assert!(doc.remove(0));
        assert!(doc.remove(0));
        assert!(!doc.remove(0));
        assert_eq!(doc.len(), 1);
        assert!(!doc.remove(5));
    }

    #[test]
    fn test_insert_after_and_swap() {
        let mut doc = default_deck();
        let at = doc.insert_after(1, Slide::placeholder("x".into(), SlideType::Quote));
        assert_eq!(at, 2);
        assert_eq!(doc.slides()[2].id, "x");
        assert!(doc.swap(2, 3));
        assert_eq!(doc.slides()[3].id, "x");
        assert!(!doc.swap(3, 4 + 1));
    }
}
