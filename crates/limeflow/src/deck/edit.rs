use std::time::{SystemTime, UNIX_EPOCH};

use super::{Document, Slide, SlideType};

/// A single field-level change to one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideEdit {
    Title(String),
    /// An empty subtitle clears the field.
    Subtitle(String),
    Footer(String),
    Layout(SlideType),
    SetItem { index: usize, text: String },
    AddItem,
    RemoveItem(usize),
    ReplaceContent(Vec<String>),
}

impl SlideEdit {
    /// Apply to a copy of `slide`. Returns `None` when the edit changes nothing
    /// (e.g. an item index past the end).
    pub fn apply(&self, slide: &Slide) -> Option<Slide> {
        let mut next = slide.clone();
        match self {
            Self::Title(title) => next.title = title.clone(),
            Self::Subtitle(subtitle) => next.subtitle = non_empty(subtitle),
            Self::Footer(footer) => next.footer = non_empty(footer),
            Self::Layout(kind) => next.kind = *kind,
            Self::SetItem { index, text } => {
                *next.content.get_mut(*index)? = text.clone();
            }
            Self::AddItem => next.content.push(String::new()),
            Self::RemoveItem(index) => {
                if *index >= next.content.len() {
                    return None;
                }
                next.content.remove(*index);
            }
            Self::ReplaceContent(items) => next.content = items.clone(),
        }
        (next != *slide).then_some(next)
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Issues slide ids from the wall clock in milliseconds.
///
/// Ids are strictly increasing for the lifetime of the generator and start
/// above every numeric id already present in the deck, so an id is never
/// handed out twice even after its slide was deleted.
///
/// Once a deck has pushed the numeric range to `u64::MAX`, ids continue as
/// `"<u64::MAX>.<n>"`.
#[derive(Debug, Clone, Default)]
pub struct SlideIds {
    last: u64,
    overflow: u64,
}

impl SlideIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort above the ids in `document`.
    pub fn observe(&mut self, document: &Document) {
        for slide in document.slides() {
            if let Ok(id) = slide.id.parse::<u64>() {
                self.last = self.last.max(id);
            } else if let Some(n) = overflow_index(&slide.id) {
                self.overflow = self.overflow.max(n);
            }
        }
    }

    pub fn next_id(&mut self) -> String {
        let Some(bumped) = self.last.checked_add(1) else {
            self.overflow = self.overflow.saturating_add(1);
            return format!("{}.{}", u64::MAX, self.overflow);
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last = now.max(bumped);
        self.last.to_string()
    }
}

fn overflow_index(id: &str) -> Option<u64> {
    let (head, n) = id.split_once('.')?;
    if head.parse::<u64>().ok()? != u64::MAX {
        return None;
    }
    n.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::default_deck;

    fn slide() -> Slide {
        default_deck().slides()[0].clone()
    }

    #[test]
    fn test_title_edit() {
        let edited = SlideEdit::Title("Hello".into()).apply(&slide()).unwrap();
        assert_eq!(edited.title, "Hello");
        assert_eq!(edited.id, slide().id);
    }

    #[test]
    fn test_noop_edit_returns_none() {
        let s = slide();
        assert!(SlideEdit::Title(s.title.clone()).apply(&s).is_none());
        assert!(SlideEdit::RemoveItem(99).apply(&s).is_none());
        assert!(
            SlideEdit::SetItem {
                index: 99,
                text: "x".into()
            }
            .apply(&s)
            .is_none()
        );
    }

    #[test]
    fn test_empty_subtitle_clears() {
        let edited = SlideEdit::Subtitle(String::new()).apply(&slide()).unwrap();
        assert_eq!(edited.subtitle, None);
    }

    #[test]
    fn test_item_edits() {
        let s = slide();
        let added = SlideEdit::AddItem.apply(&s).unwrap();
        assert_eq!(added.content.len(), s.content.len() + 1);
        assert_eq!(added.content.last().unwrap(), "");

        let set = SlideEdit::SetItem {
            index: 0,
            text: "First".into(),
        }
        .apply(&s)
        .unwrap();
        assert_eq!(set.content[0], "First");

        let removed = SlideEdit::RemoveItem(0).apply(&s).unwrap();
        assert_eq!(removed.content, s.content[1..].to_vec());
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut ids = SlideIds::new();
        let a: u64 = ids.next_id().parse().unwrap();
        let b: u64 = ids.next_id().parse().unwrap();
        let c: u64 = ids.next_id().parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_ids_skip_past_existing() {
        let far_future = u64::MAX / 2;
        let mut s = slide();
        s.id = far_future.to_string();
        let doc = Document::new(vec![s]).unwrap();

        let mut ids = SlideIds::new();
        ids.observe(&doc);
        let next: u64 = ids.next_id().parse().unwrap();
        assert_eq!(next, far_future + 1);
    }

    #[test]
    fn test_ids_continue_past_numeric_range() {
        let mut top = slide();
        top.id = u64::MAX.to_string();
        let mut spilled = slide();
        spilled.id = format!("{}.3", u64::MAX);
        let doc = Document::new(vec![top, spilled]).unwrap();

        let mut ids = SlideIds::new();
        ids.observe(&doc);
        assert_eq!(ids.next_id(), format!("{}.4", u64::MAX));
        assert_eq!(ids.next_id(), format!("{}.5", u64::MAX));
    }
}
