//! Live preview and drag reordering over an editor session.
//!
//! A [`Preview`] borrows the session's sections and keys; it never holds a
//! copy, so it can't drift from what the editor will save. Dragging is
//! tracked in a separate [`DragState`] value. Dropping yields a [`Reorder`]
//! for the editor to apply:
//!
//! ```text
//! let mut drag = Preview::new(&editor).start_drag(2)?;
//! drag.drag_over(0);
//! let reorder = drag.drop();          // Some(Reorder { from: 2, to: 0 })
//! editor.reorder(reorder)?;
//! ```
//!
//! While a drag is in progress [`Preview::render`] shows the tentative order
//! without touching the session.

use crate::editor::{EditorSession, Reorder};
use crate::render::render_section;
use crate::section::Section;
use maud::{Markup, html};

/// Read-only view of an editor's sections.
#[derive(Debug, Clone, Copy)]
pub struct Preview<'a> {
    sections: &'a [Section],
    keys: &'a [u64],
}

/// An in-progress drag: the entry picked up and where it would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    from: usize,
    over: usize,
    len: usize,
}

impl DragState {
    pub fn from(&self) -> usize {
        self.from
    }

    pub fn over(&self) -> usize {
        self.over
    }

    /// Move the drop target. Targets past the end clamp to the last entry.
    pub fn drag_over(&mut self, index: usize) {
        self.over = index.min(self.len.saturating_sub(1));
    }

    /// Finish the drag. `None` when the entry was dropped where it started.
    pub fn drop(self) -> Option<Reorder> {
        (self.from != self.over).then_some(Reorder {
            from: self.from,
            to: self.over,
        })
    }
}

impl<'a> Preview<'a> {
    pub fn new(editor: &'a EditorSession) -> Self {
        Self {
            sections: editor.sections(),
            keys: editor.section_keys(),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Entries with their stable keys, in current order.
    pub fn entries(self) -> impl Iterator<Item = (u64, &'a Section)> + 'a {
        self.keys.iter().copied().zip(self.sections)
    }

    /// Pick up the entry at `index`. `None` when out of range.
    pub fn start_drag(&self, index: usize) -> Option<DragState> {
        (index < self.sections.len()).then_some(DragState {
            from: index,
            over: index,
            len: self.sections.len(),
        })
    }

    /// Positions in display order while `drag` is in progress.
    pub fn tentative_order(&self, drag: &DragState) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.sections.len()).collect();
        if drag.from < order.len() && drag.over < order.len() {
            let moved = order.remove(drag.from);
            order.insert(drag.over, moved);
        }
        order
    }

    /// Render every entry, in tentative order when a drag is in progress.
    ///
    /// Sections without a renderer get a placeholder so they can still be
    /// picked up and removed.
    pub fn render(&self, drag: Option<&DragState>) -> Markup {
        let order = match drag {
            Some(drag) => self.tentative_order(drag),
            None => (0..self.sections.len()).collect(),
        };
        html! {
            div.preview {
                @for index in order {
                    @let section = &self.sections[index];
                    @let dragging = drag.is_some_and(|d| d.from == index);
                    div.preview-entry.dragging[dragging]
                        data-key=(self.keys[index])
                        data-index=(index)
                        data-type=(section.tag()) {
                        @match render_section(section) {
                            Some(markup) => {
                                (markup)
                            }
                            None => {
                                div.unsupported-section {
                                    (section.summary())
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionType;
    use crate::test_helpers::*;
    use serde_json::json;

    fn three_section_editor() -> EditorSession {
        let mut editor = EditorSession::new();
        editor.add_section(SectionType::Hero).unwrap();
        editor.add_section(SectionType::List).unwrap();
        editor.add_section(SectionType::Text).unwrap();
        editor
    }

    #[test]
    fn preview_reflects_editor_sections() {
        let editor = three_section_editor();
        let preview = Preview::new(&editor);
        assert_eq!(preview.len(), 3);
        let tags: Vec<&str> = preview.entries().map(|(_, s)| s.tag()).collect();
        assert_eq!(tags, vec!["hero", "list", "text"]);
        let keys: Vec<u64> = preview.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, editor.section_keys());
    }

    #[test]
    fn drag_and_drop_reorders_editor() {
        let mut editor = three_section_editor();
        let reorder = {
            let preview = Preview::new(&editor);
            let mut drag = preview.start_drag(2).unwrap();
            drag.drag_over(0);
            assert_eq!(preview.tentative_order(&drag), vec![2, 0, 1]);
            drag.drop().unwrap()
        };
        editor.reorder(reorder).unwrap();
        let tags: Vec<&str> = editor.sections().iter().map(|s| s.tag()).collect();
        assert_eq!(tags, vec!["text", "hero", "list"]);
    }

    #[test]
    fn drop_in_place_is_none() {
        let editor = three_section_editor();
        let drag = Preview::new(&editor).start_drag(1).unwrap();
        assert_eq!(drag.drop(), None);
    }

    #[test]
    fn start_drag_out_of_range() {
        let editor = three_section_editor();
        assert!(Preview::new(&editor).start_drag(3).is_none());
        assert!(Preview::new(&EditorSession::new()).start_drag(0).is_none());
    }

    #[test]
    fn drag_over_clamps_to_last() {
        let editor = three_section_editor();
        let mut drag = Preview::new(&editor).start_drag(0).unwrap();
        drag.drag_over(10);
        assert_eq!(drag.over(), 2);
        assert_eq!(drag.drop(), Some(Reorder { from: 0, to: 2 }));
    }

    #[test]
    fn render_uses_tentative_order() {
        let mut editor = EditorSession::new();
        editor.add_section(SectionType::Text).unwrap();
        editor.edit_text(0, crate::section::TextData {
            title: "First".into(),
            content: String::new(),
        })
        .unwrap();
        editor.add_section(SectionType::Text).unwrap();
        editor.edit_text(1, crate::section::TextData {
            title: "Second".into(),
            content: String::new(),
        })
        .unwrap();

        let preview = Preview::new(&editor);
        let mut drag = preview.start_drag(0).unwrap();
        drag.drag_over(1);
        let html = preview.render(Some(&drag)).into_string();
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(second < first);
        assert!(html.contains("dragging"));

        // The session itself is untouched.
        assert_eq!(editor.sections()[0].tag(), "text");
        let plain = preview.render(None).into_string();
        assert!(plain.find("First").unwrap() < plain.find("Second").unwrap());
    }

    #[test]
    fn unsupported_section_gets_placeholder() {
        let mut doc = sample_document();
        doc.sections
            .push(Section::from_parts("carousel", json!({"slides": 2})));
        let editor = EditorSession::open(doc);
        let html = Preview::new(&editor).render(None).into_string();
        assert!(html.contains("unsupported-section"));
        assert!(html.contains("unsupported section `carousel`"));
        assert!(html.contains(r#"data-type="carousel""#));
    }
}
