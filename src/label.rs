use crate::geometry::{Point, Rect};
use crate::{LABEL_CHAR_WIDTH, LABEL_LINE_HEIGHT, LABEL_PADDING};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
struct EditSession {
    before: String,
    select_all: bool,
}

/// Text annotation attached to a node or an edge.
///
/// Positions are expressed relative to the owner: node labels are offsets from
/// the node position, edge labels are scene coordinates since edges have none.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    text: String,
    template: String,
    pos: Point,
    default_pos: Point,
    alignment: Alignment,
    movable: bool,
    editable: bool,
    edit: Option<EditSession>,
}

impl Label {
    pub fn new(template: &str, default_pos: Point, movable: bool, editable: bool) -> Self {
        Self {
            text: template.to_string(),
            template: template.to_string(),
            pos: default_pos,
            default_pos,
            alignment: Alignment::Center,
            movable,
            editable,
            edit: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Point) {
        self.pos = pos;
    }

    pub fn default_pos(&self) -> Point {
        self.default_pos
    }

    /// True once the label has been dragged away from its default position.
    pub fn is_moved(&self) -> bool {
        (self.pos - self.default_pos).manhattan_length() >= 1.0
    }

    /// Installs a new default position, following it unless the label was moved.
    pub fn relocate(&mut self, default_pos: Point) {
        let moved = self.is_moved();
        self.default_pos = default_pos;
        if !moved {
            self.pos = default_pos;
        }
    }

    /// Same as [`Label::relocate`] with the moved flag captured by the caller
    /// before the owner geometry changed.
    pub fn relocate_with(&mut self, default_pos: Point, moved: bool) {
        self.default_pos = default_pos;
        if !moved {
            self.pos = default_pos;
        }
    }

    pub fn size(&self) -> (f32, f32) {
        let lines = normalize_label_lines(&self.text);
        let (width, height) = measure_text_box(&lines);
        (width + LABEL_PADDING, height + LABEL_PADDING / 2.0)
    }

    /// Bounds around the label centre, translated by the owner origin.
    pub fn bounding_rect(&self, origin: Point) -> Rect {
        let (width, height) = self.size();
        Rect::from_center(origin + self.pos, width, height)
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn is_select_all(&self) -> bool {
        self.edit.as_ref().is_some_and(|edit| edit.select_all)
    }

    pub fn begin_edit(&mut self) -> bool {
        if !self.editable {
            return false;
        }
        self.edit = Some(EditSession {
            before: self.text.clone(),
            select_all: true,
        });
        true
    }

    pub fn insert_text(&mut self, input: &str) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        if edit.select_all {
            self.text.clear();
            edit.select_all = false;
        }
        self.text.push_str(input);
    }

    pub fn backspace(&mut self) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        if edit.select_all {
            self.text.clear();
            edit.select_all = false;
        } else {
            self.text.pop();
        }
    }

    /// Ends the edit session.
    ///
    /// Empty text falls back to the template. When the result differs from the
    /// text the session started with, the label is reverted and the pair
    /// `(before, after)` is returned so the change can be replayed as a command.
    pub fn finish_edit(&mut self) -> Option<(String, String)> {
        let edit = self.edit.take()?;
        if self.text.trim().is_empty() {
            self.text = self.template.clone();
        }
        if edit.before.is_empty() || edit.before == self.text {
            return None;
        }
        let after = std::mem::replace(&mut self.text, edit.before.clone());
        Some((edit.before, after))
    }

    pub fn cancel_edit(&mut self) {
        if let Some(edit) = self.edit.take() {
            self.text = edit.before;
        }
    }
}

pub(crate) fn normalize_label_lines(label: &str) -> Vec<String> {
    let mut normalized = label.to_string();
    for pattern in ["<br/>", "<br />", "<br>"] {
        normalized = normalized.replace(pattern, "\n");
    }

    normalized
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                " ".to_string()
            } else {
                line.to_string()
            }
        })
        .collect()
}

pub(crate) fn measure_text_box(lines: &[String]) -> (f32, f32) {
    let max_chars = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let width = LABEL_CHAR_WIDTH * max_chars as f32;
    let height = LABEL_LINE_HEIGHT * lines.len() as f32;

    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_default_position_until_moved() {
        let mut label = Label::new("concept", Point::new(0.0, 0.0), true, true);
        label.relocate(Point::new(0.0, -30.0));
        assert_eq!(label.pos(), Point::new(0.0, -30.0));
        assert!(!label.is_moved());

        label.set_pos(Point::new(40.0, -30.0));
        assert!(label.is_moved());
        label.relocate(Point::new(0.0, -50.0));
        assert_eq!(label.pos(), Point::new(40.0, -30.0));
    }

    #[test]
    fn edit_session_outcomes() {
        let cases = [
            ("Person", "Person", None),
            ("Person", "", Some(("Person", "concept"))),
            ("Person", "Agent", Some(("Person", "Agent"))),
            ("", "Agent", None),
        ];

        for (before, typed, expected) in cases {
            let mut label = Label::new("concept", Point::default(), true, true);
            label.set_text(before);
            assert!(label.begin_edit());
            label.backspace();
            label.insert_text(typed);
            let outcome = label.finish_edit();
            let expected =
                expected.map(|(before, after): (&str, &str)| (before.to_string(), after.to_string()));
            assert_eq!(outcome, expected, "editing {before:?} into {typed:?}");
            assert!(!label.is_editing());
        }
    }

    #[test]
    fn empty_commit_reverts_to_template() {
        let mut label = Label::new("concept", Point::default(), true, true);
        label.set_text("Person");
        label.begin_edit();
        label.backspace();
        assert_eq!(label.finish_edit(), Some(("Person".into(), "concept".into())));
        assert_eq!(label.text(), "Person");
    }

    #[test]
    fn cancel_restores_text_before_edit() {
        let mut label = Label::new("concept", Point::default(), true, true);
        label.set_text("Person");
        label.begin_edit();
        label.insert_text("Agent");
        label.cancel_edit();
        assert_eq!(label.text(), "Person");
        assert_eq!(label.finish_edit(), None);
    }

    #[test]
    fn non_editable_labels_refuse_sessions() {
        let mut label = Label::new("1", Point::default(), false, false);
        assert!(!label.begin_edit());
        label.insert_text("x");
        assert_eq!(label.text(), "1");
    }

    #[test]
    fn measures_multiline_text() {
        let lines = normalize_label_lines("has<br>Parent");
        assert_eq!(lines, vec!["has".to_string(), "Parent".to_string()]);
        let (width, height) = measure_text_box(&lines);
        assert!((width - 6.0 * LABEL_CHAR_WIDTH).abs() < 1e-4);
        assert_eq!(height, 2.0 * LABEL_LINE_HEIGHT);
    }
}
