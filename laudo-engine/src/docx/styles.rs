//! Style sheet lookups
//!
//! Only the question "does the template define this paragraph style?" matters here. A
//! candidate matches either a style id (`ListBullet`) or a display name (`List Bullet`),
//! case-insensitively, and resolves to the style id to put in `w:pStyle`.

use super::xml::XmlTree;
use crate::config::StyleCandidates;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    /// (style id, display name) for every paragraph style
    styles: Vec<(String, Option<String>)>,
}

impl StyleSheet {
    pub fn from_tree(tree: &XmlTree) -> Self {
        let mut styles = Vec::new();
        for style in tree.children_named(tree.root(), "w:style") {
            if !matches!(tree.attr(style, "w:type"), None | Some("paragraph")) {
                continue;
            }
            let Some(id) = tree.attr(style, "w:styleId") else {
                continue;
            };
            let name = tree
                .first_child_named(style, "w:name")
                .and_then(|name| tree.attr(name, "w:val"))
                .map(str::to_string);
            styles.push((id.to_string(), name));
        }
        Self { styles }
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Style id of the first candidate the template defines.
    pub fn resolve<S: AsRef<str>>(&self, candidates: &[S]) -> Option<&str> {
        candidates.iter().find_map(|candidate| {
            let candidate = candidate.as_ref();
            self.styles
                .iter()
                .find(|(id, name)| {
                    id.eq_ignore_ascii_case(candidate)
                        || name
                            .as_deref()
                            .is_some_and(|name| name.eq_ignore_ascii_case(candidate))
                })
                .map(|(id, _)| id.as_str())
        })
    }
}

/// Style ids picked once per document from the configured candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStyles {
    pub bullet: Option<String>,
    pub plain: Option<String>,
    pub heading: Option<String>,
}

impl ResolvedStyles {
    pub fn resolve(sheet: &StyleSheet, candidates: &StyleCandidates) -> Self {
        let pick = |names: &[String]| sheet.resolve(names).map(str::to_string);
        Self {
            bullet: pick(&candidates.bullet),
            plain: pick(&candidates.plain),
            heading: pick(&candidates.heading),
        }
    }

    /// Bullet style, else the plain style, else none.
    pub fn list_item(&self) -> Option<&str> {
        self.bullet.as_deref().or(self.plain.as_deref())
    }
}
