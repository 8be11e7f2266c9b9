//! Paragraphs and runs
//!
//! A paragraph (`w:p`) is an ordered list of runs (`w:r`, direct children only). The text of
//! a run is read from its content children:
//!
//! - `w:t` contributes its text,
//! - `w:tab` contributes `\t`,
//! - `w:br` (except page and column breaks) and `w:cr` contribute `\n`.
//!
//! Writing run text performs the inverse mapping, so the paragraph text always equals the
//! concatenation of its run texts. The run's `w:rPr` and any non-text child (drawings, page
//! breaks, field characters) are left where they are.

use super::xml::{NodeId, XmlTree};

pub const PARAGRAPH: &str = "w:p";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";
pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";

pub fn runs(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    tree.children_named(paragraph, RUN)
}

pub fn run_text(tree: &XmlTree, run: NodeId) -> String {
    let mut text = String::new();
    for child in tree.children(run) {
        match tree.name(*child) {
            Some("w:t") => text.push_str(&tree.text_content(*child)),
            Some("w:tab") => text.push('\t'),
            Some("w:cr") => text.push('\n'),
            Some("w:br") if is_line_break(tree, *child) => text.push('\n'),
            _ => {}
        }
    }
    text
}

pub fn paragraph_text(tree: &XmlTree, paragraph: NodeId) -> String {
    runs(tree, paragraph)
        .into_iter()
        .map(|run| run_text(tree, run))
        .collect()
}

fn is_line_break(tree: &XmlTree, br: NodeId) -> bool {
    matches!(tree.attr(br, "w:type"), None | Some("textWrapping"))
}

fn is_text_content(tree: &XmlTree, node: NodeId) -> bool {
    match tree.name(node) {
        Some("w:t") | Some("w:tab") | Some("w:cr") => true,
        Some("w:br") => is_line_break(tree, node),
        _ => false,
    }
}

/// Replace the text content of a run, keeping its formatting.
pub fn set_run_text(tree: &mut XmlTree, run: NodeId, text: &str) {
    let stale: Vec<NodeId> = tree
        .children(run)
        .iter()
        .copied()
        .filter(|child| is_text_content(tree, *child))
        .collect();
    for node in stale {
        tree.detach(node);
    }
    for node in text_nodes(tree, text) {
        tree.append_child(run, node);
    }
}

/// Build the `w:t` / `w:br` / `w:tab` sequence for a piece of text.
fn text_nodes(tree: &mut XmlTree, text: &str) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut buffer = String::new();
    for ch in text.chars() {
        match ch {
            '\n' | '\t' => {
                if !buffer.is_empty() {
                    nodes.push(text_element(tree, &buffer));
                    buffer.clear();
                }
                let name = if ch == '\n' { "w:br" } else { "w:tab" };
                nodes.push(tree.create_element(name, &[]));
            }
            '\r' => {}
            _ => buffer.push(ch),
        }
    }
    if !buffer.is_empty() {
        nodes.push(text_element(tree, &buffer));
    }
    nodes
}

fn text_element(tree: &mut XmlTree, text: &str) -> NodeId {
    let t = tree.create_element("w:t", &[("xml:space", "preserve")]);
    let content = tree.create_text(text);
    tree.append_child(t, content);
    t
}

/// Assign `text` to the first run and delete every following run.
///
/// A paragraph without runs gets a fresh one. Mixed formatting inside the paragraph is
/// lost: the first run's formatting wins.
pub fn collapse_into_first_run(tree: &mut XmlTree, paragraph: NodeId, text: &str) {
    let runs = runs(tree, paragraph);
    match runs.split_first() {
        None => {
            let run = new_run(tree, text, None);
            tree.append_child(paragraph, run);
        }
        Some((first, rest)) => {
            set_run_text(tree, *first, text);
            for run in rest {
                tree.detach(*run);
            }
        }
    }
}

/// `w:rPr` of the first run, if any.
pub fn first_run_properties(tree: &XmlTree, paragraph: NodeId) -> Option<NodeId> {
    runs(tree, paragraph)
        .first()
        .and_then(|run| tree.first_child_named(*run, RUN_PROPERTIES))
}

/// A new detached run; `properties` is copied, not moved.
pub fn new_run(tree: &mut XmlTree, text: &str, properties: Option<NodeId>) -> NodeId {
    let run = tree.create_element(RUN, &[]);
    if let Some(properties) = properties {
        let copy = tree.deep_clone(properties);
        tree.append_child(run, copy);
    }
    for node in text_nodes(tree, text) {
        tree.append_child(run, node);
    }
    run
}

/// A new detached bold run (used for section headings without a heading style).
pub fn new_bold_run(tree: &mut XmlTree, text: &str) -> NodeId {
    let run = new_run(tree, text, None);
    let properties = tree.create_element(RUN_PROPERTIES, &[]);
    let bold = tree.create_element("w:b", &[]);
    tree.append_child(properties, bold);
    tree.insert_child(run, 0, properties);
    run
}

/// A new detached paragraph, optionally carrying a paragraph style.
pub fn new_paragraph(tree: &mut XmlTree, style: Option<&str>) -> NodeId {
    let paragraph = tree.create_element(PARAGRAPH, &[]);
    if let Some(style) = style {
        let properties = tree.create_element(PARAGRAPH_PROPERTIES, &[]);
        let style_node = tree.create_element("w:pStyle", &[("w:val", style)]);
        tree.append_child(properties, style_node);
        tree.append_child(paragraph, properties);
    }
    paragraph
}

/// A new detached paragraph holding one run with `text`.
pub fn new_text_paragraph(
    tree: &mut XmlTree,
    text: &str,
    style: Option<&str>,
    properties: Option<NodeId>,
) -> NodeId {
    let paragraph = new_paragraph(tree, style);
    let run = new_run(tree, text, properties);
    tree.append_child(paragraph, run);
    paragraph
}

/// A new detached paragraph containing only a page break.
pub fn new_page_break(tree: &mut XmlTree) -> NodeId {
    let paragraph = new_paragraph(tree, None);
    let run = tree.create_element(RUN, &[]);
    let br = tree.create_element("w:br", &[("w:type", "page")]);
    tree.append_child(run, br);
    tree.append_child(paragraph, run);
    paragraph
}

pub fn paragraph_style(tree: &XmlTree, paragraph: NodeId) -> Option<String> {
    let properties = tree.first_child_named(paragraph, PARAGRAPH_PROPERTIES)?;
    let style = tree.first_child_named(properties, "w:pStyle")?;
    tree.attr(style, "w:val").map(str::to_string)
}
