//! Block expansion
//!
//! Paragraphs deferred by the rewriter hold at least one marker from the closed block set:
//!
//! - list markers: the paragraph is replaced by one sibling paragraph per item, in order.
//!   Any other text in the paragraph stays in place with the marker removed and the items
//!   follow it; a paragraph that held only the marker is removed.
//! - the header marker: one paragraph, one run per line, lines separated by `w:br`.
//! - dynamic markers: the block prose is substituted with the usual first-run collapse.
//!
//! Scalar placeholders sharing the paragraph are substituted in the same pass. Expansion
//! only touches the paragraph it is given and the siblings it creates.

use super::dynamic;
use super::placeholder::{tokens, Placeholder, PlaceholderResolver};
use crate::config::{CatalogEntry, EmptyPolicy, HeaderBlockConfig, LabelsConfig};
use crate::dataset::{Dataset, Value};
use crate::docx::paragraph;
use crate::docx::styles::ResolvedStyles;
use crate::docx::xml::{NodeId, XmlTree};
use crate::error::Warnings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// No marker left to expand.
    Unchanged,
    /// Rewritten in place (header and dynamic blocks).
    InPlace,
    /// List items inserted; `kept` tells whether the owning paragraph survived.
    List { items: Vec<NodeId>, kept: bool },
}

pub struct BlockExpander<'r, 'a> {
    resolver: &'r PlaceholderResolver<'a>,
    styles: &'r ResolvedStyles,
}

impl<'r, 'a> BlockExpander<'r, 'a> {
    pub fn new(resolver: &'r PlaceholderResolver<'a>, styles: &'r ResolvedStyles) -> Self {
        Self { resolver, styles }
    }

    pub fn expand(&self, tree: &mut XmlTree, p: NodeId, warnings: &mut Warnings) -> Expansion {
        let text = paragraph::paragraph_text(tree, p);
        let placeholders: Vec<Placeholder> = tokens(&text)
            .iter()
            .map(|token| self.resolver.classify(&token.key))
            .collect();

        if placeholders
            .iter()
            .any(|placeholder| matches!(placeholder, Placeholder::ListMarker(_)))
        {
            return self.expand_list(tree, p, &text, warnings);
        }
        if !placeholders.iter().any(Placeholder::is_block_content) {
            return Expansion::Unchanged;
        }

        let mut has_header = false;
        let rendered = self.resolver.substitute_with(&text, warnings, |placeholder| {
            match self.resolver.catalog().lookup(placeholder.key())? {
                CatalogEntry::Header(header) => {
                    has_header = true;
                    Some(header_lines(header, self.resolver.dataset(), self.resolver.labels()).join("\n"))
                }
                CatalogEntry::Dynamic(block) => Some(dynamic::render(
                    block,
                    self.resolver.dataset(),
                    self.resolver.labels(),
                )),
                CatalogEntry::List(_) => None,
            }
        });

        if has_header {
            write_lines(tree, p, &rendered);
        } else {
            paragraph::collapse_into_first_run(tree, p, &rendered);
        }
        Expansion::InPlace
    }

    fn expand_list(
        &self,
        tree: &mut XmlTree,
        p: NodeId,
        text: &str,
        warnings: &mut Warnings,
    ) -> Expansion {
        let mut items = Vec::new();
        let mut remainder = String::with_capacity(text.len());
        let mut cursor = 0;
        for token in tokens(text) {
            if let Placeholder::ListMarker(key) = self.resolver.classify(&token.key) {
                remainder.push_str(&text[cursor..token.range.start]);
                cursor = token.range.end;
                items.extend(self.list_items(&key));
            }
        }
        remainder.push_str(&text[cursor..]);

        let properties = paragraph::first_run_properties(tree, p);
        let style = self.styles.list_item().map(str::to_string);
        let created: Vec<NodeId> = items
            .iter()
            .map(|item| paragraph::new_text_paragraph(tree, item, style.as_deref(), properties))
            .collect();

        let kept = !remainder.trim().is_empty();
        let mut anchor = p;
        for node in &created {
            tree.insert_after(anchor, *node);
            anchor = *node;
        }
        if kept {
            let rest = self.resolver.substitute(&remainder, warnings);
            paragraph::collapse_into_first_run(tree, p, rest.trim_end());
        } else {
            tree.detach(p);
        }
        Expansion::List {
            items: created,
            kept,
        }
    }

    /// Item texts of one list marker, with the marker's empty policy applied.
    fn list_items(&self, key: &str) -> Vec<String> {
        let items = sequence_items(self.resolver.dataset(), key);
        if !items.is_empty() {
            return items;
        }
        match self.resolver.catalog().lookup(key) {
            Some(CatalogEntry::List(list)) if list.empty == EmptyPolicy::Fallback => {
                vec![self.resolver.labels().not_provided.clone()]
            }
            _ => Vec::new(),
        }
    }
}

/// Non-blank entries of a list value. Records render their field values joined by ` - `.
fn sequence_items(dataset: &Dataset, key: &str) -> Vec<String> {
    match dataset.get(key) {
        Some(Value::List(items)) => items
            .iter()
            .filter(|item| !item.trim().is_empty())
            .cloned()
            .collect(),
        Some(Value::Records(records)) => records
            .iter()
            .map(|record| {
                record
                    .values()
                    .map(|value| value.to_string())
                    .filter(|value| !value.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" - ")
            })
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::Scalar(scalar)) => {
            let text = scalar.to_string();
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
        None => Vec::new(),
    }
}

/// `"{label}: {value}"` per configured line, N/A for missing values.
pub fn header_lines(header: &HeaderBlockConfig, dataset: &Dataset, labels: &LabelsConfig) -> Vec<String> {
    header
        .lines
        .iter()
        .map(|line| {
            let value = dataset
                .scalar(&line.key)
                .map(|scalar| scalar.render(&labels.yes, &labels.no))
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| labels.not_available.clone());
            format!("{}: {}", line.label, value)
        })
        .collect()
}

/// Replace the runs of `p` with one run per line, each inheriting the first run's
/// formatting and ending with a line break except the last.
fn write_lines(tree: &mut XmlTree, p: NodeId, text: &str) {
    let properties = paragraph::first_run_properties(tree, p);
    let old_runs = paragraph::runs(tree, p);
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for (index, line) in lines.iter().enumerate() {
        let run = paragraph::new_run(tree, line, properties);
        if index < last {
            let br = tree.create_element("w:br", &[]);
            tree.append_child(run, br);
        }
        tree.append_child(p, run);
    }
    for run in old_runs {
        tree.detach(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockCatalog, EngineConfig};
    use crate::dataset::Record;

    struct Fixture {
        config: EngineConfig,
        catalog: BlockCatalog,
        styles: ResolvedStyles,
    }

    impl Fixture {
        fn new() -> Self {
            let config = EngineConfig::default();
            let catalog = BlockCatalog::from_config(&config);
            let styles = ResolvedStyles {
                bullet: Some("ListBullet".to_string()),
                plain: Some("Normal".to_string()),
                heading: None,
            };
            Self {
                config,
                catalog,
                styles,
            }
        }

        fn expand(&self, tree: &mut XmlTree, p: NodeId, data: &Dataset) -> (Expansion, Warnings) {
            let resolver = PlaceholderResolver::new(data, &self.catalog, &self.config.labels);
            let mut warnings = Warnings::new();
            let outcome = BlockExpander::new(&resolver, &self.styles).expand(tree, p, &mut warnings);
            (outcome, warnings)
        }
    }

    fn body(paragraphs: &str) -> (XmlTree, NodeId) {
        let tree = XmlTree::parse(&format!("<w:body>{}</w:body>", paragraphs)).unwrap();
        let root = tree.root();
        (tree, root)
    }

    fn texts(tree: &XmlTree, body: NodeId) -> Vec<String> {
        tree.children_named(body, "w:p")
            .into_iter()
            .map(|p| paragraph::paragraph_text(tree, p))
            .collect()
    }

    #[test]
    fn test_header_block_is_one_paragraph_with_breaks() {
        let fixture = Fixture::new();
        let data = Dataset::new()
            .with("NUMERO_PROCESSO", "0001234-56.2023")
            .with("AUTOR", "John Doe")
            .with("REU", "Jane Roe");
        let (mut tree, body) = body(r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>[CABECALHO]</w:t></w:r></w:p>"#);
        let p = tree.children_named(body, "w:p")[0];
        let (outcome, _) = fixture.expand(&mut tree, p, &data);
        assert_eq!(outcome, Expansion::InPlace);
        assert_eq!(
            texts(&tree, body),
            vec!["Processo nº: 0001234-56.2023\nAutor: John Doe\nRéu: Jane Roe"]
        );
        let runs = paragraph::runs(&tree, p);
        assert_eq!(runs.len(), 3);
        for run in runs {
            assert!(tree.first_child_named(run, "w:rPr").is_some());
        }
    }

    #[test]
    fn test_header_missing_values_render_na() {
        let config = EngineConfig::default();
        let lines = header_lines(&config.header, &Dataset::new().with("AUTOR", "John Doe"), &config.labels);
        assert_eq!(lines, vec!["Processo nº: N/A", "Autor: John Doe", "Réu: N/A"]);
    }

    #[test]
    fn test_list_replaces_marker_only_paragraph() {
        let fixture = Fixture::new();
        let data = Dataset::new().with(
            "DILIGENCIAS",
            vec!["Vistoria".to_string(), "Fotos".to_string(), "Medição".to_string()],
        );
        let (mut tree, body) = body(
            r#"<w:p><w:r><w:t>Antes</w:t></w:r></w:p><w:p><w:r><w:t>{diligencias}</w:t></w:r></w:p><w:p><w:r><w:t>Depois</w:t></w:r></w:p>"#,
        );
        let p = tree.children_named(body, "w:p")[1];
        let (outcome, _) = fixture.expand(&mut tree, p, &data);
        assert!(matches!(outcome, Expansion::List { ref items, kept: false } if items.len() == 3));
        assert_eq!(
            texts(&tree, body),
            vec!["Antes", "Vistoria", "Fotos", "Medição", "Depois"]
        );
        let second = tree.children_named(body, "w:p")[1];
        assert_eq!(paragraph::paragraph_style(&tree, second).as_deref(), Some("ListBullet"));
    }

    #[test]
    fn test_list_keeps_surrounding_text() {
        let fixture = Fixture::new();
        let data = Dataset::new()
            .with("AUTOR", "John Doe")
            .with("PERITOS", vec!["Ana".to_string(), "Rui".to_string()]);
        let (mut tree, body) = body(r#"<w:p><w:r><w:t>Peritos de [AUTOR]: [PERITOS]</w:t></w:r></w:p>"#);
        let p = tree.children_named(body, "w:p")[0];
        let (outcome, _) = fixture.expand(&mut tree, p, &data);
        assert!(matches!(outcome, Expansion::List { kept: true, .. }));
        assert_eq!(texts(&tree, body), vec!["Peritos de John Doe:", "Ana", "Rui"]);
    }

    #[test]
    fn test_empty_list_policies() {
        let fixture = Fixture::new();
        let (mut tree, body) = body(
            r#"<w:p><w:r><w:t>[ASSISTENTES_TECNICOS]</w:t></w:r></w:p><w:p><w:r><w:t>[OBSERVACOES]</w:t></w:r></w:p>"#,
        );
        let paragraphs = tree.children_named(body, "w:p");
        fixture.expand(&mut tree, paragraphs[0], &Dataset::new());
        fixture.expand(&mut tree, paragraphs[1], &Dataset::new());
        assert_eq!(texts(&tree, body), vec!["Não informado."]);
    }

    #[test]
    fn test_dynamic_block_with_scalars_in_same_pass() {
        let fixture = Fixture::new();
        let data = Dataset::new().with("AUTOR", "John Doe").with(
            "DOCUMENTOS",
            vec![Record::new().with("NOME", "Contrato").with("REFERENCIA", "fls. 3")],
        );
        let (mut tree, body) = body(
            r#"<w:p><w:r><w:t>Documentos de [AUTOR]:</w:t><w:br/><w:t>&lt;&lt;DOCUMENTOS&gt;&gt;</w:t></w:r></w:p>"#,
        );
        let p = tree.children_named(body, "w:p")[0];
        let (outcome, warnings) = fixture.expand(&mut tree, p, &data);
        assert_eq!(outcome, Expansion::InPlace);
        assert!(warnings.is_empty());
        assert_eq!(
            texts(&tree, body),
            vec!["Documentos de John Doe:\n- Contrato (ref: fls. 3)"]
        );
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let fixture = Fixture::new();
        let data = Dataset::new().with("CONCLUSAO", "Procedente.");
        let (mut tree, body) = body(r#"<w:p><w:r><w:t>[CONCLUSAO]</w:t></w:r></w:p>"#);
        let p = tree.children_named(body, "w:p")[0];
        fixture.expand(&mut tree, p, &data);
        let once = tree.subtree_to_string(body);
        let (outcome, _) = fixture.expand(&mut tree, p, &data);
        assert_eq!(outcome, Expansion::Unchanged);
        assert_eq!(tree.subtree_to_string(body), once);
    }
}
