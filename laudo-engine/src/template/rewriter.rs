//! Paragraph rewriting
//!
//! The logical text of a paragraph is the concatenation of its runs, but a placeholder is
//! routinely split across several runs by the editor (`[NUM` + `ERO_PROCESSO]`). Rewriting
//! therefore works on the whole paragraph text and writes the result back into the first
//! run, deleting the others. Formatting differences between runs are lost by design of the
//! rule: the first run's formatting wins.
//!
//! Paragraphs holding a list or block marker are not touched here and are reported as
//! [RewriteOutcome::Deferred] so the block pass can pick them up.

use super::placeholder::PlaceholderResolver;
use crate::docx::paragraph;
use crate::docx::xml::{NodeId, XmlTree};
use crate::error::Warnings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Unchanged,
    Rewritten,
    Deferred,
}

pub struct ParagraphRewriter<'r, 'a> {
    resolver: &'r PlaceholderResolver<'a>,
}

impl<'r, 'a> ParagraphRewriter<'r, 'a> {
    pub fn new(resolver: &'r PlaceholderResolver<'a>) -> Self {
        Self { resolver }
    }

    pub fn rewrite(&self, tree: &mut XmlTree, p: NodeId, warnings: &mut Warnings) -> RewriteOutcome {
        let text = paragraph::paragraph_text(tree, p);
        if self.resolver.has_block_content(&text) {
            return RewriteOutcome::Deferred;
        }
        let rewritten = self.resolver.substitute(&text, warnings);
        if rewritten == text {
            return RewriteOutcome::Unchanged;
        }
        paragraph::collapse_into_first_run(tree, p, &rewritten);
        RewriteOutcome::Rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockCatalog, EngineConfig};
    use crate::dataset::Dataset;
    use crate::error::Warning;

    fn rewrite(xml: &str, data: &Dataset) -> (XmlTree, NodeId, RewriteOutcome, Warnings) {
        let config = EngineConfig::default();
        let catalog = BlockCatalog::from_config(&config);
        let resolver = PlaceholderResolver::new(data, &catalog, &config.labels);
        let mut tree = XmlTree::parse(xml).unwrap();
        let p = tree.root();
        let mut warnings = Warnings::new();
        let outcome = ParagraphRewriter::new(&resolver).rewrite(&mut tree, p, &mut warnings);
        (tree, p, outcome, warnings)
    }

    #[test]
    fn test_token_split_across_runs() {
        let data = Dataset::new().with("NUMERO_PROCESSO", "0001234-56.2023");
        let (tree, p, outcome, warnings) = rewrite(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Processo [NUM</w:t></w:r><w:r><w:t>ERO_PROCESSO]</w:t></w:r></w:p>"#,
            &data,
        );
        assert_eq!(outcome, RewriteOutcome::Rewritten);
        assert!(warnings.is_empty());
        assert_eq!(paragraph::paragraph_text(&tree, p), "Processo 0001234-56.2023");
        assert_eq!(paragraph::runs(&tree, p).len(), 1);
        assert_eq!(
            tree.subtree_to_string(p),
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Processo 0001234-56.2023</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_plain_paragraph_is_untouched() {
        let xml = r#"<w:p><w:r><w:t>Sem </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>marcas</w:t></w:r></w:p>"#;
        let (tree, p, outcome, _) = rewrite(xml, &Dataset::new());
        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert_eq!(tree.subtree_to_string(p), xml);
    }

    #[test]
    fn test_unresolved_only_is_unchanged() {
        let xml = r#"<w:p><w:r><w:t>[DESCONHECIDO]</w:t></w:r></w:p>"#;
        let (tree, p, outcome, warnings) = rewrite(xml, &Dataset::new());
        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert_eq!(tree.subtree_to_string(p), xml);
        assert_eq!(
            warnings.into_vec(),
            vec![Warning::UnresolvedPlaceholder {
                token: "[DESCONHECIDO]".to_string()
            }]
        );
    }

    #[test]
    fn test_block_markers_are_deferred() {
        let data = Dataset::new().with("AUTOR", "John Doe");
        let xml = r#"<w:p><w:r><w:t>[AUTOR] [CABECALHO]</w:t></w:r></w:p>"#;
        let (tree, p, outcome, _) = rewrite(xml, &data);
        assert_eq!(outcome, RewriteOutcome::Deferred);
        assert_eq!(tree.subtree_to_string(p), xml);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let data = Dataset::new().with("AUTOR", "John Doe");
        let config = EngineConfig::default();
        let catalog = BlockCatalog::from_config(&config);
        let resolver = PlaceholderResolver::new(&data, &catalog, &config.labels);
        let rewriter = ParagraphRewriter::new(&resolver);
        let mut tree =
            XmlTree::parse(r#"<w:p><w:r><w:t>Autor: {autor}</w:t></w:r></w:p>"#).unwrap();
        let p = tree.root();
        let mut warnings = Warnings::new();
        assert_eq!(rewriter.rewrite(&mut tree, p, &mut warnings), RewriteOutcome::Rewritten);
        let once = tree.subtree_to_string(p);
        assert_eq!(rewriter.rewrite(&mut tree, p, &mut warnings), RewriteOutcome::Unchanged);
        assert_eq!(tree.subtree_to_string(p), once);
    }
}
