//! Property tests for placeholder substitution and numbers in full.

use laudo_engine::config::{BlockCatalog, EngineConfig};
use laudo_engine::docx::paragraph::paragraph_text;
use laudo_engine::docx::xml::XmlTree;
use laudo_engine::error::Warnings;
use laudo_engine::template::extenso::to_words;
use laudo_engine::template::{ParagraphRewriter, PlaceholderResolver, RewriteOutcome};
use laudo_engine::Dataset;
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "e", "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove", "dez",
    "onze", "doze", "treze", "quatorze", "quinze", "dezesseis", "dezessete", "dezoito",
    "dezenove", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa", "cem", "cento", "duzentos", "trezentos", "quatrocentos", "quinhentos",
    "seiscentos", "setecentos", "oitocentos", "novecentos", "mil", "milhão", "milhões",
    "bilhão", "bilhões", "trilhão", "trilhões", "quatrilhão", "quatrilhões", "quintilhão",
    "quintilhões",
];

fn delimited(key: &str, form: usize) -> String {
    match form {
        0 => format!("[{}]", key),
        1 => format!("{{{}}}", key),
        _ => format!("<<{}>>", key),
    }
}

fn paragraph_xml(runs: &[String]) -> String {
    let mut xml = String::from("<w:p>");
    for run in runs {
        xml.push_str("<w:r><w:t>");
        xml.push_str(&quick_escape(run));
        xml.push_str("</w:t></w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

fn quick_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

proptest! {
    #[test]
    fn spelled_numbers_use_only_known_words(n in any::<u64>()) {
        let words = to_words(n);
        prop_assert!(!words.contains("  "));
        for word in words.split(' ') {
            prop_assert!(WORDS.contains(&word), "unexpected word {:?} in {:?}", word, words);
        }
    }

    #[test]
    fn scalar_renders_in_any_form_and_split(
        key in "[A-Z][A-Z_]{0,10}",
        value in "[a-zA-Z0-9 .,-]{1,20}",
        form in 0usize..3,
        split in 0usize..40,
        prefix in "[a-z ]{0,8}",
    ) {
        let data = Dataset::new().with(&key, value.as_str());
        let config = EngineConfig::default();
        let catalog = BlockCatalog::from_config(&config);
        prop_assume!(catalog.lookup(&key).is_none());
        let resolver = PlaceholderResolver::new(&data, &catalog, &config.labels);

        let text = format!("{}{}", prefix, delimited(&key.to_lowercase(), form));
        let cut = text
            .char_indices()
            .map(|(i, _)| i)
            .nth(split % text.chars().count())
            .unwrap_or(0);
        let runs = vec![text[..cut].to_string(), text[cut..].to_string()];
        let mut tree = XmlTree::parse(&paragraph_xml(&runs)).unwrap();
        let p = tree.root();
        let mut warnings = Warnings::new();

        let outcome = ParagraphRewriter::new(&resolver).rewrite(&mut tree, p, &mut warnings);
        prop_assert!(warnings.is_empty());
        prop_assert_eq!(paragraph_text(&tree, p), format!("{}{}", prefix, value));
        if outcome == RewriteOutcome::Rewritten {
            let again = ParagraphRewriter::new(&resolver).rewrite(&mut tree, p, &mut warnings);
            prop_assert_eq!(again, RewriteOutcome::Unchanged);
        }
    }
}
