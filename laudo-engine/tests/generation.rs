//! End-to-end generation through the public API.

use laudo_engine::docx::package::Package;
use laudo_engine::docx::paragraph;
use laudo_engine::testing::{png_bytes, TemplateBuilder};
use laudo_engine::{
    AttachmentItem, AttachmentKind, Attachments, Dataset, Document, DocumentAssembler, Record,
    Warning,
};
use rstest::rstest;

fn assemble(template: TemplateBuilder, dataset: &Dataset, attachments: &Attachments) -> (Document, Vec<Warning>) {
    let document = Document::from_bytes(&template.build()).unwrap();
    let assembled = DocumentAssembler::default()
        .assemble_document(document, dataset, attachments)
        .unwrap();
    (
        Document::from_bytes(&assembled.bytes).unwrap(),
        assembled.warnings,
    )
}

#[rstest]
#[case("[AUTOR]")]
#[case("{AUTOR}")]
#[case("<<AUTOR>>")]
#[case("[autor]")]
#[case("<<Autor>>")]
fn test_every_delimiter_form_renders_the_value(#[case] token: &str) {
    let dataset = Dataset::new().with("AUTOR", "John Doe");
    let (document, warnings) = assemble(
        TemplateBuilder::new().paragraph(&format!("Autor: {}.", token)),
        &dataset,
        &Attachments::new(),
    );
    assert!(warnings.is_empty());
    assert_eq!(document.paragraph_texts(), vec!["Autor: John Doe."]);
}

#[test]
fn test_header_example() {
    let dataset = Dataset::from_json_str(
        r#"{"NUMERO_PROCESSO": "0001234-56.2023", "AUTOR": "John Doe", "REU": "Jane Roe"}"#,
    )
    .unwrap();
    let (document, warnings) = assemble(
        TemplateBuilder::new()
            .paragraph("LAUDO PERICIAL")
            .paragraph("[CABECALHO]")
            .paragraph("Corpo"),
        &dataset,
        &Attachments::new(),
    );
    assert!(warnings.is_empty());
    assert_eq!(
        document.paragraph_texts(),
        vec![
            "LAUDO PERICIAL",
            "Processo nº: 0001234-56.2023\nAutor: John Doe\nRéu: Jane Roe",
            "Corpo",
        ]
    );
}

#[test]
fn test_header_values_are_not_substituted_again() {
    let dataset = Dataset::new()
        .with("NUMERO_PROCESSO", "0001")
        .with("AUTOR", "Construtora {REU}")
        .with("REU", "Jane Roe");
    let (document, warnings) = assemble(
        TemplateBuilder::new()
            .paragraph("[CABECALHO]")
            .paragraph("Autor: [AUTOR]"),
        &dataset,
        &Attachments::new(),
    );
    assert!(warnings.is_empty());
    assert_eq!(
        document.paragraph_texts(),
        vec![
            "Processo nº: 0001\nAutor: Construtora {REU}\nRéu: Jane Roe",
            "Autor: Construtora {REU}",
        ]
    );
}

#[test]
fn test_bracketed_header_value_does_not_warn() {
    let dataset = Dataset::new()
        .with("NUMERO_PROCESSO", "0001")
        .with("AUTOR", "Empresa X [em recuperacao]")
        .with("REU", "Jane Roe");
    let (document, warnings) = assemble(
        TemplateBuilder::new().paragraph("[CABECALHO]"),
        &dataset,
        &Attachments::new(),
    );
    assert!(warnings.is_empty());
    assert_eq!(
        document.paragraph_texts(),
        vec!["Processo nº: 0001\nAutor: Empresa X [em recuperacao]\nRéu: Jane Roe"]
    );
}

#[test]
fn test_unresolved_token_beside_header_warns_once() {
    let dataset = Dataset::new()
        .with("NUMERO_PROCESSO", "0001")
        .with("AUTOR", "John Doe")
        .with("REU", "Jane Roe");
    let (_, warnings) = assemble(
        TemplateBuilder::new().paragraph("[CABECALHO] [NADA]"),
        &dataset,
        &Attachments::new(),
    );
    assert_eq!(
        warnings,
        vec![Warning::UnresolvedPlaceholder {
            token: "[NADA]".to_string()
        }]
    );
}

#[test]
fn test_list_block_creates_one_paragraph_per_item() {
    let dataset = Dataset::new().with(
        "DILIGENCIAS",
        vec![
            "Vistoria em 10/03".to_string(),
            "Registro fotográfico".to_string(),
            "Medição das áreas".to_string(),
        ],
    );
    let (document, _) = assemble(
        TemplateBuilder::new()
            .with_bullet_style()
            .paragraph("Diligências realizadas:")
            .paragraph_runs(&["{DILIG", "ENCIAS}"])
            .paragraph("Fim"),
        &dataset,
        &Attachments::new(),
    );
    assert_eq!(
        document.paragraph_texts(),
        vec![
            "Diligências realizadas:",
            "Vistoria em 10/03",
            "Registro fotográfico",
            "Medição das áreas",
            "Fim",
        ]
    );
    let items = &document.body_paragraphs()[1..4];
    for p in items {
        assert_eq!(
            paragraph::paragraph_style(document.tree(), *p).as_deref(),
            Some("ListBullet")
        );
    }
}

#[test]
fn test_dynamic_question_block() {
    let dataset = Dataset::new().with(
        "QUESITOS_REU",
        vec![Record::new()
            .with("PERGUNTA", "O imóvel apresenta infiltrações?")
            .with("RESPOSTA", "Sim, na cozinha.")],
    );
    let (document, _) = assemble(
        TemplateBuilder::new()
            .paragraph("QUESITOS DO RÉU")
            .paragraph("[QUESITOS_REU]")
            .paragraph("[QUESITOS_AUTOR]"),
        &dataset,
        &Attachments::new(),
    );
    assert_eq!(
        document.paragraph_texts(),
        vec![
            "QUESITOS DO RÉU",
            "1. Quesito: O imóvel apresenta infiltrações?\n   Resposta: Sim, na cozinha.",
            "Nenhum registro de quesitos do autor foi apresentado.",
        ]
    );
}

#[test]
fn test_not_a_number_keeps_token() {
    let dataset = Dataset::new().with("VALOR", "mil reais");
    let (document, warnings) = assemble(
        TemplateBuilder::new().paragraph("Valor: [VALOR_EXTENSO]"),
        &dataset,
        &Attachments::new(),
    );
    assert_eq!(document.paragraph_texts(), vec!["Valor: [VALOR_EXTENSO]"]);
    assert_eq!(
        warnings,
        vec![Warning::NotANumber {
            token: "[VALOR_EXTENSO]".to_string()
        }]
    );
}

#[test]
fn test_tables_are_rewritten() {
    let dataset = Dataset::new().with("AUTOR", "John Doe").with("REU", "Jane Roe");
    let (document, _) = assemble(
        TemplateBuilder::new().table(&[&["Autor", "[AUTOR]"], &["Réu", "<<REU>>"]]),
        &dataset,
        &Attachments::new(),
    );
    let xml = document.tree().subtree_to_string(document.body());
    assert!(xml.contains("John Doe"));
    assert!(xml.contains("Jane Roe"));
    assert!(!xml.contains("[AUTOR]"));
}

#[test]
fn test_sections_order_with_all_collections() {
    let attachments = Attachments::new()
        .with(AttachmentItem::new(AttachmentKind::Attachment, 1, "Contrato"))
        .with(AttachmentItem::new(AttachmentKind::AnswerImage, 1, "Fachada").with_image(png_bytes(8, 8)))
        .with(AttachmentItem::new(AttachmentKind::Appendix, 1, "Planta").with_image(png_bytes(16, 8)));
    let (document, warnings) = assemble(
        TemplateBuilder::new()
            .paragraph("Corpo")
            .paragraph("Nada mais havendo, encerro o presente laudo.")
            .paragraph("Perito"),
        &Dataset::new(),
        &attachments,
    );
    assert!(warnings.is_empty());
    let texts = document.paragraph_texts();
    let position = |heading: &str| texts.iter().position(|t| t == heading).unwrap();
    assert!(position("APÊNDICES") < position("IMAGENS DAS RESPOSTAS"));
    assert!(position("IMAGENS DAS RESPOSTAS") < position("ANEXOS"));
    assert_eq!(position("APÊNDICES"), 2);
    assert_eq!(texts.last().map(String::as_str), Some("Perito"));
}

#[test]
fn test_missing_sentinel_appends_at_tail() {
    let attachments = Attachments::new().with(AttachmentItem::new(AttachmentKind::Attachment, 1, "Contrato"));
    let (document, warnings) = assemble(
        TemplateBuilder::new().paragraph("Corpo"),
        &Dataset::new(),
        &attachments,
    );
    assert!(warnings.is_empty());
    assert_eq!(
        document.paragraph_texts(),
        vec!["Corpo", "ANEXOS", "Anexo 1 - Contrato"]
    );
    let body = document.body();
    let last = *document.tree().children(body).last().unwrap();
    assert!(document.tree().is(last, "w:sectPr"));
}

#[test]
fn test_only_appendices_with_one_image() {
    let attachments = Attachments::new()
        .with(AttachmentItem::new(AttachmentKind::Appendix, 1, "Planta baixa").with_image(png_bytes(30, 15)));
    let template = TemplateBuilder::new().paragraph("Nada mais havendo.");
    let document = Document::from_bytes(&template.build()).unwrap();
    let assembled = DocumentAssembler::default()
        .assemble_document(document, &Dataset::new(), &attachments)
        .unwrap();

    let package = Package::from_bytes(&assembled.bytes).unwrap();
    let media: Vec<&str> = package
        .part_names()
        .filter(|name| name.starts_with("word/media/"))
        .collect();
    assert_eq!(media, vec!["word/media/laudo_image1.png"]);

    let document = Document::from_bytes(&assembled.bytes).unwrap();
    let texts = document.paragraph_texts();
    assert_eq!(texts.iter().filter(|t| t.as_str() == "APÊNDICES").count(), 1);
    assert!(!texts.iter().any(|t| t == "IMAGENS DAS RESPOSTAS" || t == "ANEXOS"));
    assert!(texts.contains(&"Apêndice 1 - Planta baixa".to_string()));

    let xml = document.tree().subtree_to_string(document.body());
    assert_eq!(xml.matches("<w:drawing").count(), 1);
    // 15 cm wide, half as tall
    assert!(xml.contains(r#"<wp:extent cx="5400000" cy="2700000"/>"#));
}
