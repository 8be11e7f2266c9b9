//! Engine settings
//!
//! Everything that is wording or layout rather than logic lives in [EngineConfig]: the
//! sentinel phrases, section headings and captions, the closed set of block markers, the
//! fixed sentences and the style candidates. A config value is always passed explicitly;
//! there is no process-wide instance.
//!
//! The `laudo-config` crate ships the same defaults as an embedded TOML file and layers
//! user files on top of it.

use crate::dataset::normalize_key;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sentinel: SentinelConfig,
    pub images: ImageConfig,
    pub labels: LabelsConfig,
    pub styles: StyleCandidates,
    pub sections: SectionsConfig,
    pub header: HeaderBlockConfig,
    pub lists: Vec<ListMarkerConfig>,
    pub dynamic: Vec<DynamicBlockConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Any of these, as a substring of a body paragraph, marks the insertion point.
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub width_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelsConfig {
    pub not_available: String,
    pub not_provided: String,
    /// `{label}` is replaced by the block label.
    pub none_submitted: String,
    pub yes: String,
    pub no: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCandidates {
    pub bullet: Vec<String>,
    pub plain: Vec<String>,
    pub heading: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionsConfig {
    pub appendices: SectionConfig,
    pub answer_images: SectionConfig,
    pub attachments: SectionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub heading: String,
    /// `{id}` and `{caption}` are replaced per item.
    pub caption: String,
}

impl SectionConfig {
    pub fn caption_for(&self, id: u32, caption: &str) -> String {
        self.caption
            .replace("{id}", &id.to_string())
            .replace("{caption}", caption)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderBlockConfig {
    pub marker: String,
    pub lines: Vec<HeaderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLine {
    pub label: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPolicy {
    /// Emit the not-provided sentence when the list is empty.
    Fallback,
    /// Emit nothing.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMarkerConfig {
    pub marker: String,
    pub empty: EmptyPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicBlockConfig {
    pub marker: String,
    /// Dataset key holding the collection; the marker itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub label: String,
    pub rule: DynamicRule,
}

impl DynamicBlockConfig {
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.marker)
    }
}

/// How a dynamic block turns its collection into prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicRule {
    RecordList {
        primary: String,
        secondary: String,
    },
    Prose {
        field: String,
    },
    Questions {
        question_field: String,
        answer_field: String,
        skip_flag: String,
        skipped_preface: String,
    },
}

impl Default for EngineConfig {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        fn header_line(label: &str, key: &str) -> HeaderLine {
            HeaderLine {
                label: label.to_string(),
                key: key.to_string(),
            }
        }
        fn list(marker: &str, empty: EmptyPolicy) -> ListMarkerConfig {
            ListMarkerConfig {
                marker: marker.to_string(),
                empty,
            }
        }
        fn questions(marker: &str, label: &str, skip_flag: &str, preface: &str) -> DynamicBlockConfig {
            DynamicBlockConfig {
                marker: marker.to_string(),
                source: None,
                label: label.to_string(),
                rule: DynamicRule::Questions {
                    question_field: "PERGUNTA".to_string(),
                    answer_field: "RESPOSTA".to_string(),
                    skip_flag: skip_flag.to_string(),
                    skipped_preface: preface.to_string(),
                },
            }
        }

        Self {
            sentinel: SentinelConfig {
                phrases: strings(&["Nada mais havendo"]),
            },
            images: ImageConfig { width_cm: 15.0 },
            labels: LabelsConfig {
                not_available: "N/A".to_string(),
                not_provided: "Não informado.".to_string(),
                none_submitted: "Nenhum registro de {label} foi apresentado.".to_string(),
                yes: "Sim".to_string(),
                no: "Não".to_string(),
                question: "Quesito".to_string(),
                answer: "Resposta".to_string(),
            },
            styles: StyleCandidates {
                bullet: strings(&["ListBullet", "List Bullet", "Marcador"]),
                plain: strings(&["Normal"]),
                heading: strings(&["Heading1", "Heading 1", "Ttulo1"]),
            },
            sections: SectionsConfig {
                appendices: SectionConfig {
                    heading: "APÊNDICES".to_string(),
                    caption: "Apêndice {id} - {caption}".to_string(),
                },
                answer_images: SectionConfig {
                    heading: "IMAGENS DAS RESPOSTAS".to_string(),
                    caption: "Figura {id} - {caption}".to_string(),
                },
                attachments: SectionConfig {
                    heading: "ANEXOS".to_string(),
                    caption: "Anexo {id} - {caption}".to_string(),
                },
            },
            header: HeaderBlockConfig {
                marker: "CABECALHO".to_string(),
                lines: vec![
                    header_line("Processo nº", "NUMERO_PROCESSO"),
                    header_line("Autor", "AUTOR"),
                    header_line("Réu", "REU"),
                ],
            },
            lists: vec![
                list("DILIGENCIAS", EmptyPolicy::Fallback),
                list("ASSISTENTES_TECNICOS", EmptyPolicy::Fallback),
                list("OBSERVACOES", EmptyPolicy::Omit),
            ],
            dynamic: vec![
                DynamicBlockConfig {
                    marker: "DOCUMENTOS".to_string(),
                    source: None,
                    label: "documentos".to_string(),
                    rule: DynamicRule::RecordList {
                        primary: "NOME".to_string(),
                        secondary: "REFERENCIA".to_string(),
                    },
                },
                DynamicBlockConfig {
                    marker: "PADROES".to_string(),
                    source: None,
                    label: "padrões".to_string(),
                    rule: DynamicRule::RecordList {
                        primary: "DESCRICAO".to_string(),
                        secondary: "REFERENCIA".to_string(),
                    },
                },
                DynamicBlockConfig {
                    marker: "CONCLUSAO".to_string(),
                    source: None,
                    label: "conclusão".to_string(),
                    rule: DynamicRule::Prose {
                        field: "TEXTO".to_string(),
                    },
                },
                questions(
                    "QUESITOS_AUTOR",
                    "quesitos do autor",
                    "QUESITOS_AUTOR_DISPENSADOS",
                    "O autor dispensou a apresentação de quesitos.",
                ),
                questions(
                    "QUESITOS_REU",
                    "quesitos do réu",
                    "QUESITOS_REU_DISPENSADOS",
                    "O réu dispensou a apresentação de quesitos.",
                ),
            ],
        }
    }
}

/// What a block marker name stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry<'a> {
    Header(&'a HeaderBlockConfig),
    List(&'a ListMarkerConfig),
    Dynamic(&'a DynamicBlockConfig),
}

/// The closed set of block markers, looked up by normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCatalog {
    header: HeaderBlockConfig,
    lists: Vec<ListMarkerConfig>,
    dynamic: Vec<DynamicBlockConfig>,
}

impl BlockCatalog {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            header: config.header.clone(),
            lists: config.lists.clone(),
            dynamic: config.dynamic.clone(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<CatalogEntry<'_>> {
        let name = normalize_key(name);
        if normalize_key(&self.header.marker) == name {
            return Some(CatalogEntry::Header(&self.header));
        }
        if let Some(block) = self
            .dynamic
            .iter()
            .find(|block| normalize_key(&block.marker) == name)
        {
            return Some(CatalogEntry::Dynamic(block));
        }
        self.lists
            .iter()
            .find(|list| normalize_key(&list.marker) == name)
            .map(CatalogEntry::List)
    }

    pub fn header(&self) -> &HeaderBlockConfig {
        &self.header
    }

    /// Every marker with its entry, header first, then lists, then dynamic blocks.
    pub fn entries(&self) -> Vec<(&str, CatalogEntry<'_>)> {
        let mut entries = vec![(self.header.marker.as_str(), CatalogEntry::Header(&self.header))];
        entries.extend(
            self.lists
                .iter()
                .map(|list| (list.marker.as_str(), CatalogEntry::List(list))),
        );
        entries.extend(
            self.dynamic
                .iter()
                .map(|block| (block.marker.as_str(), CatalogEntry::Dynamic(block))),
        );
        entries
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
