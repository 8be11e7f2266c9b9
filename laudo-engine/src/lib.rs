//! Report generation from office document templates
//!
//!     This crate fills a `.docx` template with values from a flat dataset, expands a closed
//!     set of block markers (header, lists, dynamic text) and appends the attachment sections
//!     (appendices, answer images, attachments) after a sentinel paragraph found by content.
//!
//!     This is a pure lib: no code here assumes a shell, a terminal or environment variables.
//!     The only side effect is writing the finished document, done once at the very end.
//!
//! Architecture
//!
//!     .
//!     ├── docx                  # package (zip) + XML arena + paragraph/run model
//!     │   ├── package.rs        # reads and rewrites the zip container
//!     │   ├── xml.rs            # arena of XML nodes addressed by NodeId
//!     │   ├── paragraph.rs      # run text <-> w:t/w:br/w:tab mapping, paragraph text
//!     │   ├── styles.rs         # style sheet lookups (bullet, plain, heading)
//!     │   └── media.rs          # image parts, relationships and inline drawings
//!     ├── template              # placeholder resolution and paragraph rewriting
//!     │   ├── placeholder.rs    # the three delimiter syntaxes, one typed lookup
//!     │   ├── extenso.rs        # pt-BR numeral-to-words
//!     │   ├── rewriter.rs       # single-run collapse rewrite
//!     │   ├── blocks.rs         # header, list and dynamic blocks
//!     │   ├── dynamic.rs        # text rules for dynamic blocks
//!     │   ├── tables.rs         # rewriting of table cells
//!     │   └── inspect.rs        # template inspection (placeholder listing)
//!     ├── sections              # insertion point and attachment sections
//!     ├── assembler.rs          # the pipeline state machine
//!     ├── dataset.rs            # normalized key -> value snapshot
//!     ├── attachments.rs        # the three attachment collections
//!     ├── config.rs             # engine settings (explicit, never global)
//!     └── error.rs              # fatal errors and collected warnings
//!
//! Testing
//!
//!     Templates used in tests are built in memory with [testing::TemplateBuilder], so no
//!     binary fixtures are checked in. Integration tests live under `tests/`.

pub mod assembler;
pub mod attachments;
pub mod config;
pub mod dataset;
pub mod docx;
pub mod error;
pub mod sections;
pub mod template;
pub mod testing;

pub use assembler::{generate, AssembledDocument, DocumentAssembler, GenerationReport, Stage};
pub use attachments::{AttachmentItem, AttachmentKind, Attachments, ImagePayload};
pub use config::EngineConfig;
pub use dataset::{Dataset, Record, Scalar, Value};
pub use docx::Document;
pub use error::{GenerationError, Warning};
