//! Card Scan Common Library
//!
//! CLIとライブラリ本体で共有される型・パーサー・プロンプト（I/Oなし）

pub mod data_uri;
pub mod error;
pub mod fields;
pub mod modifiers;
pub mod parser;
pub mod prompts;
pub mod query;
pub mod types;

pub use data_uri::content_type_for_extension;
pub use error::{Error, Result};
pub use fields::{parse_card_number, parse_fields, parse_name, split_lines};
pub use modifiers::{NameModifiers, StrippedName};
pub use parser::{extract_json_object, parse_vision_response, VisionResponse};
pub use prompts::{build_extraction_prompt, extraction_schema};
pub use query::build_search_expression;
pub use types::{
    CardImage, CardQuery, CatalogCandidate, ExtractedFields, Extraction, ExtractionSource,
    Identification,
};
