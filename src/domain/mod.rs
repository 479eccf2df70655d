mod parser;
mod schema;

pub use parser::{parse_section, parse_sections};
pub use schema::{
    Choice, DEFAULT_FILE_TYPES, DEFAULT_MAX_SIZE_MB, FieldDescriptor, FieldKind, FormSection,
    SectionMessages,
};
