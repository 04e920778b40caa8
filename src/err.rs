use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors produced while parsing or annotating a template record.
///
/// Every variant describes malformed wire input; the record that produced it
/// must be skipped or dropped by the caller. `parse` never leaves partial
/// state behind on failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error(
        "Offset {offset}: unexpected end of template record while reading {what} \
         (need {need} bytes, have {have})"
    )]
    Truncated {
        what: &'static str,
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("Template id {id} is reserved for set identifiers (data templates start at 256)")]
    ReservedTemplateId { id: u16 },

    #[error("Options template declares {scope} scope fields out of {total} total")]
    InvalidScopeCount { scope: u16, total: u16 },

    #[error("Minimum data record length {length} exceeds the {max} byte IPFIX message payload")]
    DataRecordTooLong { length: u32, max: u16 },

    #[error("Flow key bit {bit} is set, but the template has only {fields} fields")]
    FlowKeyOutOfRange { bit: u32, fields: u16 },
}
