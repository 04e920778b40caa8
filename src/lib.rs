#![deny(unused_must_use)]
#![forbid(unsafe_code)]
//! Parser for IPFIX (RFC 7011) Template and Options Template records.
//!
//! A template is parsed from wire bytes into a [`Template`] value carrying
//! per-field and template-wide feature flags, data-record offsets and the
//! recognised Options subtype, ready for a record decoder to consume.
//! Binding an Information Element dictionary ([`IeRegistry`]) adds the
//! semantic layer: structured-data detection and RFC 5103 biflow key
//! classification.
//!
//! ```
//! use ipfix_template::{Template, TemplateType};
//!
//! // id 256, two fields: sourceIPv4Address(8)/4B, destinationIPv4Address(12)/4B
//! let wire = [
//!     0x01, 0x00, 0x00, 0x02,
//!     0x00, 0x08, 0x00, 0x04,
//!     0x00, 0x0C, 0x00, 0x04,
//! ];
//!
//! let (template, consumed) = Template::parse(TemplateType::Normal, &wire)?;
//! assert_eq!(consumed, 12);
//! assert_eq!(template.data_length(), 8);
//! # Ok::<(), ipfix_template::TemplateError>(())
//! ```

#[macro_use]
extern crate bitflags;

pub use err::{Result, TemplateError};
pub use ie::{IPFIX_PEN_REVERSE, IeDataType, IeDef, IeIdent, IeRegistry};
pub use template::{
    IPFIX_MSG_HEADER_SIZE, IPFIX_SET_HEADER_SIZE, IPFIX_SET_MIN_DATA_SET_ID, OptionsTypes,
    Template, TemplateFlags, TemplateType,
};
pub use template_field::{FieldFlags, IPFIX_VAR_IE_LENGTH, TemplateField};

pub mod err;
mod ie;
mod options;
mod template;
mod template_field;
mod utils;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
