use crate::err::Result;
use crate::ie::IeDef;
use crate::utils::ByteCursor;

use std::sync::Arc;

/// Length value marking a variable-length Information Element; the actual
/// length is encoded inline in each data record (RFC 7011, Section 7).
pub const IPFIX_VAR_IE_LENGTH: u16 = 65535;

/// Enterprise indicator bit in a Field Specifier's id word.
const EN_BIT: u16 = 0x8000;

bitflags! {
    /// Per-field feature flags.
    ///
    /// `SCOPE`, `MULTI_IE` and `LAST_IE` are derived from the template
    /// structure alone; `REVERSE`, `STRUCTURED` and the `BKEY_*` flags come
    /// from Information Element definitions bound via
    /// [`Template::ies_define`](crate::Template::ies_define); `FLOW_KEY` is
    /// set by [`Template::flowkey_define`](crate::Template::flowkey_define).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u16 {
        /// The field is a scope field of an Options Template.
        const SCOPE = 0x0001;
        /// The same Information Element occurs more than once in the template.
        const MULTI_IE = 0x0002;
        /// The last (highest-index) occurrence of this Information Element.
        const LAST_IE = 0x0004;
        /// The bound definition belongs to the reverse direction of a biflow.
        const REVERSE = 0x0008;
        /// The bound definition is a structured type (RFC 6313).
        const STRUCTURED = 0x0010;
        /// The field is part of the flow key.
        const FLOW_KEY = 0x0020;
        /// Biflow: common key field shared by both directions (RFC 5103).
        const BKEY_COM = 0x0040;
        /// Biflow: common key field describing the source endpoint.
        const BKEY_SRC = 0x0080;
        /// Biflow: common key field describing the destination endpoint.
        const BKEY_DST = 0x0100;
    }
}

/// A single parsed Field Specifier.
#[derive(Debug, Clone)]
pub struct TemplateField {
    /// Information Element id with the enterprise bit stripped.
    pub id: u16,
    /// Private Enterprise Number; 0 for IANA elements.
    pub en: u32,
    /// Field length in bytes, or [`IPFIX_VAR_IE_LENGTH`] for variable length.
    pub length: u16,
    /// Byte offset of this field within a data record. Once any preceding
    /// field is variable-length the offset is unknowable and holds
    /// [`IPFIX_VAR_IE_LENGTH`].
    pub offset: u16,
    pub flags: FieldFlags,
    /// Definition bound from the IE dictionary, if known.
    pub def: Option<Arc<IeDef>>,
}

impl TemplateField {
    /// Decode one Field Specifier from the wire.
    pub(crate) fn from_cursor(cursor: &mut ByteCursor<'_>) -> Result<TemplateField> {
        let raw_id = cursor.u16_named("field specifier id")?;
        let length = cursor.u16_named("field specifier length")?;

        let en = if raw_id & EN_BIT != 0 {
            cursor.u32_named("field specifier enterprise number")?
        } else {
            0
        };

        Ok(TemplateField {
            id: raw_id & !EN_BIT,
            en,
            length,
            offset: 0,
            flags: FieldFlags::empty(),
            def: None,
        })
    }

    pub fn is_variable_length(&self) -> bool {
        self.length == IPFIX_VAR_IE_LENGTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iana_specifier_has_no_enterprise_number() {
        let buf = [0x00, 0x08, 0x00, 0x04];
        let mut cursor = ByteCursor::new(&buf);
        let field = TemplateField::from_cursor(&mut cursor).unwrap();
        assert_eq!((field.id, field.en, field.length), (8, 0, 4));
        assert_eq!(cursor.pos(), 4);
    }

    #[test]
    fn enterprise_bit_pulls_in_the_pen_and_is_stripped() {
        let buf = [0x80, 0x0A, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x20];
        let mut cursor = ByteCursor::new(&buf);
        let field = TemplateField::from_cursor(&mut cursor).unwrap();
        assert_eq!((field.id, field.en), (10, 32));
        assert!(field.is_variable_length());
        assert_eq!(cursor.pos(), 8);
    }

    #[test]
    fn truncated_enterprise_number_is_an_error() {
        let buf = [0x80, 0x0A, 0x00, 0x04, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&buf);
        assert!(TemplateField::from_cursor(&mut cursor).is_err());
    }
}
