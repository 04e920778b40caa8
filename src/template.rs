use crate::err::{Result, TemplateError};
use crate::ie::IeRegistry;
use crate::options;
use crate::template_field::{FieldFlags, TemplateField, IPFIX_VAR_IE_LENGTH};
use crate::utils::ByteCursor;

use log::trace;
use std::cmp::Ordering;

/// Set identifiers below this value are reserved; template ids start here.
pub const IPFIX_SET_MIN_DATA_SET_ID: u16 = 256;

/// Size of the IPFIX message header in bytes.
pub const IPFIX_MSG_HEADER_SIZE: u16 = 16;

/// Size of a set header in bytes.
pub const IPFIX_SET_HEADER_SIZE: u16 = 4;

/// Kind of a template record, as declared by the set id it arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateType {
    /// Template Set record (set id 2).
    Normal,
    /// Options Template Set record (set id 3).
    Options,
}

bitflags! {
    /// Template-wide feature flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TemplateFlags: u16 {
        /// At least one Information Element occurs multiple times.
        const HAS_MULTI_IE = 0x0001;
        /// At least one field is variable-length.
        const HAS_DYNAMIC = 0x0002;
        /// At least one field is bound to a reverse (biflow) definition.
        const HAS_REVERSE = 0x0004;
        /// At least one field is bound to a structured-data definition.
        const HAS_STRUCT = 0x0008;
        /// A non-empty flow key annotation is in effect.
        const HAS_FKEY = 0x0010;
    }
}

bitflags! {
    /// Recognised Options Template subtypes (RFC 7011 Section 4, RFC 5610).
    ///
    /// The detectors are orthogonal; any combination of bits may be set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OptionsTypes: u16 {
        /// The Metering Process Statistics Options Template.
        const MPROC_STAT = 0x0001;
        /// The Metering Process Reliability Statistics Options Template.
        const MPROC_RELIABILITY_STAT = 0x0002;
        /// The Exporting Process Reliability Statistics Options Template.
        const EPROC_RELIABILITY_STAT = 0x0004;
        /// The Flow Keys Options Template.
        const FKEYS = 0x0008;
        /// The Information Element Type Options Template (RFC 5610).
        const IE_TYPE = 0x0010;
    }
}

/// A parsed Template or Options Template record.
///
/// The identifier, field list, expected data length and the raw wire copy are
/// fixed at parse time; only annotations (`flags`, `opts_types`, per-field
/// IE bindings and flow-key bits) change afterwards, through
/// [`ies_define`](Template::ies_define) and
/// [`flowkey_define`](Template::flowkey_define).
#[derive(Debug, Clone)]
pub struct Template {
    ttype: TemplateType,
    id: u16,
    fields_scope: u16,
    data_length: u32,
    flags: TemplateFlags,
    opts_types: OptionsTypes,
    fields: Vec<TemplateField>,
    raw: Vec<u8>,
}

struct RecordHeader {
    id: u16,
    fields_total: u16,
    fields_scope: u16,
}

impl RecordHeader {
    /// Decode the 4-byte (normal / withdrawal) or 6-byte (options) record
    /// header. The scope count word is only present for non-withdrawal
    /// Options Templates.
    fn parse(ttype: TemplateType, cursor: &mut ByteCursor<'_>) -> Result<RecordHeader> {
        let id = cursor.u16_named("template id")?;
        let fields_total = cursor.u16_named("field count")?;

        if id < IPFIX_SET_MIN_DATA_SET_ID {
            return Err(TemplateError::ReservedTemplateId { id });
        }

        let mut fields_scope = 0;
        if fields_total != 0 && ttype == TemplateType::Options {
            fields_scope = cursor.u16_named("scope field count")?;
            if fields_scope == 0 || fields_scope > fields_total {
                return Err(TemplateError::InvalidScopeCount {
                    scope: fields_scope,
                    total: fields_total,
                });
            }
        }

        Ok(RecordHeader {
            id,
            fields_total,
            fields_scope,
        })
    }
}

impl Template {
    /// Parse a raw template record.
    ///
    /// `buf` must start at the record header; trailing bytes (further records
    /// in the same set, padding) are ignored. Returns the template together
    /// with the number of bytes consumed.
    ///
    /// A record with field count 0 is a withdrawal: exactly 4 bytes are
    /// consumed and the scope count word is never read, even for Options
    /// Templates.
    pub fn parse(ttype: TemplateType, buf: &[u8]) -> Result<(Template, usize)> {
        let mut cursor = ByteCursor::new(buf);
        let header = RecordHeader::parse(ttype, &mut cursor)?;

        let mut fields = Vec::with_capacity(usize::from(header.fields_total));
        for _ in 0..header.fields_total {
            fields.push(TemplateField::from_cursor(&mut cursor)?);
        }

        let consumed = cursor.pos();
        let mut template = Template {
            ttype,
            id: header.id,
            fields_scope: header.fields_scope,
            data_length: 0,
            flags: TemplateFlags::empty(),
            opts_types: OptionsTypes::empty(),
            fields,
            raw: buf[..consumed].to_vec(),
        };

        if !template.is_withdrawal() {
            template.derive_positional_flags();
            template.derive_lengths_and_offsets()?;

            if ttype == TemplateType::Options {
                template.opts_types = options::classify(&template);
            }
        }

        trace!(
            "parsed {:?} template {}: {} fields ({} scope), min record length {}, {} bytes of wire",
            ttype,
            template.id,
            template.fields.len(),
            template.fields_scope,
            template.data_length,
            consumed
        );

        Ok((template, consumed))
    }

    /// Set `SCOPE`, `LAST_IE` and `MULTI_IE` on each field.
    ///
    /// The walk is right-to-left over a 64-bit occupancy bitmap keyed on
    /// `id % 64`. The bitmap is a lossy prefilter: a clear bit proves this is
    /// the last occurrence; a set bit is confirmed by scanning the already
    /// visited suffix for an exact `(en, id)` match.
    fn derive_positional_flags(&mut self) {
        let total = self.fields.len();

        for field in &mut self.fields[..usize::from(self.fields_scope)] {
            field.flags |= FieldFlags::SCOPE;
        }

        let mut seen: u64 = 0;
        for i in (0..total).rev() {
            let my_bit = 1u64 << (self.fields[i].id % 64);
            if seen & my_bit == 0 {
                self.fields[i].flags |= FieldFlags::LAST_IE;
                seen |= my_bit;
                continue;
            }

            let (id, en) = (self.fields[i].id, self.fields[i].en);
            let mut same_found = false;
            for x in i + 1..total {
                if self.fields[x].id != id || self.fields[x].en != en {
                    continue;
                }

                self.fields[i].flags |= FieldFlags::MULTI_IE;
                self.fields[x].flags |= FieldFlags::MULTI_IE;
                same_found = true;
                break;
            }

            if !same_found {
                // Bitmap collision between distinct elements.
                self.fields[i].flags |= FieldFlags::LAST_IE;
            }
        }
    }

    /// Assign per-field data-record offsets and compute the minimum record
    /// length, folding per-field flags into the template flags.
    fn derive_lengths_and_offsets(&mut self) -> Result<()> {
        let mut data_length: u32 = 0;
        let mut offset_cursor: u16 = 0;

        for field in &mut self.fields {
            field.offset = offset_cursor;

            if field.flags.contains(FieldFlags::MULTI_IE) {
                self.flags |= TemplateFlags::HAS_MULTI_IE;
            }

            if field.length == IPFIX_VAR_IE_LENGTH {
                // A variable-length element occupies at least its 1-byte
                // length prefix; offsets of everything after it are unknowable.
                self.flags |= TemplateFlags::HAS_DYNAMIC;
                data_length += 1;
                offset_cursor = IPFIX_VAR_IE_LENGTH;
                continue;
            }

            data_length += u32::from(field.length);
            if offset_cursor != IPFIX_VAR_IE_LENGTH {
                // Wrapped values are unreachable: the record cap below rejects them.
                offset_cursor = offset_cursor.wrapping_add(field.length);
            }
        }

        let max_rec_size = u16::MAX - IPFIX_MSG_HEADER_SIZE - IPFIX_SET_HEADER_SIZE;
        if data_length > u32::from(max_rec_size) {
            return Err(TemplateError::DataRecordTooLong {
                length: data_length,
                max: max_rec_size,
            });
        }

        self.data_length = data_length;
        Ok(())
    }

    pub fn template_type(&self) -> TemplateType {
        self.ttype
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn fields_total(&self) -> u16 {
        self.fields.len() as u16
    }

    pub fn fields_scope(&self) -> u16 {
        self.fields_scope
    }

    /// Minimum length in bytes of a data record described by this template.
    pub fn data_length(&self) -> u32 {
        self.data_length
    }

    pub fn flags(&self) -> TemplateFlags {
        self.flags
    }

    pub fn opts_types(&self) -> OptionsTypes {
        self.opts_types
    }

    /// The exact wire bytes this template was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// A template record with field count 0 withdraws its template id.
    pub fn is_withdrawal(&self) -> bool {
        self.fields.is_empty()
    }

    /// The leading scope fields (empty for normal templates).
    pub fn scope_fields(&self) -> &[TemplateField] {
        &self.fields[..usize::from(self.fields_scope)]
    }

    /// All non-scope fields.
    pub fn option_fields(&self) -> &[TemplateField] {
        &self.fields[usize::from(self.fields_scope)..]
    }

    /// Find the first occurrence of an Information Element.
    pub fn find(&self, en: u32, id: u16) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id == id && f.en == en)
    }

    /// Bind Information Element definitions from `registry` to the fields and
    /// recompute the definition-derived annotations.
    ///
    /// With `preserve`, fields that already carry a binding keep it (and their
    /// `REVERSE`/`STRUCTURED` flags); everything else is looked up afresh, and
    /// a `None` registry drops stale bindings. Passing `None` with `preserve`
    /// is a no-op.
    ///
    /// `HAS_REVERSE` and `HAS_STRUCT` are recomputed from scratch, and biflow
    /// key classification runs whenever any reverse element is present.
    pub fn ies_define(&mut self, registry: Option<&IeRegistry>, preserve: bool) {
        if registry.is_none() && preserve {
            return;
        }

        let mut has_reverse = false;
        let mut has_struct = false;

        for field in &mut self.fields {
            // Biflow key flags are recomputed below, never preserved.
            field.flags -=
                FieldFlags::BKEY_COM | FieldFlags::BKEY_SRC | FieldFlags::BKEY_DST;

            if preserve && field.def.is_some() {
                has_reverse |= field.flags.contains(FieldFlags::REVERSE);
                has_struct |= field.flags.contains(FieldFlags::STRUCTURED);
                continue;
            }

            field.flags -= FieldFlags::REVERSE | FieldFlags::STRUCTURED;

            let def = registry.and_then(|reg| reg.find(field.en, field.id));
            let Some(def) = def else {
                field.def = None;
                continue;
            };

            field.def = Some(def.clone());
            if def.is_reverse {
                field.flags |= FieldFlags::REVERSE;
                has_reverse = true;
            }
            if def.data_type.is_structured() {
                field.flags |= FieldFlags::STRUCTURED;
                has_struct = true;
            }
        }

        self.flags.set(TemplateFlags::HAS_REVERSE, has_reverse);
        self.flags.set(TemplateFlags::HAS_STRUCT, has_struct);

        if has_reverse {
            self.classify_biflow();
        }
    }

    /// Classify fields as biflow key / non-key (RFC 5103).
    ///
    /// A field is a common key unless it is itself a reverse element, or its
    /// definition names a reverse counterpart that is also present in this
    /// template (a paired forward value). Common keys whose element name
    /// starts with `source` / `destination` additionally get the endpoint
    /// flag; the prefix match is ASCII case-insensitive.
    fn classify_biflow(&mut self) {
        for i in 0..self.fields.len() {
            let mut keys = FieldFlags::BKEY_COM;

            if let Some(def) = self.fields[i].def.as_deref() {
                if def.is_reverse {
                    continue;
                }
                if let Some(rev) = def.reverse_elem {
                    if self.find(rev.pen, rev.id).is_some() {
                        continue;
                    }
                }
                if let Some(name) = def.name.as_deref() {
                    if ascii_prefix_matches(name, "source") {
                        keys |= FieldFlags::BKEY_SRC;
                    } else if ascii_prefix_matches(name, "destination") {
                        keys |= FieldFlags::BKEY_DST;
                    }
                }
            }

            self.fields[i].flags |= keys;
        }
    }

    /// Check that `flowkey` does not address bits beyond the field count.
    pub fn flowkey_applicable(&self, flowkey: u64) -> Result<()> {
        let bit_highest = 64 - flowkey.leading_zeros();
        if bit_highest > u32::from(self.fields_total()) {
            return Err(TemplateError::FlowKeyOutOfRange {
                bit: bit_highest - 1,
                fields: self.fields_total(),
            });
        }

        Ok(())
    }

    /// Annotate the fields with a flow key: bit `i` of `flowkey` sets
    /// `FLOW_KEY` on field `i` and clears it otherwise. A zero key clears the
    /// annotation entirely.
    pub fn flowkey_define(&mut self, mut flowkey: u64) -> Result<()> {
        self.flowkey_applicable(flowkey)?;

        self.flags.set(TemplateFlags::HAS_FKEY, flowkey != 0);

        for field in &mut self.fields {
            field.flags.set(FieldFlags::FLOW_KEY, flowkey & 0x1 != 0);
            flowkey >>= 1;
        }

        Ok(())
    }

    /// Whether the current flow-key annotation is exactly what
    /// [`flowkey_define`](Template::flowkey_define) with `flowkey` would set.
    /// Oversized keys never match.
    pub fn flowkey_matches(&self, mut flowkey: u64) -> bool {
        let key_expected = flowkey != 0;
        let key_present = self.flags.contains(TemplateFlags::HAS_FKEY);
        if !key_expected && !key_present {
            return true;
        }
        if key_expected != key_present {
            return false;
        }

        let bit_highest = 64 - flowkey.leading_zeros();
        if bit_highest > u32::from(self.fields_total()) {
            return false;
        }

        for field in &self.fields {
            if (flowkey & 0x1 != 0) != field.flags.contains(FieldFlags::FLOW_KEY) {
                return false;
            }
            flowkey >>= 1;
        }

        true
    }
}

/// Two templates are equal iff their wire bytes are identical.
impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Template {}

/// Templates order by raw length first, then lexicographically by raw bytes.
impl Ord for Template {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw
            .len()
            .cmp(&other.raw.len())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Template {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn ascii_prefix_matches(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_env_logger_initialized;

    /// Encode a template record: header then field specifiers, each
    /// `(en, id, length)` with the enterprise bit added when `en != 0`.
    fn record(id: u16, scope: Option<u16>, fields: &[(u32, u16, u16)]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&id.to_be_bytes());
        buf.extend_from_slice(&(fields.len() as u16).to_be_bytes());
        if let Some(scope) = scope {
            buf.extend_from_slice(&scope.to_be_bytes());
        }
        for &(en, ie_id, length) in fields {
            let id_word = if en != 0 { ie_id | 0x8000 } else { ie_id };
            buf.extend_from_slice(&id_word.to_be_bytes());
            buf.extend_from_slice(&length.to_be_bytes());
            if en != 0 {
                buf.extend_from_slice(&en.to_be_bytes());
            }
        }
        buf
    }

    #[test]
    fn short_header_is_truncated() {
        ensure_env_logger_initialized();
        let err = Template::parse(TemplateType::Normal, &[0x01, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, TemplateError::Truncated { what: "field count", .. }));
    }

    #[test]
    fn reserved_template_id_is_rejected() {
        let bytes = record(255, None, &[(0, 8, 4)]);
        let err = Template::parse(TemplateType::Normal, &bytes).unwrap_err();
        assert_eq!(err, TemplateError::ReservedTemplateId { id: 255 });
    }

    #[test]
    fn withdrawal_consumes_four_bytes_and_never_reads_scope() {
        // Only 4 bytes of input; an options header read would fail.
        let bytes = record(256, None, &[]);
        for ttype in [TemplateType::Normal, TemplateType::Options] {
            let (template, consumed) = Template::parse(ttype, &bytes).unwrap();
            assert_eq!(consumed, 4);
            assert!(template.is_withdrawal());
            assert_eq!(template.fields_total(), 0);
            assert_eq!(template.fields_scope(), 0);
            assert_eq!(template.raw(), &bytes[..]);
        }
    }

    #[test]
    fn zero_scope_count_is_rejected() {
        let bytes = record(256, Some(0), &[(0, 8, 4)]);
        let err = Template::parse(TemplateType::Options, &bytes).unwrap_err();
        assert_eq!(err, TemplateError::InvalidScopeCount { scope: 0, total: 1 });
    }

    #[test]
    fn scope_count_beyond_field_count_is_rejected() {
        let bytes = record(768, Some(3), &[(0, 8, 4), (0, 12, 4)]);
        let err = Template::parse(TemplateType::Options, &bytes).unwrap_err();
        assert_eq!(err, TemplateError::InvalidScopeCount { scope: 3, total: 2 });
    }

    #[test]
    fn truncated_field_specifiers_are_rejected() {
        let mut bytes = record(256, None, &[(0, 8, 4), (0, 12, 4)]);
        bytes.truncate(bytes.len() - 2);
        assert!(Template::parse(TemplateType::Normal, &bytes).is_err());
    }

    #[test]
    fn normal_template_never_reads_a_scope_count() {
        // 6 leading bytes that would be a valid options header; as a normal
        // template the third word is the first field specifier instead.
        let bytes = record(256, None, &[(0, 1, 8), (0, 2, 8)]);
        let (template, consumed) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(template.fields_scope(), 0);
        assert!(template.scope_fields().is_empty());
    }

    #[test]
    fn offsets_and_data_length_accumulate() {
        let bytes = record(256, None, &[(0, 8, 4), (0, 12, 4), (0, 7, 2)]);
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        let offsets: Vec<u16> = template.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(template.data_length(), 10);
        assert!(template.flags().is_empty());
    }

    #[test]
    fn variable_length_field_poisons_later_offsets() {
        let bytes = record(
            256,
            None,
            &[(0, 8, 4), (0, 100, IPFIX_VAR_IE_LENGTH), (0, 12, 4)],
        );
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        let offsets: Vec<u16> = template.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 4, IPFIX_VAR_IE_LENGTH]);
        // 4 fixed + 1 minimum for the dynamic field + 4 fixed.
        assert_eq!(template.data_length(), 9);
        assert!(template.flags().contains(TemplateFlags::HAS_DYNAMIC));
    }

    #[test]
    fn oversized_data_record_is_rejected() {
        let bytes = record(256, None, &[(0, 8, 40000), (0, 12, 30000)]);
        let err = Template::parse(TemplateType::Normal, &bytes).unwrap_err();
        assert_eq!(
            err,
            TemplateError::DataRecordTooLong {
                length: 70000,
                max: 65515,
            }
        );
    }

    #[test]
    fn last_ie_marks_the_rightmost_occurrence() {
        let bytes = record(256, None, &[(0, 8, 4), (0, 12, 4), (0, 8, 4)]);
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        let fields = template.fields();

        assert_eq!(fields[0].flags, FieldFlags::MULTI_IE);
        assert_eq!(fields[1].flags, FieldFlags::LAST_IE);
        assert_eq!(fields[2].flags, FieldFlags::MULTI_IE | FieldFlags::LAST_IE);
        assert!(template.flags().contains(TemplateFlags::HAS_MULTI_IE));
    }

    #[test]
    fn bitmap_collision_between_distinct_elements_keeps_last_ie() {
        // ids 8 and 72 collide modulo 64 but are different elements.
        let bytes = record(256, None, &[(0, 8, 4), (0, 72, 4)]);
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        for field in template.fields() {
            assert!(field.flags.contains(FieldFlags::LAST_IE));
            assert!(!field.flags.contains(FieldFlags::MULTI_IE));
        }
        assert!(!template.flags().contains(TemplateFlags::HAS_MULTI_IE));
    }

    #[test]
    fn same_id_under_different_enterprises_are_distinct_elements() {
        let bytes = record(256, None, &[(0, 8, 4), (100, 8, 4)]);
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        for field in template.fields() {
            assert!(field.flags.contains(FieldFlags::LAST_IE));
            assert!(!field.flags.contains(FieldFlags::MULTI_IE));
        }
    }

    #[test]
    fn scope_run_is_flagged() {
        let bytes = record(768, Some(2), &[(0, 149, 4), (0, 143, 4), (0, 40, 8)]);
        let (template, _) = Template::parse(TemplateType::Options, &bytes).unwrap();
        assert_eq!(template.scope_fields().len(), 2);
        assert_eq!(template.option_fields().len(), 1);
        assert!(template.fields()[0].flags.contains(FieldFlags::SCOPE));
        assert!(template.fields()[1].flags.contains(FieldFlags::SCOPE));
        assert!(!template.fields()[2].flags.contains(FieldFlags::SCOPE));
    }

    #[test]
    fn find_returns_the_first_occurrence() {
        let bytes = record(256, None, &[(0, 8, 4), (0, 12, 4), (0, 8, 4)]);
        let (template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();
        let hit = template.find(0, 8).unwrap();
        assert_eq!(hit.offset, 0);
        assert!(template.find(5, 8).is_none());
    }

    #[test]
    fn templates_order_by_raw_length_then_bytes() {
        let (short, _) =
            Template::parse(TemplateType::Normal, &record(256, None, &[(0, 8, 4)])).unwrap();
        let (long, _) = Template::parse(
            TemplateType::Normal,
            &record(256, None, &[(0, 8, 4), (0, 12, 4)]),
        )
        .unwrap();
        let (other, _) =
            Template::parse(TemplateType::Normal, &record(256, None, &[(0, 9, 4)])).unwrap();

        assert!(short < long);
        assert!(short < other);
        assert_eq!(short, short.clone());
        assert_ne!(short, other);
    }

    #[test]
    fn flowkey_define_round_trips() {
        let bytes = record(256, None, &[(0, 8, 4), (0, 12, 4), (0, 7, 2)]);
        let (mut template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();

        template.flowkey_define(0b101).unwrap();
        assert!(template.flags().contains(TemplateFlags::HAS_FKEY));
        assert!(template.fields()[0].flags.contains(FieldFlags::FLOW_KEY));
        assert!(!template.fields()[1].flags.contains(FieldFlags::FLOW_KEY));
        assert!(template.fields()[2].flags.contains(FieldFlags::FLOW_KEY));
        assert!(template.flowkey_matches(0b101));
        assert!(!template.flowkey_matches(0b100));
        assert!(!template.flowkey_matches(0));

        // Redefining with fewer bits clears stale FLOW_KEY flags.
        template.flowkey_define(0b010).unwrap();
        assert!(!template.fields()[0].flags.contains(FieldFlags::FLOW_KEY));
        assert!(template.flowkey_matches(0b010));

        template.flowkey_define(0).unwrap();
        assert!(!template.flags().contains(TemplateFlags::HAS_FKEY));
        assert!(template.flowkey_matches(0));
    }

    #[test]
    fn flowkey_beyond_field_count_is_rejected() {
        let bytes = record(256, None, &[(0, 8, 4), (0, 12, 4)]);
        let (mut template, _) = Template::parse(TemplateType::Normal, &bytes).unwrap();

        assert!(template.flowkey_applicable(0b11).is_ok());
        let err = template.flowkey_define(0b100).unwrap_err();
        assert_eq!(err, TemplateError::FlowKeyOutOfRange { bit: 2, fields: 2 });
        assert!(!template.flowkey_matches(0b100));
    }
}
