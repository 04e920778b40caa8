//! Detection of well-known Options Template subtypes.
//!
//! RFC 7011 Sections 4.1–4.4 and RFC 5610 Section 3.9 describe Options
//! Templates by their scope and non-scope Information Element sets. The
//! detectors below recognise those patterns and are purely additive: an
//! unknown layout simply leaves all bits clear.

use crate::template::{OptionsTypes, Template};
use crate::template_field::FieldFlags;

use log::trace;

const IE_EXPORTED_OCTETS: u16 = 40; // exportedOctetTotalCount
const IE_EXPORTED_MESSAGES: u16 = 41; // exportedMessageTotalCount
const IE_EXPORTED_FLOWS: u16 = 42; // exportedFlowRecordTotalCount
const IE_EXPORTER_IPV4: u16 = 130; // exporterIPv4Address
const IE_EXPORTER_IPV6: u16 = 131; // exporterIPv6Address
const IE_MPID: u16 = 143; // meteringProcessId
const IE_EXPORTING_PID: u16 = 144; // exportingProcessId
const IE_TEMPLATE_ID: u16 = 145; // templateId
const IE_ODID: u16 = 149; // observationDomainId
const IE_IGNORED_PACKETS: u16 = 164; // ignoredPacketTotalCount
const IE_IGNORED_OCTETS: u16 = 165; // ignoredOctetTotalCount
const IE_NOT_SENT_FLOWS: u16 = 166; // notSentFlowTotalCount
const IE_NOT_SENT_PACKETS: u16 = 167; // notSentPacketTotalCount
const IE_NOT_SENT_OCTETS: u16 = 168; // notSentOctetTotalCount
const IE_FLOW_KEY_INDICATOR: u16 = 173; // flowKeyIndicator
const IE_IE_ID: u16 = 303; // informationElementId
const IE_IE_DATA_TYPE: u16 = 339; // informationElementDataType
const IE_IE_NAME: u16 = 341; // informationElementName
const IE_IE_SEMANTICS: u16 = 344; // informationElementSemantics
const IE_PEN: u16 = 346; // privateEnterpriseNumber

/// Run every detector over a non-withdrawal Options Template.
pub(crate) fn classify(template: &Template) -> OptionsTypes {
    let types = detect_mproc(template)
        | detect_eproc(template)
        | detect_flowkey(template)
        | detect_ietype(template);

    if !types.is_empty() {
        trace!("options template {} classified as {:?}", template.id(), types);
    }

    types
}

/// True iff every `(en, id)` in `required` appears among the non-scope fields.
fn has_required(template: &Template, required: &[(u32, u16)]) -> bool {
    required.iter().all(|&(en, id)| {
        template
            .option_fields()
            .iter()
            .any(|f| f.id == id && f.en == en)
    })
}

/// True iff exactly two non-scope IANA `observationTime*` elements
/// (ids 322–325) are present.
///
/// Two elements of the *same* precision also count; the RFC wants two
/// distinct precisions, but the check is deliberately this loose.
fn has_obs_time(template: &Template) -> bool {
    let mut matches = 0;
    for field in template.option_fields() {
        if field.en != 0 || !(322..=325).contains(&field.id) {
            continue;
        }

        matches += 1;
        if matches > 2 {
            return false;
        }
    }

    matches == 2
}

/// Metering Process (Reliability) Statistics Options Templates
/// (RFC 7011, Sections 4.1–4.2).
///
/// Shared scope requirement: at least one of observationDomainId /
/// meteringProcessId, and each present one must be a non-repeated scope field.
fn detect_mproc(template: &Template) -> OptionsTypes {
    let odid = template.find(0, IE_ODID);
    let mpid = template.find(0, IE_MPID);
    if odid.is_none() && mpid.is_none() {
        return OptionsTypes::empty();
    }

    for field in [odid, mpid].into_iter().flatten() {
        if !field.flags.contains(FieldFlags::SCOPE) || field.flags.contains(FieldFlags::MULTI_IE) {
            return OptionsTypes::empty();
        }
    }

    let mut types = OptionsTypes::empty();
    if has_required(
        template,
        &[
            (0, IE_EXPORTED_OCTETS),
            (0, IE_EXPORTED_MESSAGES),
            (0, IE_EXPORTED_FLOWS),
        ],
    ) {
        types |= OptionsTypes::MPROC_STAT;
    }

    if has_required(template, &[(0, IE_IGNORED_PACKETS), (0, IE_IGNORED_OCTETS)])
        && has_obs_time(template)
    {
        types |= OptionsTypes::MPROC_RELIABILITY_STAT;
    }

    types
}

/// Exporting Process Reliability Statistics Options Template
/// (RFC 7011, Section 4.3).
///
/// The scope must identify the exporter via one of exporterIPv4Address,
/// exporterIPv6Address or exportingProcessId; candidates are tried in that
/// order and the first whose first occurrence is a scope field carrying
/// `LAST_IE` qualifies.
fn detect_eproc(template: &Template) -> OptionsTypes {
    let exporter_ids = [IE_EXPORTER_IPV4, IE_EXPORTER_IPV6, IE_EXPORTING_PID];
    let scope_found = exporter_ids.iter().any(|&id| {
        template
            .find(0, id)
            .is_some_and(|f| f.flags.contains(FieldFlags::SCOPE | FieldFlags::LAST_IE))
    });
    if !scope_found {
        return OptionsTypes::empty();
    }

    if has_required(
        template,
        &[
            (0, IE_NOT_SENT_FLOWS),
            (0, IE_NOT_SENT_PACKETS),
            (0, IE_NOT_SENT_OCTETS),
        ],
    ) && has_obs_time(template)
    {
        OptionsTypes::EPROC_RELIABILITY_STAT
    } else {
        OptionsTypes::empty()
    }
}

/// Flow Keys Options Template (RFC 7011, Section 4.4).
fn detect_flowkey(template: &Template) -> OptionsTypes {
    let Some(tid) = template.find(0, IE_TEMPLATE_ID) else {
        return OptionsTypes::empty();
    };

    if !tid.flags.contains(FieldFlags::SCOPE) || tid.flags.contains(FieldFlags::MULTI_IE) {
        return OptionsTypes::empty();
    }

    if has_required(template, &[(0, IE_FLOW_KEY_INDICATOR)]) {
        OptionsTypes::FKEYS
    } else {
        OptionsTypes::empty()
    }
}

/// Information Element Type Options Template (RFC 5610, Section 3.9).
fn detect_ietype(template: &Template) -> OptionsTypes {
    for id in [IE_IE_ID, IE_PEN] {
        let Some(field) = template.find(0, id) else {
            return OptionsTypes::empty();
        };

        if !field.flags.contains(FieldFlags::SCOPE) || field.flags.contains(FieldFlags::MULTI_IE) {
            return OptionsTypes::empty();
        }
    }

    if has_required(
        template,
        &[(0, IE_IE_DATA_TYPE), (0, IE_IE_SEMANTICS), (0, IE_IE_NAME)],
    ) {
        OptionsTypes::IE_TYPE
    } else {
        OptionsTypes::empty()
    }
}
