//! In-memory Information Element dictionary.
//!
//! Templates on their own only carry `(enterprise, id, length)` triples; the
//! registry supplies the semantic layer: abstract data types, structured-data
//! detection (RFC 6313) and biflow pairing (RFC 5103). Definitions are handed
//! out as cheap `Arc` clones so that bound templates stay valid even after
//! the registry is replaced.

use std::collections::HashMap;
use std::sync::Arc;

/// Private Enterprise Number reserved for reverse Information Elements
/// (RFC 5103, Section 6.1).
pub const IPFIX_PEN_REVERSE: u32 = 29305;

/// IANA abstract data types of Information Elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IeDataType {
    OctetArray,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    String,
    DateTimeSeconds,
    DateTimeMilliseconds,
    DateTimeMicroseconds,
    DateTimeNanoseconds,
    Ipv4Address,
    Ipv6Address,
    BasicList,
    SubTemplateList,
    SubTemplateMultilist,
}

impl IeDataType {
    /// Structured data types per RFC 6313.
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            IeDataType::BasicList | IeDataType::SubTemplateList | IeDataType::SubTemplateMultilist
        )
    }
}

/// Identifier of an Information Element: Private Enterprise Number + element id.
///
/// `pen == 0` denotes the IANA registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IeIdent {
    pub pen: u32,
    pub id: u16,
}

/// A single Information Element definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IeDef {
    pub pen: u32,
    pub id: u16,
    pub name: Option<String>,
    pub data_type: IeDataType,
    /// True for elements belonging to the reverse direction of a biflow.
    pub is_reverse: bool,
    /// Identifier of the paired element of the opposite direction, if any.
    pub reverse_elem: Option<IeIdent>,
}

impl IeDef {
    pub fn new(pen: u32, id: u16, name: &str, data_type: IeDataType) -> Self {
        IeDef {
            pen,
            id,
            name: Some(name.to_owned()),
            data_type,
            is_reverse: false,
            reverse_elem: None,
        }
    }

    pub fn ident(&self) -> IeIdent {
        IeIdent {
            pen: self.pen,
            id: self.id,
        }
    }
}

/// Lookup table of Information Element definitions keyed by `(pen, id)`.
#[derive(Debug, Default)]
pub struct IeRegistry(HashMap<(u32, u16), Arc<IeDef>>);

impl IeRegistry {
    pub fn new() -> Self {
        IeRegistry(HashMap::new())
    }

    /// Insert a definition, replacing any previous one with the same identifier.
    pub fn add(&mut self, def: IeDef) -> Option<Arc<IeDef>> {
        self.0.insert((def.pen, def.id), Arc::new(def))
    }

    /// Register a forward element together with its RFC 5103 reverse
    /// counterpart under the reverse PEN.
    ///
    /// The reverse element shares the id and data type; its name is the
    /// forward name with a `reverse` prefix (`octetDeltaCount` →
    /// `reverseOctetDeltaCount`).
    pub fn add_biflow_pair(&mut self, mut forward: IeDef) {
        let reverse_ident = IeIdent {
            pen: IPFIX_PEN_REVERSE,
            id: forward.id,
        };

        let reverse = IeDef {
            pen: reverse_ident.pen,
            id: reverse_ident.id,
            name: forward.name.as_deref().map(reverse_name),
            data_type: forward.data_type,
            is_reverse: true,
            reverse_elem: Some(forward.ident()),
        };

        forward.reverse_elem = Some(reverse_ident);
        self.add(forward);
        self.add(reverse);
    }

    pub fn find(&self, pen: u32, id: u16) -> Option<&Arc<IeDef>> {
        self.0.get(&(pen, id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A registry pre-populated with a subset of common IANA elements,
    /// including biflow pairs where RFC 5103 defines them.
    pub fn iana() -> Self {
        use IeDataType::*;

        let mut reg = IeRegistry::new();

        for def in [
            IeDef::new(0, 4, "protocolIdentifier", Unsigned8),
            IeDef::new(0, 7, "sourceTransportPort", Unsigned16),
            IeDef::new(0, 8, "sourceIPv4Address", Ipv4Address),
            IeDef::new(0, 11, "destinationTransportPort", Unsigned16),
            IeDef::new(0, 12, "destinationIPv4Address", Ipv4Address),
            IeDef::new(0, 27, "sourceIPv6Address", Ipv6Address),
            IeDef::new(0, 28, "destinationIPv6Address", Ipv6Address),
            IeDef::new(0, 40, "exportedOctetTotalCount", Unsigned64),
            IeDef::new(0, 41, "exportedMessageTotalCount", Unsigned64),
            IeDef::new(0, 42, "exportedFlowRecordTotalCount", Unsigned64),
            IeDef::new(0, 130, "exporterIPv4Address", Ipv4Address),
            IeDef::new(0, 131, "exporterIPv6Address", Ipv6Address),
            IeDef::new(0, 143, "meteringProcessId", Unsigned32),
            IeDef::new(0, 144, "exportingProcessId", Unsigned32),
            IeDef::new(0, 145, "templateId", Unsigned16),
            IeDef::new(0, 149, "observationDomainId", Unsigned32),
            IeDef::new(0, 164, "ignoredPacketTotalCount", Unsigned64),
            IeDef::new(0, 165, "ignoredOctetTotalCount", Unsigned64),
            IeDef::new(0, 166, "notSentFlowTotalCount", Unsigned64),
            IeDef::new(0, 167, "notSentPacketTotalCount", Unsigned64),
            IeDef::new(0, 168, "notSentOctetTotalCount", Unsigned64),
            IeDef::new(0, 173, "flowKeyIndicator", Unsigned64),
            IeDef::new(0, 291, "basicList", BasicList),
            IeDef::new(0, 292, "subTemplateList", SubTemplateList),
            IeDef::new(0, 293, "subTemplateMultiList", SubTemplateMultilist),
            IeDef::new(0, 303, "informationElementId", Unsigned16),
            IeDef::new(0, 322, "observationTimeSeconds", DateTimeSeconds),
            IeDef::new(0, 323, "observationTimeMilliseconds", DateTimeMilliseconds),
            IeDef::new(0, 324, "observationTimeMicroseconds", DateTimeMicroseconds),
            IeDef::new(0, 325, "observationTimeNanoseconds", DateTimeNanoseconds),
            IeDef::new(0, 339, "informationElementDataType", Unsigned8),
            IeDef::new(0, 341, "informationElementName", String),
            IeDef::new(0, 344, "informationElementSemantics", Unsigned8),
            IeDef::new(0, 346, "privateEnterpriseNumber", Unsigned32),
        ] {
            reg.add(def);
        }

        for def in [
            IeDef::new(0, 1, "octetDeltaCount", Unsigned64),
            IeDef::new(0, 2, "packetDeltaCount", Unsigned64),
            IeDef::new(0, 6, "tcpControlBits", Unsigned16),
            IeDef::new(0, 152, "flowStartMilliseconds", DateTimeMilliseconds),
            IeDef::new(0, 153, "flowEndMilliseconds", DateTimeMilliseconds),
        ] {
            reg.add_biflow_pair(def);
        }

        reg
    }
}

fn reverse_name(forward: &str) -> String {
    let mut name = String::with_capacity(forward.len() + 7);
    name.push_str("reverse");
    let mut chars = forward.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name
}
