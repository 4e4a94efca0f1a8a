use crate::protocol::{DnsHeader, DnsPacket, DnsQuestion, DnsRecord, ResultCode};

/// Builder for creating DNS response packets
///
/// Accumulates the reply's sections and header flags; identity fields (id,
/// rd, opcode) are copied from the query at build time. Section counts are
/// bound by the encoder, not here.
pub struct DnsResponseBuilder {
    header: DnsHeader,
    questions: Vec<DnsQuestion>,
    answers: Vec<DnsRecord>,
    authorities: Vec<DnsRecord>,
    additionals: Vec<DnsRecord>,
}

impl DnsResponseBuilder {
    /// Create a new response builder
    pub fn new() -> Self {
        let mut header = DnsHeader::new();
        header.qr = true; // Always a response
        header.ra = true; // This server chases delegations on the client's behalf

        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Build response with custom settings
    pub fn build_custom_response<'a>(
        &'a mut self,
        query_packet: &'a DnsPacket,
    ) -> ResponseBuilder<'a> {
        ResponseBuilder {
            builder: self,
            query_packet,
        }
    }
}

impl Default for DnsResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent interface for building custom responses
pub struct ResponseBuilder<'a> {
    builder: &'a mut DnsResponseBuilder,
    query_packet: &'a DnsPacket,
}

impl<'a> ResponseBuilder<'a> {
    /// Set response code
    pub fn with_rcode(self, rcode: ResultCode) -> Self {
        self.builder.header.rcode = rcode;
        self
    }

    /// Set qr (query/response) flag
    pub fn with_qr(self, qr: bool) -> Self {
        self.builder.header.qr = qr;
        self
    }

    /// Set authoritative flag
    pub fn with_authoritative(self, aa: bool) -> Self {
        self.builder.header.aa = aa;
        self
    }

    /// Set recursion available flag
    pub fn with_recursion_available(self, ra: bool) -> Self {
        self.builder.header.ra = ra;
        self
    }

    /// Echo a question into the response
    pub fn with_question(self, question: DnsQuestion) -> Self {
        self.builder.questions.push(question);
        self
    }

    /// Add a record to the answer section
    pub fn with_answer(self, record: DnsRecord) -> Self {
        self.builder.answers.push(record);
        self
    }

    /// Add a record to the authority section
    pub fn with_authority(self, record: DnsRecord) -> Self {
        self.builder.authorities.push(record);
        self
    }

    /// Add a record to the additional section
    pub fn with_additional(self, record: DnsRecord) -> Self {
        self.builder.additionals.push(record);
        self
    }

    /// Build the final response, copying the query's identity fields
    pub fn build(self) -> DnsPacket {
        self.builder.header.id = self.query_packet.header.id;
        self.builder.header.rd = self.query_packet.header.rd;
        self.builder.header.opcode = self.query_packet.header.opcode;

        DnsPacket {
            header: self.builder.header,
            questions: std::mem::take(&mut self.builder.questions),
            answers: std::mem::take(&mut self.builder.answers),
            authorities: std::mem::take(&mut self.builder.authorities),
            additionals: std::mem::take(&mut self.builder.additionals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{QueryType, RData};
    use std::net::Ipv4Addr;

    fn query_packet(id: u16) -> DnsPacket {
        let mut query = DnsPacket::new();
        query.header.id = id;
        query.header.rd = true;
        query
            .questions
            .push(DnsQuestion::new("example.com".to_string(), QueryType::A));
        query
    }

    #[test]
    fn test_response_echoes_query_identity() {
        let query = query_packet(1234);
        let mut builder = DnsResponseBuilder::new();

        let response = builder.build_custom_response(&query).build();

        assert_eq!(response.header.id, 1234);
        assert!(response.header.qr);
        assert!(response.header.ra);
        assert!(response.header.rd);
        assert_eq!(response.header.rcode, ResultCode::NoError);
    }

    #[test]
    fn test_form_error_response_has_no_body_sections() {
        let query = query_packet(5678);
        let mut builder = DnsResponseBuilder::new();

        let response = builder
            .build_custom_response(&query)
            .with_rcode(ResultCode::FormErr)
            .build();

        assert_eq!(response.header.rcode, ResultCode::FormErr);
        assert!(response.questions.is_empty());
        assert!(response.answers.is_empty());
        assert!(response.authorities.is_empty());
        assert!(response.additionals.is_empty());
    }

    #[test]
    fn test_response_aggregates_all_sections() {
        let query = query_packet(9999);
        let mut builder = DnsResponseBuilder::new();

        let answer = DnsRecord {
            name: "example.com".to_string(),
            class: 1,
            ttl: 300,
            rdata: RData::A(Ipv4Addr::new(93, 184, 216, 34)),
        };
        let authority = DnsRecord {
            name: "example.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::Ns("ns1.example.com".to_string()),
        };
        let additional = DnsRecord {
            name: "ns1.example.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::A(Ipv4Addr::new(192, 0, 2, 1)),
        };

        let response = builder
            .build_custom_response(&query)
            .with_rcode(ResultCode::NoError)
            .with_question(query.questions[0].clone())
            .with_answer(answer.clone())
            .with_authority(authority.clone())
            .with_additional(additional.clone())
            .build();

        assert_eq!(response.questions, query.questions);
        assert_eq!(response.answers, vec![answer]);
        assert_eq!(response.authorities, vec![authority]);
        assert_eq!(response.additionals, vec![additional]);
    }

    #[test]
    fn test_fluent_flag_setters() {
        let query = query_packet(42);
        let mut builder = DnsResponseBuilder::new();

        let response = builder
            .build_custom_response(&query)
            .with_rcode(ResultCode::NxDomain)
            .with_authoritative(true)
            .with_recursion_available(false)
            .build();

        assert_eq!(response.header.rcode, ResultCode::NxDomain);
        assert!(response.header.aa);
        assert!(!response.header.ra);
    }
}
