// DNS message data model: header, question, resource records, packet.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use rand::seq::SliceRandom;

/// DNS response codes (RCODE). Codes outside the RFC 1035 set decode as
/// `NoError`; that tolerance is deliberate, upstream servers occasionally
/// emit extended codes this resolver does not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NxDomain = 3,
    NotImp = 4,
    Refused = 5,
}

impl ResultCode {
    pub fn from_num(num: u8) -> ResultCode {
        match num {
            1 => ResultCode::FormErr,
            2 => ResultCode::ServFail,
            3 => ResultCode::NxDomain,
            4 => ResultCode::NotImp,
            5 => ResultCode::Refused,
            _ => ResultCode::NoError,
        }
    }

    pub fn to_num(self) -> u8 {
        self as u8
    }
}

/// Record types this server parses into typed payloads. Anything else rides
/// through as `Unknown` and is skipped by its RDLENGTH on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Unknown(u16),
    A,     // 1
    Ns,    // 2
    Cname, // 5
    Soa,   // 6
    Mx,    // 15
    Aaaa,  // 28
}

impl QueryType {
    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::Ns,
            5 => QueryType::Cname,
            6 => QueryType::Soa,
            15 => QueryType::Mx,
            28 => QueryType::Aaaa,
            _ => QueryType::Unknown(num),
        }
    }

    pub fn to_num(self) -> u16 {
        match self {
            QueryType::Unknown(num) => num,
            QueryType::A => 1,
            QueryType::Ns => 2,
            QueryType::Cname => 5,
            QueryType::Soa => 6,
            QueryType::Mx => 15,
            QueryType::Aaaa => 28,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Unknown(num) => write!(f, "TYPE{}", num),
            QueryType::A => write!(f, "A"),
            QueryType::Ns => write!(f, "NS"),
            QueryType::Cname => write!(f, "CNAME"),
            QueryType::Soa => write!(f, "SOA"),
            QueryType::Mx => write!(f, "MX"),
            QueryType::Aaaa => write!(f, "AAAA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DnsHeader {
    pub id: u16,    // Identifier, 16 bits
    pub qr: bool,   // Query or Response, 1 bit
    pub opcode: u8, // Operation code, 4 bits
    pub aa: bool,   // Authoritative answer, 1 bit
    pub tc: bool,   // Truncated, 1 bit
    pub rd: bool,   // Recursion desired, 1 bit
    pub ra: bool,   // Recursion available, 1 bit
    pub z: bool,    // Reserved, 1 bit
    pub ad: bool,   // Authenticated data, 1 bit
    pub cd: bool,   // Checking disabled, 1 bit
    pub rcode: ResultCode, // Response code, 4 bits
    pub qdcount: u16, // Number of questions, 16 bits
    pub ancount: u16, // Number of answers, 16 bits
    pub nscount: u16, // Number of authority records, 16 bits
    pub arcount: u16, // Number of additional records, 16 bits
}

impl DnsHeader {
    pub fn new() -> Self {
        Self {
            id: 0,
            qr: false,
            opcode: 0,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            z: false,
            ad: false,
            cd: false,
            rcode: ResultCode::NoError,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }
}

impl Default for DnsHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnsQuestion {
    pub name: String, // Domain name, represented as a sequence of "labels"
    pub qtype: QueryType,
    pub qclass: u16, // In practice always 1 (IN), preserved round-trip
}

impl DnsQuestion {
    pub fn new(name: String, qtype: QueryType) -> Self {
        Self {
            name,
            qtype,
            qclass: 1,
        }
    }
}

impl fmt::Display for DnsQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} IN", self.name, self.qtype)
    }
}

/// Type-specific record payload. The unknown case carries only the wire
/// length; its payload is skipped on decode and never re-emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Cname(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Mx {
        preference: u16,
        exchange: String,
    },
    /// Payload was skipped on decode; carries only the wire length.
    Unknown { qtype: u16, rdlength: u16 },
}

impl RData {
    pub fn query_type(&self) -> QueryType {
        match self {
            RData::A(_) => QueryType::A,
            RData::Aaaa(_) => QueryType::Aaaa,
            RData::Ns(_) => QueryType::Ns,
            RData::Cname(_) => QueryType::Cname,
            RData::Soa { .. } => QueryType::Soa,
            RData::Mx { .. } => QueryType::Mx,
            RData::Unknown { qtype, .. } => QueryType::Unknown(*qtype),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnsRecord {
    pub name: String,
    pub class: u16,
    pub ttl: u32,
    pub rdata: RData,
}

impl DnsRecord {
    pub fn qtype(&self) -> QueryType {
        self.rdata.query_type()
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} IN {}", self.name, self.ttl, self.qtype())?;
        match &self.rdata {
            RData::A(addr) => write!(f, " {}", addr),
            RData::Aaaa(addr) => write!(f, " {}", addr),
            RData::Ns(host) | RData::Cname(host) => write!(f, " {}", host),
            RData::Soa { mname, rname, serial, .. } => {
                write!(f, " {} {} {}", mname, rname, serial)
            }
            RData::Mx { preference, exchange } => write!(f, " {} {}", preference, exchange),
            RData::Unknown { rdlength, .. } => write!(f, " ({} octets skipped)", rdlength),
        }
    }
}

/// A whole DNS message: header plus the four record sections. Each packet
/// exclusively owns its sections; records own their names and payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct DnsPacket {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
    pub authorities: Vec<DnsRecord>,
    pub additionals: Vec<DnsRecord>,
}

impl DnsPacket {
    pub fn new() -> Self {
        Self {
            header: DnsHeader::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// A uniformly random A answer, used to pick the next nameserver after a
    /// sub-resolution.
    pub fn random_a(&self) -> Option<Ipv4Addr> {
        let a_records: Vec<Ipv4Addr> = self
            .answers
            .iter()
            .filter_map(|record| match record.rdata {
                RData::A(addr) => Some(addr),
                _ => None,
            })
            .collect();

        a_records.choose(&mut rand::thread_rng()).copied()
    }

    // NS records in the authority section whose owner is a suffix of
    // `qname`, as (owner, nameserver host) pairs. DNS names compare
    // case-insensitively, so both sides are lowercased.
    fn ns_hosts<'a>(&'a self, qname: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
        let qname = qname.to_ascii_lowercase();

        self.authorities.iter().filter_map(move |record| {
            match &record.rdata {
                RData::Ns(host) if qname.ends_with(&record.name.to_ascii_lowercase()) => {
                    Some((record.name.as_str(), host.as_str()))
                }
                _ => None,
            }
        })
    }

    /// Glue path: the address of a referred nameserver whose A record was
    /// shipped in the additional section. Glue matches by name equality.
    pub fn resolved_ns(&self, qname: &str) -> Option<Ipv4Addr> {
        for (_, host) in self.ns_hosts(qname) {
            for record in &self.additionals {
                if let RData::A(addr) = record.rdata {
                    if record.name.eq_ignore_ascii_case(host) {
                        return Some(addr);
                    }
                }
            }
        }

        None
    }

    /// No-glue path: the name of a referred nameserver that still needs its
    /// own resolution.
    pub fn unresolved_ns(&self, qname: &str) -> Option<&str> {
        self.ns_hosts(qname)
            .map(|(_, host)| host)
            .find(|host| !host.is_empty())
    }
}

impl Default for DnsPacket {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referral_packet() -> DnsPacket {
        let mut packet = DnsPacket::new();
        packet.authorities.push(DnsRecord {
            name: "google.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::Ns("ns1.google.com".to_string()),
        });
        packet
    }

    #[test]
    fn test_query_type_num_round_trip() {
        for num in [1u16, 2, 5, 6, 15, 28, 255] {
            assert_eq!(QueryType::from_num(num).to_num(), num);
        }
        assert_eq!(QueryType::from_num(16), QueryType::Unknown(16));
    }

    #[test]
    fn test_result_code_unknown_decodes_as_no_error() {
        assert_eq!(ResultCode::from_num(3), ResultCode::NxDomain);
        assert_eq!(ResultCode::from_num(11), ResultCode::NoError);
    }

    #[test]
    fn test_resolved_ns_uses_glue() {
        let mut packet = referral_packet();
        packet.additionals.push(DnsRecord {
            name: "ns1.google.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::A(Ipv4Addr::new(216, 239, 32, 10)),
        });

        assert_eq!(
            packet.resolved_ns("www.google.com"),
            Some(Ipv4Addr::new(216, 239, 32, 10))
        );
        // The owner is not a suffix of this name.
        assert_eq!(packet.resolved_ns("www.yahoo.com"), None);
    }

    #[test]
    fn test_resolved_ns_ignores_aaaa_glue() {
        let mut packet = referral_packet();
        packet.additionals.push(DnsRecord {
            name: "ns1.google.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::Aaaa(Ipv6Addr::LOCALHOST),
        });

        assert_eq!(packet.resolved_ns("www.google.com"), None);
    }

    #[test]
    fn test_unresolved_ns_names_the_referral() {
        let packet = referral_packet();

        assert_eq!(packet.unresolved_ns("www.google.com"), Some("ns1.google.com"));
        assert_eq!(packet.unresolved_ns("www.yahoo.com"), None);
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let mut packet = DnsPacket::new();
        packet.authorities.push(DnsRecord {
            name: "Google.COM".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::Ns("NS1.google.com".to_string()),
        });
        packet.additionals.push(DnsRecord {
            name: "ns1.Google.com".to_string(),
            class: 1,
            ttl: 172800,
            rdata: RData::A(Ipv4Addr::new(216, 239, 32, 10)),
        });

        assert_eq!(
            packet.resolved_ns("www.google.com"),
            Some(Ipv4Addr::new(216, 239, 32, 10))
        );
    }

    #[test]
    fn test_root_owner_matches_every_name() {
        let mut packet = DnsPacket::new();
        packet.authorities.push(DnsRecord {
            name: String::new(),
            class: 1,
            ttl: 518400,
            rdata: RData::Ns("a.root-servers.net".to_string()),
        });

        assert_eq!(packet.unresolved_ns("example.org"), Some("a.root-servers.net"));
    }

    #[test]
    fn test_random_a_only_picks_a_records() {
        let mut packet = DnsPacket::new();
        assert_eq!(packet.random_a(), None);

        packet.answers.push(DnsRecord {
            name: "ns1.google.com".to_string(),
            class: 1,
            ttl: 300,
            rdata: RData::Cname("alias.google.com".to_string()),
        });
        assert_eq!(packet.random_a(), None);

        packet.answers.push(DnsRecord {
            name: "ns1.google.com".to_string(),
            class: 1,
            ttl: 300,
            rdata: RData::A(Ipv4Addr::new(216, 239, 32, 10)),
        });
        assert_eq!(packet.random_a(), Some(Ipv4Addr::new(216, 239, 32, 10)));
    }
}
