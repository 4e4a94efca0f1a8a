//! Decode side of the DNS wire format.
//!
//! Every function reads from a [`PacketBuffer`] positioned at the field it
//! parses and leaves the cursor just past it. Compressed names may send the
//! name codec jumping backwards into the datagram; the cursor still only
//! moves forward across a whole-packet parse. Each failure names the field
//! that produced it.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::PacketBuffer;
use crate::errors::{Context, Result};
use crate::protocol::{
    DnsHeader, DnsPacket, DnsQuestion, DnsRecord, QueryType, RData, ResultCode,
};

pub fn parse_header(buf: &mut PacketBuffer) -> Result<DnsHeader> {
    let mut header = DnsHeader::new();

    header.id = buf.read_u16().context("reading the header id")?;

    let flags = buf.read_u16().context("reading the header flags")?;
    let a = (flags >> 8) as u8;
    let b = (flags & 0xFF) as u8;

    header.rd = (a & (1 << 0)) > 0;
    header.tc = (a & (1 << 1)) > 0;
    header.aa = (a & (1 << 2)) > 0;
    header.opcode = (a >> 3) & 0x0F;
    header.qr = (a & (1 << 7)) > 0;

    header.rcode = ResultCode::from_num(b & 0x0F);
    header.cd = (b & (1 << 4)) > 0;
    header.ad = (b & (1 << 5)) > 0;
    header.z = (b & (1 << 6)) > 0;
    header.ra = (b & (1 << 7)) > 0;

    header.qdcount = buf.read_u16().context("reading header question count")?;
    header.ancount = buf.read_u16().context("reading header answer count")?;
    header.nscount = buf.read_u16().context("reading header authority count")?;
    header.arcount = buf.read_u16().context("reading header additional count")?;

    Ok(header)
}

pub fn parse_question(buf: &mut PacketBuffer) -> Result<DnsQuestion> {
    let mut name = String::new();
    buf.read_qname(&mut name).context("reading dns question name")?;

    let qtype = buf.read_u16().context("reading dns question query type")?;
    let qclass = buf.read_u16().context("reading dns question query class")?;

    Ok(DnsQuestion {
        name,
        qtype: QueryType::from_num(qtype),
        qclass,
    })
}

pub fn parse_record(buf: &mut PacketBuffer) -> Result<DnsRecord> {
    let mut name = String::new();
    buf.read_qname(&mut name).context("reading dns record domain name")?;

    let qtype_num = buf.read_u16().context("reading dns record query type")?;
    let class = buf.read_u16().context("reading dns record class")?;
    let ttl = buf.read_u32().context("reading dns record ttl")?;
    let rdlength = buf.read_u16().context("reading dns record rdlength")?;

    let rdata = match QueryType::from_num(qtype_num) {
        QueryType::A => {
            let raw = buf.read_u32().context("reading dns record ip address")?;
            RData::A(Ipv4Addr::from(raw))
        }
        QueryType::Aaaa => {
            let mut raw: u128 = 0;
            for _ in 0..4 {
                let quad = buf.read_u32().context("reading dns record ipv6 address")?;
                raw = raw << 32 | quad as u128;
            }
            RData::Aaaa(Ipv6Addr::from(raw))
        }
        QueryType::Ns => {
            let mut host = String::new();
            buf.read_qname(&mut host).context("reading dns record nameserver")?;
            RData::Ns(host)
        }
        QueryType::Cname => {
            let mut host = String::new();
            buf.read_qname(&mut host).context("reading dns record cname host")?;
            RData::Cname(host)
        }
        QueryType::Soa => {
            let mut mname = String::new();
            buf.read_qname(&mut mname).context("reading dns record soa mname")?;

            let mut rname = String::new();
            buf.read_qname(&mut rname).context("reading dns record soa rname")?;

            RData::Soa {
                mname,
                rname,
                serial: buf.read_u32().context("reading dns record soa serial")?,
                refresh: buf.read_u32().context("reading dns record soa refresh")?,
                retry: buf.read_u32().context("reading dns record soa retry")?,
                expire: buf.read_u32().context("reading dns record soa expire")?,
                minimum: buf.read_u32().context("reading dns record soa minimum")?,
            }
        }
        QueryType::Mx => {
            let preference = buf.read_u16().context("reading mail server preference")?;

            let mut exchange = String::new();
            buf.read_qname(&mut exchange).context("reading mail server name")?;

            RData::Mx {
                preference,
                exchange,
            }
        }
        QueryType::Unknown(qtype) => {
            // Payload shape is unknown; skip it wholesale.
            buf.advance(rdlength as usize);
            RData::Unknown { qtype, rdlength }
        }
    };

    Ok(DnsRecord {
        name,
        class,
        ttl,
        rdata,
    })
}

/// Reads a whole message: header, then as many questions and records as the
/// header counts claim, section by section.
pub fn parse_packet(buf: &mut PacketBuffer) -> Result<DnsPacket> {
    let mut packet = DnsPacket::new();

    packet.header = parse_header(buf).context("reading header")?;

    for _ in 0..packet.header.qdcount {
        let question = parse_question(buf).context("reading dns question")?;
        packet.questions.push(question);
    }

    for _ in 0..packet.header.ancount {
        let record = parse_record(buf).context("reading dns record answers")?;
        packet.answers.push(record);
    }

    for _ in 0..packet.header.nscount {
        let record = parse_record(buf).context("reading dns record authorities")?;
        packet.authorities.push(record);
    }

    for _ in 0..packet.header.arcount {
        let record = parse_record(buf).context("reading dns record additionals")?;
        packet.additionals.push(record);
    }

    Ok(packet)
}
