//! DNS packet codec for tokio_util
//!
//! This module provides Decoder and Encoder implementations for DNS packets,
//! allowing integration with tokio's framed streams and UDP handling. Both
//! directions stage the datagram through the fixed 512-octet [`PacketBuffer`]:
//! decoding hands the buffer to the parsers, encoding emits sections into it
//! and copies the written prefix out.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::buffer::{PacketBuffer, PACKET_SIZE};
use crate::errors::{DnsError, Result};
use crate::parsers::parse_packet;
use crate::protocol::{DnsHeader, DnsPacket, DnsQuestion, DnsRecord, RData};

/// DNS packet codec for use with tokio_util framed streams
#[derive(Debug, Default)]
pub struct DnsCodec;

impl DnsCodec {
    /// Create a new DNS codec instance
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for DnsCodec {
    type Item = DnsPacket;
    type Error = DnsError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        // DNS packets need at least 12 bytes for the header
        if src.len() < 12 {
            debug!("insufficient bytes for DNS header: {} < 12", src.len());
            return Ok(None);
        }

        // UDP datagrams arrive whole; anything past the RFC 1035 limit is
        // not part of a valid message and is left untouched.
        let len = src.len().min(PACKET_SIZE);
        let mut buf = PacketBuffer::new();
        buf.buf[..len].copy_from_slice(&src[..len]);

        let packet = parse_packet(&mut buf)?;

        let consumed = buf.pos().min(src.len());
        let _ = src.split_to(consumed);

        Ok(Some(packet))
    }
}

impl Encoder<DnsPacket> for DnsCodec {
    type Error = DnsError;

    fn encode(&mut self, mut item: DnsPacket, dst: &mut BytesMut) -> Result<()> {
        let mut buf = PacketBuffer::new();
        self.encode_packet(&mut item, &mut buf)?;

        dst.reserve(buf.pos());
        dst.put_slice(buf.filled());

        Ok(())
    }
}

impl DnsCodec {
    /// Encode a whole message. Header counts are bound to the actual section
    /// lengths immediately before the header is emitted.
    fn encode_packet(&self, packet: &mut DnsPacket, buf: &mut PacketBuffer) -> Result<()> {
        packet.header.qdcount = packet.questions.len() as u16;
        packet.header.ancount = packet.answers.len() as u16;
        packet.header.nscount = packet.authorities.len() as u16;
        packet.header.arcount = packet.additionals.len() as u16;

        self.encode_header(&packet.header, buf)?;

        for question in &packet.questions {
            self.encode_question(question, buf)?;
        }
        for record in &packet.answers {
            self.encode_record(record, buf)?;
        }
        for record in &packet.authorities {
            self.encode_record(record, buf)?;
        }
        for record in &packet.additionals {
            self.encode_record(record, buf)?;
        }

        Ok(())
    }

    /// Pack the 12-byte header. Flag bits follow the RFC 1035 layout, low
    /// bit first within each flag byte.
    fn encode_header(&self, header: &DnsHeader, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_u16(header.id)?;

        buf.write_u8(
            header.rd as u8
                | (header.tc as u8) << 1
                | (header.aa as u8) << 2
                | (header.opcode & 0x0F) << 3
                | (header.qr as u8) << 7,
        )?;
        buf.write_u8(
            header.rcode.to_num()
                | (header.cd as u8) << 4
                | (header.ad as u8) << 5
                | (header.z as u8) << 6
                | (header.ra as u8) << 7,
        )?;

        buf.write_u16(header.qdcount)?;
        buf.write_u16(header.ancount)?;
        buf.write_u16(header.nscount)?;
        buf.write_u16(header.arcount)?;

        Ok(())
    }

    fn encode_question(&self, question: &DnsQuestion, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_qname(&question.name)?;
        buf.write_u16(question.qtype.to_num())?;
        buf.write_u16(question.qclass)?;

        Ok(())
    }

    /// Encode one resource record. Variable-length payloads get a
    /// placeholder RDLENGTH that is back-patched once the payload size is
    /// known; fixed-length payloads write it literally.
    fn encode_record(&self, record: &DnsRecord, buf: &mut PacketBuffer) -> Result<()> {
        if let RData::Unknown { .. } = record.rdata {
            // The payload was skipped on decode, there is nothing to emit.
            debug!("skipping unknown record: {}", record);
            return Ok(());
        }

        buf.write_qname(&record.name)?;
        buf.write_u16(record.qtype().to_num())?;
        buf.write_u16(record.class)?;
        buf.write_u32(record.ttl)?;

        match &record.rdata {
            RData::A(addr) => {
                buf.write_u16(4)?;
                for octet in addr.octets() {
                    buf.write_u8(octet)?;
                }
            }
            RData::Aaaa(addr) => {
                buf.write_u16(16)?;
                for octet in addr.octets() {
                    buf.write_u8(octet)?;
                }
            }
            RData::Ns(host) | RData::Cname(host) => {
                let rdlength_pos = buf.pos();
                buf.write_u16(0)?;

                buf.write_qname(host)?;

                buf.set_u16(rdlength_pos, (buf.pos() - (rdlength_pos + 2)) as u16)?;
            }
            RData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                let rdlength_pos = buf.pos();
                buf.write_u16(0)?;

                buf.write_qname(mname)?;
                buf.write_qname(rname)?;
                buf.write_u32(*serial)?;
                buf.write_u32(*refresh)?;
                buf.write_u32(*retry)?;
                buf.write_u32(*expire)?;
                buf.write_u32(*minimum)?;

                buf.set_u16(rdlength_pos, (buf.pos() - (rdlength_pos + 2)) as u16)?;
            }
            RData::Mx {
                preference,
                exchange,
            } => {
                let rdlength_pos = buf.pos();
                buf.write_u16(0)?;

                buf.write_u16(*preference)?;
                buf.write_qname(exchange)?;

                buf.set_u16(rdlength_pos, (buf.pos() - (rdlength_pos + 2)) as u16)?;
            }
            RData::Unknown { .. } => unreachable!("unknown records are dropped before emission"),
        }

        Ok(())
    }
}
