//! Iterative delegation chase.
//!
//! Resolution starts at a root nameserver and follows referrals downward:
//! each hop queries one authoritative server and either terminates (answer,
//! NXDOMAIN, dead end) or moves to the next server named by the referral.
//! When a referral ships glue, the next address is taken from the additional
//! section; otherwise the referred nameserver's own name is chased first
//! through a nested resolution.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::time::Duration;

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::buffer::PACKET_SIZE;
use crate::codec::DnsCodec;
use crate::errors::{DnsError, Result};
use crate::protocol::{DnsPacket, DnsQuestion, QueryType, ResultCode};

/// a.root-servers.net, the default seed for the delegation chase.
pub const ROOT_NS: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);

/// Authoritative servers answer on the standard DNS port.
const NS_PORT: u16 = 53;

/// Per-hop UDP receive timeout; a silent server fails the whole attempt.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Delegation hops allowed within one chase.
const MAX_HOPS: usize = 10;

/// Nested nameserver sub-resolutions allowed per client query.
const MAX_SUB_RESOLUTIONS: usize = 16;

#[derive(Debug, Clone)]
pub struct Resolver {
    root: SocketAddr,
}

impl Resolver {
    pub fn new(root: SocketAddr) -> Self {
        Self { root }
    }

    /// Resolves `qname` by walking the delegation hierarchy from the root
    /// until an answer, an NXDOMAIN, or a dead end is reached.
    pub async fn resolve(&self, qname: &str, qtype: QueryType) -> Result<DnsPacket> {
        self.resolve_at_depth(qname.to_string(), qtype, 0).await
    }

    // Boxed so the no-glue path can recurse into a chase for the referred
    // nameserver's own address.
    fn resolve_at_depth(
        &self,
        qname: String,
        qtype: QueryType,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<DnsPacket>> + Send + '_>> {
        Box::pin(async move {
            if depth > MAX_SUB_RESOLUTIONS {
                return Err(DnsError::BudgetExhausted);
            }

            let mut ns = self.root;

            for _ in 0..MAX_HOPS {
                debug!("attempting lookup of {} {} with ns {}", qtype, qname, ns);

                let response = self.lookup(&qname, qtype, ns).await?;

                // An answered query or a definitive NXDOMAIN ends the chase.
                if !response.answers.is_empty() && response.header.rcode == ResultCode::NoError {
                    return Ok(response);
                }

                if response.header.rcode == ResultCode::NxDomain {
                    debug!("domain {} not found", qname);
                    return Ok(response);
                }

                // Referral with glue: the next server's address came along
                // in the additional section.
                if let Some(addr) = response.resolved_ns(&qname) {
                    ns = SocketAddr::new(IpAddr::V4(addr), NS_PORT);
                    continue;
                }

                // Referral without glue: resolve the nameserver's own name,
                // then continue the chase from whatever address comes back.
                // A-only; IPv6-only delegations dead-end here.
                let host = match response.unresolved_ns(&qname) {
                    Some(host) => host.to_string(),
                    None => {
                        debug!("no new nameservers to traverse for {}", qname);
                        return Ok(response);
                    }
                };

                let recursive = self.resolve_at_depth(host, QueryType::A, depth + 1).await?;

                match recursive.random_a() {
                    Some(addr) => ns = SocketAddr::new(IpAddr::V4(addr), NS_PORT),
                    None => return Ok(response),
                }
            }

            Err(DnsError::BudgetExhausted)
        })
    }

    /// One query/response exchange with a single nameserver over a fresh
    /// unconnected UDP socket.
    async fn lookup(&self, qname: &str, qtype: QueryType, server: SocketAddr) -> Result<DnsPacket> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;

        let mut packet = DnsPacket::new();
        packet.header.id = rand::random::<u16>();
        // Informational only; authoritative servers ignore it.
        packet.header.rd = true;
        packet
            .questions
            .push(DnsQuestion::new(qname.to_string(), qtype));

        let mut codec = DnsCodec::new();
        let mut request = BytesMut::new();
        codec.encode(packet, &mut request)?;

        socket.send_to(&request, server).await?;

        let mut buf = [0u8; PACKET_SIZE];
        let (len, _) = timeout(LOOKUP_TIMEOUT, socket.recv_from(&mut buf))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no response from {} within {:?}", server, LOOKUP_TIMEOUT),
                )
            })??;

        let mut response = BytesMut::from(&buf[..len]);
        codec.decode(&mut response)?.ok_or_else(|| {
            DnsError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short dns response from {}", server),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DnsRecord, RData};

    // One-shot nameserver on a loopback port that answers a single query
    // with whatever `reply` builds from it.
    async fn spawn_mock_ns<F>(reply: F) -> SocketAddr
    where
        F: Fn(DnsPacket) -> DnsPacket + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut codec = DnsCodec::new();
            let mut buf = [0u8; PACKET_SIZE];

            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let mut bytes = BytesMut::from(&buf[..len]);
            let query = codec.decode(&mut bytes).unwrap().unwrap();

            let mut out = BytesMut::new();
            codec.encode(reply(query), &mut out).unwrap();
            socket.send_to(&out, peer).await.unwrap();
        });

        addr
    }

    fn response_to(query: &DnsPacket) -> DnsPacket {
        let mut response = DnsPacket::new();
        response.header.id = query.header.id;
        response.header.qr = true;
        response.questions = query.questions.clone();
        response
    }

    #[tokio::test]
    async fn test_resolve_returns_first_hop_answer() {
        let root = spawn_mock_ns(|query| {
            let mut response = response_to(&query);
            response.answers.push(DnsRecord {
                name: "example.com".to_string(),
                class: 1,
                ttl: 300,
                rdata: RData::A(Ipv4Addr::new(93, 184, 216, 34)),
            });
            response
        })
        .await;

        let resolver = Resolver::new(root);
        let packet = resolver.resolve("example.com", QueryType::A).await.unwrap();

        assert_eq!(packet.header.rcode, ResultCode::NoError);
        assert_eq!(packet.answers.len(), 1);
        assert_eq!(
            packet.answers[0].rdata,
            RData::A(Ipv4Addr::new(93, 184, 216, 34))
        );
    }

    #[tokio::test]
    async fn test_resolve_surfaces_nxdomain() {
        let root = spawn_mock_ns(|query| {
            let mut response = response_to(&query);
            response.header.rcode = ResultCode::NxDomain;
            response
        })
        .await;

        let resolver = Resolver::new(root);
        let packet = resolver
            .resolve("no-such-name.example", QueryType::A)
            .await
            .unwrap();

        assert_eq!(packet.header.rcode, ResultCode::NxDomain);
        assert!(packet.answers.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_dead_end_referral_is_best_effort() {
        // No answers and no NS records to follow: the chase returns the
        // response it has instead of erroring.
        let root = spawn_mock_ns(|query| response_to(&query)).await;

        let resolver = Resolver::new(root);
        let packet = resolver.resolve("example.com", QueryType::A).await.unwrap();

        assert_eq!(packet.header.rcode, ResultCode::NoError);
        assert!(packet.answers.is_empty());
        assert!(packet.authorities.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_times_out_on_silent_server() {
        // Bound but never reads; the per-hop timeout must fire.
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let _keep_alive = socket;

        let resolver = Resolver::new(addr);
        let err = resolver
            .resolve("example.com", QueryType::A)
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::Io(_)));
    }
}
