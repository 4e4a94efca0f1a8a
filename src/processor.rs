use bytes::BytesMut;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::UdpSocket;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, info};

use crate::codec::DnsCodec;
use crate::handlers::query_handler::QueryActorHandle;
use crate::protocol::ResultCode;
use crate::response_builder::DnsResponseBuilder;

// Process one DNS query datagram end to end: decode, resolve, reply.
pub async fn process_dns_query(
    packet_data: Vec<u8>,
    addr: SocketAddr,
    query_handle: QueryActorHandle,
    sock: Arc<UdpSocket>,
) {
    let mut codec = DnsCodec::new();
    let mut bytes_mut = BytesMut::from(&packet_data[..]);

    debug!("received {} bytes from {}", packet_data.len(), addr);

    let request = match codec.decode(&mut bytes_mut) {
        Ok(Some(packet)) => packet,
        Ok(None) => {
            info!("incomplete packet received from {}, ignoring", addr);
            return;
        }
        Err(e) => {
            error!("failed to decode DNS packet from {}: {}", addr, e);
            return;
        }
    };

    debug!(
        target: "chase_dns::packet_details",
        packet_id = request.header.id,
        query_response = if request.header.qr { "Response" } else { "Query" },
        opcode = request.header.opcode,
        recursion_desired = request.header.rd,
        question_count = request.header.qdcount,
        "DNS packet header parsed successfully"
    );

    // Create a new builder for each request (thread-safe)
    let mut dns_response_builder = DnsResponseBuilder::new();
    let mut response_builder = dns_response_builder.build_custom_response(&request);

    // Only single-question packets are served; anything else is answered
    // with a form error carrying no body sections.
    if request.questions.len() == 1 {
        let question = &request.questions[0];
        info!("received query: {}", question);

        match query_handle
            .resolve(question.name.clone(), question.qtype)
            .await
        {
            Ok(result) => {
                info!(
                    "resolved {}: {} answers, rcode {:?}",
                    question.name,
                    result.answers.len(),
                    result.header.rcode
                );

                // The reply carries the upstream rcode and every section the
                // chase aggregated.
                response_builder = response_builder
                    .with_rcode(result.header.rcode)
                    .with_question(question.clone());
                for record in result.answers {
                    response_builder = response_builder.with_answer(record);
                }
                for record in result.authorities {
                    response_builder = response_builder.with_authority(record);
                }
                for record in result.additionals {
                    response_builder = response_builder.with_additional(record);
                }
            }
            Err(e) => {
                error!("could not resolve {}: {}", question.name, e);
                response_builder = response_builder.with_rcode(ResultCode::ServFail);
            }
        }
    } else {
        error!(
            "expected exactly 1 question from {}, got {}",
            addr,
            request.questions.len()
        );
        response_builder = response_builder.with_rcode(ResultCode::FormErr);
    }

    let response_packet = response_builder.build();

    let mut response_buf = BytesMut::new();
    match codec.encode(response_packet, &mut response_buf) {
        Ok(()) => match sock.send_to(&response_buf, addr).await {
            Ok(len) => info!("sent DNS response ({} bytes) to {}", len, addr),
            Err(e) => error!("failed to send DNS response to {}: {}", addr, e),
        },
        Err(e) => error!("failed to encode DNS response for {}: {}", addr, e),
    }
}
