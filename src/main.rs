mod buffer;
mod cli;
mod codec;
mod errors;
mod parsers;
mod processor;
mod protocol;
mod resolver;
mod response_builder;

mod actors;
mod handlers;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, info, Level};

use crate::handlers::query_handler::QueryActorHandle;
use crate::processor::process_dns_query;
use crate::resolver::{Resolver, ROOT_NS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = cli::Args::parse_args();

    let sock = Arc::new(UdpSocket::bind("0.0.0.0:2053").await?);

    // Seed of the delegation chase; a.root-servers.net unless overridden.
    let root = args
        .root()
        .unwrap_or(SocketAddr::new(IpAddr::V4(ROOT_NS), 53));

    let resolver = Resolver::new(root);

    // Create a new actor handle for the query actor.
    let query_actor_handle = QueryActorHandle::new(resolver);

    info!("DNS server listening on 0.0.0.0:2053, chasing from root {}", root);

    let mut buf = [0; 512];

    loop {
        let (len, addr) = sock.recv_from(&mut buf).await?;
        debug!("received {} bytes from {}", len, addr);

        // Each datagram is served on its own task with its own buffers.
        tokio::spawn(process_dns_query(
            buf[..len].to_vec(),
            addr,
            query_actor_handle.clone(),
            Arc::clone(&sock),
        ));
    }
}
