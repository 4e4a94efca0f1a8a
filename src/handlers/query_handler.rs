use tokio::sync::{mpsc, oneshot};

use crate::actors::{messages::QueryActorMessage, query_actor::QueryActor};
use crate::errors::Result;
use crate::protocol::{DnsPacket, QueryType};
use crate::resolver::Resolver;

#[derive(Clone, Debug)]
pub struct QueryActorHandle {
    sender: mpsc::Sender<QueryActorMessage>,
}

// Gives you access to the underlying actor.
impl QueryActorHandle {
    pub fn new(resolver: Resolver) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let mut actor = QueryActor::new(receiver, resolver);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    /// Chases `qname` from the root and returns the aggregated response.
    pub async fn resolve(&self, qname: String, qtype: QueryType) -> Result<DnsPacket> {
        let (send, recv) = oneshot::channel();
        let msg = QueryActorMessage::Resolve {
            qname,
            qtype,
            respond_to: send,
        };

        // Ignore send errors. If this send fails, so does the
        // recv.await below. There's no reason to check the
        // failure twice.
        let _ = self.sender.send(msg).await;

        recv.await.expect("Actor task has been killed")
    }
}
