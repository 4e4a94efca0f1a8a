use tokio::sync::mpsc;
use tracing::error;

use crate::actors::messages::QueryActorMessage;
use crate::resolver::Resolver;

/// Resolves DNS queries by acting as an actor that processes incoming messages
pub struct QueryActor {
    // The receiver for incoming messages
    receiver: mpsc::Receiver<QueryActorMessage>,
    // The iterative engine used to chase delegations
    resolver: Resolver,
}

impl QueryActor {
    // Constructor for the actor
    pub fn new(receiver: mpsc::Receiver<QueryActorMessage>, resolver: Resolver) -> Self {
        Self { receiver, resolver }
    }

    // Run the actor. Messages are handled one at a time, so at most one
    // resolution is ever in flight.
    pub async fn run(&mut self) {
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }
    }

    // Handle a message
    async fn handle_message(&self, msg: QueryActorMessage) {
        match msg {
            QueryActorMessage::Resolve {
                qname,
                qtype,
                respond_to,
            } => {
                let result = self.resolver.resolve(&qname, qtype).await;

                if let Err(e) = &result {
                    error!("DNS lookup failed for {} {}: {}", qname, qtype, e);
                }

                // The requester may have gone away; nothing to do then.
                let _ = respond_to.send(result);
            }
        }
    }
}
