use tokio::sync::oneshot;

use crate::errors::Result;
use crate::protocol::{DnsPacket, QueryType};

/// The ActorMessage enum defines the kind of messages we can send to the actor.
/// By using an enum, we can have many different message types,
/// and each message type can have its own set of arguments.
/// We return a value to the sender by using an oneshot channel,
/// which is a message passing channel that allows sending exactly one message.
#[derive(Debug)]
pub enum QueryActorMessage {
    /// Chase a question down the delegation hierarchy and return the
    /// aggregated response packet.
    Resolve {
        qname: String,
        qtype: QueryType,
        respond_to: oneshot::Sender<Result<DnsPacket>>,
    },
}
