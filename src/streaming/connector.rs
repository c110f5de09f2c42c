use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::streaming::channel::PushChannelFactory;

/// What a running channel task reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Opened,
    /// Raw payload, not yet decoded.
    Message(String),
    /// Terminal: the task exits right after sending this.
    Failed(String),
}

/// Signal stamped with the id of the channel that produced it, so the
/// receiver can drop leftovers from a channel it already closed.
#[derive(Debug, Clone)]
pub struct TaggedSignal {
    pub channel_id: u64,
    pub signal: ChannelSignal,
}

/// Opens a push channel for `address` and pumps it into `tx` until it fails
/// or the returned handle is aborted.
pub fn spawn_channel(
    factory: Arc<dyn PushChannelFactory>,
    address: String,
    channel_id: u64,
    tx: mpsc::UnboundedSender<TaggedSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = |signal| {
            tx.send(TaggedSignal { channel_id, signal }).is_ok()
        };

        log::debug!("[STREAM] channel #{} opening for {}", channel_id, address);
        let mut channel = match factory.open(&address).await {
            Ok(ch) => ch,
            Err(e) => {
                send(ChannelSignal::Failed(e.to_string()));
                return;
            }
        };

        if !send(ChannelSignal::Opened) {
            return;
        }

        loop {
            let signal = match channel.next_message().await {
                Some(Ok(payload)) => ChannelSignal::Message(payload),
                Some(Err(e)) => ChannelSignal::Failed(e.to_string()),
                None => ChannelSignal::Failed("stream closed by server".into()),
            };

            let terminal = matches!(signal, ChannelSignal::Failed(_));
            if !send(signal) || terminal {
                break;
            }
        }

        log::trace!("[STREAM] channel #{} task finished", channel_id);
    })
}
