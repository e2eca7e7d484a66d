use message_channel::{Channel, Mailbox};
use std::sync::Arc;

/// Channel whose reader and writer are the same in-memory queue.
pub(crate) fn loopback_channel<T: Send + 'static>(label: &str) -> (Arc<Mailbox<T>>, Channel<T>) {
    integration_test_utils::init_logging();

    let upstream = Arc::new(Mailbox::new());
    let channel = Channel::with_label(label, upstream.clone(), Some(upstream.clone()));
    (upstream, channel)
}

pub(crate) fn push_all<T>(upstream: &Mailbox<T>, messages: impl IntoIterator<Item = T>) {
    for message in messages {
        upstream.push(message);
    }
}

#[allow(dead_code)]
pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
