//! Send and receive loops. Each runs on its own thread for the lifetime of
//! one connection.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shepherd_core::{BlockingDeque, ConnectionSignals};

use super::Counters;
use crate::codec::{encode_frame_into, FrameDecoder};
use crate::message::Message;

/// Pops messages and writes them as frames until the sentinel arrives or a
/// write fails. Clears the outgoing queue on exit.
pub(super) fn send_loop(mut stream: TcpStream, outgoing: &BlockingDeque<Message>, counters: &Counters) {
    let mut frame = Vec::new();

    loop {
        let Some(payload) = outgoing.pop_front().into_payload() else {
            tracing::debug!("Send loop reached the end sentinel");
            break;
        };

        frame.clear();
        if let Err(e) = encode_frame_into(&payload, &mut frame) {
            counters.send_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Dropping outgoing message: {}", e);
            continue;
        }

        if let Err(e) = stream.write_all(&frame) {
            counters.send_errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Send loop write failed: {}", e);
            // Wakes the receive loop, which reports the loss.
            let _ = stream.shutdown(Shutdown::Both);
            break;
        }

        counters.messages_sent.fetch_add(1, Ordering::Relaxed);
        counters.bytes_sent.fetch_add(frame.len() as u64, Ordering::Relaxed);
        tracing::debug!("Sent {} byte message", payload.len());
    }

    outgoing.clear();
}

/// Everything the receive loop shares with the transport.
pub(super) struct ReceiveContext {
    pub(super) incoming: Arc<BlockingDeque<Message>>,
    pub(super) outgoing: Arc<BlockingDeque<Message>>,
    pub(super) signals: Arc<ConnectionSignals>,
    pub(super) counters: Arc<Counters>,
    pub(super) closing: Arc<AtomicBool>,
    pub(super) buffer_size: usize,
    pub(super) max_message_size: u32,
}

/// Reads, decodes and queues frames until the stream ends.
///
/// A peer-caused end raises the connection-lost signal and stops the send
/// loop; an end caused by a local disconnect does neither.
pub(super) fn receive_loop(mut stream: TcpStream, ctx: &ReceiveContext) {
    let mut scratch = vec![0u8; ctx.buffer_size];
    let mut decoder = FrameDecoder::with_max_message_size(ctx.max_message_size);

    let cause = loop {
        let read = match stream.read(&mut scratch) {
            Ok(0) => break "end of stream".to_owned(),
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                ctx.counters.recv_errors.fetch_add(1, Ordering::Relaxed);
                break format!("read failed: {e}");
            }
        };
        ctx.counters.bytes_received.fetch_add(read as u64, Ordering::Relaxed);
        decoder.push(&scratch[..read]);

        if let Err(e) = drain_frames(&mut decoder, ctx) {
            ctx.counters.recv_errors.fetch_add(1, Ordering::Relaxed);
            break e.to_string();
        }
    };

    if ctx.closing.load(Ordering::Acquire) {
        tracing::debug!("Receive loop stopped ({})", cause);
        return;
    }

    tracing::warn!("Connection lost: {}", cause);
    ctx.signals.raise_lost();
    ctx.outgoing.push_front(Message::end());
}

fn drain_frames(decoder: &mut FrameDecoder, ctx: &ReceiveContext) -> Result<(), crate::codec::FrameError> {
    while let Some(payload) = decoder.next_frame()? {
        tracing::debug!("Received {} byte message", payload.len());
        ctx.counters.messages_received.fetch_add(1, Ordering::Relaxed);
        ctx.incoming.push_back(Message::new(payload));
    }
    Ok(())
}
