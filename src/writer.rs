//! Dedicated writer task for outbound frames.
//!
//! Every producer (typed calls, handler responses, the heartbeat ticker) sends frames through
//! an mpsc channel to one task that owns the write half of the stream. Frames therefore never
//! interleave on the wire, and whatever is queued when the task wakes up is written with a
//! single vectored write.
//!
//! ```text
//! ConnectionHandle ─┐
//! Request::respond ─┼─► mpsc::Sender<OutboundFrame> ─► writer task ─► stream
//! heartbeat ticker ─┘
//! ```

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{ClusterwireError, Result};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum frames to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 64;

/// A frame ready to be written.
///
/// `head` holds the encoded header plus any fixed fields; `payload` is an optional
/// variable-length tail kept as a separate buffer so it is never copied.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub head: Bytes,
    pub payload: Bytes,
}

impl OutboundFrame {
    #[inline]
    pub fn new(head: Bytes, payload: Bytes) -> Self {
        Self { head, payload }
    }

    /// Wrap a fully encoded control frame.
    #[inline]
    pub fn control(bytes: Bytes) -> Self {
        Self {
            head: bytes,
            payload: Bytes::new(),
        }
    }

    /// Total size of this frame on the wire.
    #[inline]
    pub fn size(&self) -> usize {
        self.head.len() + self.payload.len()
    }

    /// Contiguous copy of the frame.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.head);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Channel capacity for the frame queue. Senders wait when it is full.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for sending frames to the writer task.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Queue a frame, waiting for channel capacity.
    ///
    /// Fails with `ConnectionClosed` once the writer task has stopped.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ClusterwireError::ConnectionClosed)
    }

    /// Check whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// The task ends cleanly when every handle has been dropped, or with an error when the
/// stream fails.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundFrame>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);

    while let Some(first) = rx.recv().await {
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        trace!(frames = batch.len(), "Writing batch");
        write_batch(&mut writer, &batch).await?;
        batch.clear();
    }

    debug!("Writer channel closed, shutting down stream");
    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "Stream shutdown failed");
    }
    Ok(())
}

/// Write a batch of frames using scatter/gather I/O.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size: usize = batch.iter().map(OutboundFrame::size).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(batch, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(ClusterwireError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Build the IoSlice array for everything after the first `skip_bytes` bytes of the batch.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len() * 2);
    let mut offset = 0;

    for frame in batch {
        for part in [&frame.head, &frame.payload] {
            let end = offset + part.len();
            if !part.is_empty() && skip_bytes < end {
                let start = skip_bytes.saturating_sub(offset);
                slices.push(IoSlice::new(&part[start..]));
            }
            offset = end;
        }
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{encode_data, encode_disconnect_req, encode_heartbeat_req};
    use crate::protocol::{FrameBuffer, SessionKind};
    use std::io::Cursor;
    use tokio::io::{duplex, AsyncReadExt};

    fn data(payload: &'static [u8]) -> OutboundFrame {
        encode_data(false, 3, 0, 1, 2, Bytes::from_static(payload)).unwrap()
    }

    #[test]
    fn test_outbound_frame_size() {
        let frame = data(b"hello");
        assert_eq!(frame.size(), 35);
        assert_eq!(frame.to_vec().len(), 35);

        let control = OutboundFrame::control(encode_heartbeat_req(1));
        assert!(control.payload.is_empty());
        assert_eq!(control.size(), 14);
    }

    #[test]
    fn test_build_remaining_slices_no_skip() {
        let batch = vec![data(b"hello")];
        let slices = build_remaining_slices(&batch, 0);
        assert_eq!(slices.len(), 2);
    }

    #[test]
    fn test_build_remaining_slices_partial_head() {
        let batch = vec![data(b"hello")];
        let slices = build_remaining_slices(&batch, 5);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].len(), 25);
        assert_eq!(slices[1].len(), 5);
    }

    #[test]
    fn test_build_remaining_slices_across_frames() {
        let batch = vec![
            OutboundFrame::control(encode_heartbeat_req(1)),
            data(b"hello"),
        ];

        let slices = build_remaining_slices(&batch, 14 + 30 + 2);
        assert_eq!(slices.len(), 1);
        assert_eq!(&*slices[0], b"llo");
    }

    #[tokio::test]
    async fn test_write_batch_preserves_order() {
        let mut buf = Cursor::new(Vec::new());
        let batch = vec![
            OutboundFrame::control(encode_heartbeat_req(1)),
            OutboundFrame::control(encode_disconnect_req(2, SessionKind::Conn, 3, true)),
            data(b"abc"),
        ];

        write_batch(&mut buf, &batch).await.unwrap();

        let written = buf.into_inner();
        let mut expected = Vec::new();
        for frame in &batch {
            expected.extend(frame.to_vec());
        }
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn test_writer_task_frames_are_isolated_by_reader() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task(client, WriterConfig::default());

        for seq in 1..=10u64 {
            handle
                .send(OutboundFrame::control(encode_heartbeat_req(seq)))
                .await
                .unwrap();
        }

        let mut buffer = FrameBuffer::new();
        let mut spans = Vec::new();
        let mut buf = vec![0u8; 1024];
        while spans.len() < 10 {
            let n = server.read(&mut buf).await.unwrap();
            spans.extend(buffer.push(&buf[..n]).unwrap());
        }

        assert_eq!(spans.len(), 10);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_writer_shutdown_on_channel_close() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task(client, WriterConfig::default());

        drop(handle);

        let result = task.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_after_writer_stopped() {
        let (client, server) = duplex(64);
        drop(server);
        let (handle, task) = spawn_writer_task(client, WriterConfig::default());

        // First write fails on the broken stream and stops the task
        let _ = handle
            .send(OutboundFrame::control(encode_heartbeat_req(1)))
            .await;
        assert!(task.await.unwrap().is_err());

        assert!(handle.is_closed());
        assert!(matches!(
            handle
                .send(OutboundFrame::control(encode_heartbeat_req(2)))
                .await,
            Err(ClusterwireError::ConnectionClosed)
        ));
    }

    /// Accepts writes but refuses to shut down.
    struct NoShutdown;

    impl AsyncWrite for NoShutdown {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::NotConnected.into()))
        }
    }

    #[tokio::test]
    async fn test_failed_shutdown_still_ends_cleanly() {
        let (handle, task) = spawn_writer_task(NoShutdown, WriterConfig::default());
        handle
            .send(OutboundFrame::control(encode_heartbeat_req(1)))
            .await
            .unwrap();
        drop(handle);

        assert!(task.await.unwrap().is_ok());
    }
}
