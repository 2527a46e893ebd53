//! Integration tests — the full sender pipeline against the receiver
//! service over real UDP sockets on localhost.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::UdpSocket;

use framecast_core::{
    DispatcherConfig, Dispatcher, EncodedFrame, JpegFrameEncoder, Pacer, PacerConfig,
    ReassemblerConfig, StreamReceiver, TestPatternSource, UdpSink, fragment,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Bind a receiver service on an OS-assigned port; return its address,
/// the frame channel, the stop handle, and the running task.
async fn spawn_receiver(
    staleness_ms: u64,
) -> (
    std::net::SocketAddr,
    tokio::sync::mpsc::Receiver<framecast_core::ReassembledFrame>,
    Arc<std::sync::atomic::AtomicBool>,
    tokio::task::JoinHandle<Result<(), framecast_core::CastError>>,
) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let (receiver, frames) =
        StreamReceiver::new(socket, ReassemblerConfig { staleness_ms }, 65_536).unwrap();
    let stop = receiver.stop_handle();
    let handle = tokio::spawn(receiver.run());
    (addr, frames, stop, handle)
}

// ── End-to-end stream ────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_stream_delivers_jpeg_frames() {
    let (addr, mut frames, recv_stop, recv_handle) = spawn_receiver(500).await;

    // Sender pipeline: pattern source → JPEG → fragment → UDP.
    // A small max_payload forces several chunks per frame.
    let sink = Arc::new(UdpSink::connect(addr).await.unwrap());
    let dispatcher = Dispatcher::spawn(
        DispatcherConfig {
            workers: 3,
            queue_capacity: 16,
            quality: 80,
            max_payload: 1_200,
        },
        Arc::new(JpegFrameEncoder::new()),
        Arc::clone(&sink) as Arc<dyn framecast_core::DatagramSink>,
    )
    .unwrap();

    let source = TestPatternSource::new(160, 120, 600).unwrap();
    let pacer = Pacer::new(
        Box::new(source),
        dispatcher,
        PacerConfig { target_fps: 120 },
    )
    .unwrap();
    let pacer_stop = pacer.stop_handle();
    let pacer_handle = tokio::spawn(pacer.run());

    // Collect a handful of reassembled frames.
    let mut received = Vec::new();
    for _ in 0..5 {
        let frame = tokio::time::timeout(Duration::from_secs(10), frames.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("frame channel closed");
        received.push(frame);
    }

    pacer_stop.store(false, Ordering::SeqCst);
    pacer_handle.await.unwrap().unwrap();

    for frame in &received {
        // Every reassembled payload is a complete JPEG.
        assert!(frame.payload.len() > 4);
        assert_eq!(&frame.payload[..2], &[0xFF, 0xD8]);
        assert_eq!(&frame.payload[frame.payload.len() - 2..], &[0xFF, 0xD9]);
        assert!(frame.timestamp_ms > 0.0);
    }

    // Multi-chunk frames actually went over the wire.
    assert!(sink.datagrams_sent() > received.len() as u64);

    recv_stop.store(false, Ordering::SeqCst);
    let _ = recv_handle.await;
}

// ── Wire-level scenarios ─────────────────────────────────────────

#[tokio::test]
async fn reordered_wire_delivery_reassembles_exactly() {
    let (addr, mut frames, stop, handle) = spawn_receiver(500).await;
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let frame = EncodedFrame {
        frame_id: 17,
        timestamp_ms: 424_242.0,
        data: (0..130_000).map(|i| (i % 253) as u8).collect(),
    };
    let chunks = fragment(&frame, 60_000).unwrap();
    assert_eq!(chunks.len(), 3);

    // Worst-case ordering, plus a duplicate of the middle chunk.
    for index in [2usize, 0, 0, 1] {
        sender
            .send_to(&chunks[index].to_datagram(), addr)
            .await
            .unwrap();
    }

    let received = tokio::time::timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("timeout")
        .expect("channel closed");

    assert_eq!(received.frame_id, 17);
    assert_eq!(received.payload.len(), 130_000);
    assert_eq!(received.payload, frame.data);

    stop.store(false, Ordering::SeqCst);
    let _ = sender.send_to(b"x", addr).await;
    let _ = handle.await;
}

#[tokio::test]
async fn colliding_frame_ids_never_merge() {
    let (addr, mut frames, stop, handle) = spawn_receiver(500).await;
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // Sequences 256 apart: same frame_id, different timestamps.
    let old = EncodedFrame {
        frame_id: 40,
        timestamp_ms: 1_000.0,
        data: vec![0xAA; 4_000],
    };
    let new = EncodedFrame {
        frame_id: 40,
        timestamp_ms: 2_000.0,
        data: vec![0xBB; 4_000],
    };
    let old_chunks = fragment(&old, 2_000).unwrap();
    let new_chunks = fragment(&new, 2_000).unwrap();

    // The old frame loses a chunk; the wrapped frame completes.
    sender
        .send_to(&old_chunks[0].to_datagram(), addr)
        .await
        .unwrap();
    for chunk in &new_chunks {
        sender.send_to(&chunk.to_datagram(), addr).await.unwrap();
    }

    let received = tokio::time::timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("timeout")
        .expect("channel closed");

    // Only the wrapped frame is emitted, with no bytes from the old one.
    assert_eq!(received.timestamp_ms, 2_000.0);
    assert!(received.payload.iter().all(|&b| b == 0xBB));

    stop.store(false, Ordering::SeqCst);
    let _ = sender.send_to(b"x", addr).await;
    let _ = handle.await;
}

#[tokio::test]
async fn incomplete_frame_times_out_and_is_never_delivered() {
    // Tight staleness so the test stays quick.
    let (addr, mut frames, stop, handle) = spawn_receiver(100).await;
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let frame = EncodedFrame {
        frame_id: 9,
        timestamp_ms: 5.0,
        data: vec![1u8; 6_000],
    };
    let chunks = fragment(&frame, 2_000).unwrap();

    // Send all but the last chunk.
    for chunk in &chunks[..2] {
        sender.send_to(&chunk.to_datagram(), addr).await.unwrap();
    }

    // Well past the staleness window nothing has been emitted.
    let outcome = tokio::time::timeout(Duration::from_millis(400), frames.recv()).await;
    assert!(outcome.is_err(), "partial frame must never be delivered");

    // The straggler after eviction starts a new buffer; still no frame.
    sender
        .send_to(&chunks[2].to_datagram(), addr)
        .await
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(200), frames.recv()).await;
    assert!(outcome.is_err());

    stop.store(false, Ordering::SeqCst);
    let _ = sender.send_to(b"x", addr).await;
    let _ = handle.await;
}
