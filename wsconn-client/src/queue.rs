//! Frame queue between host callbacks and the blocking reader
//!
//! Producers are the `message` and `close` callbacks; the consumer is the
//! single [`Conn`](crate::Conn) that owns the [`FrameQueue`]. At most one
//! end marker is ever enqueued, and frames offered after it are dropped, so
//! the end marker is always the last item the reader sees.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wsconn_core::{CloseEvent, Error, Frame, Result};

/// One entry of the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Frame(Frame),
    End(CloseEvent),
}

/// Producing side, shared by the callbacks and the connection
#[derive(Debug)]
pub(crate) struct Producer {
    tx: Sender<Item>,
    ended: AtomicBool,
}

impl Producer {
    /// Enqueue a received frame, unless the stream already ended
    pub(crate) fn push_frame(&self, frame: Frame) {
        if self.ended.load(Ordering::Acquire) {
            wsconn_core::log_trace!(len = frame.len(), "dropping frame after end of stream");
            return;
        }
        let _ = self.tx.send(Item::Frame(frame));
    }

    /// Enqueue the end marker. Only the first call has an effect; returns
    /// whether this call was it.
    pub(crate) fn end(&self, event: CloseEvent) -> bool {
        if self
            .ended
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        wsconn_core::log_debug!(code = event.code, clean = event.was_clean, "end of stream queued");
        let _ = self.tx.send(Item::End(event));
        true
    }

    /// Whether the end marker has been enqueued
    pub(crate) fn has_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

/// Consuming side
#[derive(Debug)]
pub(crate) struct FrameQueue {
    rx: Receiver<Item>,
}

impl FrameQueue {
    /// Take the next item, honoring an optional deadline.
    ///
    /// With no deadline this blocks until an item arrives. A deadline in the
    /// past turns this into a non-blocking poll.
    pub(crate) fn receive(&self, deadline: Option<Instant>) -> Result<Item> {
        match deadline {
            None => Ok(self.rx.recv().unwrap_or_else(|_| disconnected())),
            Some(deadline) if deadline <= Instant::now() => match self.rx.try_recv() {
                Ok(item) => Ok(item),
                Err(TryRecvError::Empty) => Err(Error::DeadlineExceeded),
                Err(TryRecvError::Disconnected) => Ok(disconnected()),
            },
            Some(deadline) => match self.rx.recv_deadline(deadline) {
                Ok(item) => Ok(item),
                Err(RecvTimeoutError::Timeout) => Err(Error::DeadlineExceeded),
                Err(RecvTimeoutError::Disconnected) => Ok(disconnected()),
            },
        }
    }
}

// Every producer is gone without an end marker; nothing more can arrive.
fn disconnected() -> Item {
    Item::End(CloseEvent::normal())
}

pub(crate) fn frame_queue() -> (Arc<Producer>, FrameQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        Arc::new(Producer {
            tx,
            ended: AtomicBool::new(false),
        }),
        FrameQueue { rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_frames_keep_order_and_end_is_last() {
        let (producer, queue) = frame_queue();
        producer.push_frame(Frame::text("a"));
        producer.push_frame(Frame::text("b"));
        assert!(producer.end(CloseEvent::normal()));
        assert!(!producer.end(CloseEvent::new(1006, "", false)));
        producer.push_frame(Frame::text("late"));

        assert_eq!(queue.receive(None).unwrap(), Item::Frame(Frame::text("a")));
        assert_eq!(queue.receive(None).unwrap(), Item::Frame(Frame::text("b")));
        assert_eq!(queue.receive(None).unwrap(), Item::End(CloseEvent::normal()));
        assert!(matches!(
            queue.receive(Some(Instant::now())),
            Err(Error::DeadlineExceeded)
        ));
    }

    #[test]
    fn test_past_deadline_still_returns_queued_item() {
        let (producer, queue) = frame_queue();
        producer.push_frame(Frame::binary(vec![1u8]));
        let past = Instant::now() - Duration::from_millis(10);
        assert_eq!(
            queue.receive(Some(past)).unwrap(),
            Item::Frame(Frame::binary(vec![1u8]))
        );
        assert!(matches!(queue.receive(Some(past)), Err(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_future_deadline_waits_for_item() {
        let (producer, queue) = frame_queue();
        let pusher = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push_frame(Frame::text("late but in time"));
            producer
        });
        let item = queue
            .receive(Some(Instant::now() + Duration::from_secs(5)))
            .unwrap();
        assert_eq!(item, Item::Frame(Frame::text("late but in time")));
        let producer = pusher.join().unwrap();
        assert!(!producer.has_ended());
    }

    #[test]
    fn test_future_deadline_expires() {
        let (_producer, queue) = frame_queue();
        let deadline = Instant::now() + Duration::from_millis(30);
        assert!(matches!(queue.receive(Some(deadline)), Err(Error::DeadlineExceeded)));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_disconnected_producer_reads_as_end() {
        let (producer, queue) = frame_queue();
        drop(producer);
        assert_eq!(queue.receive(None).unwrap(), Item::End(CloseEvent::normal()));
    }
}
