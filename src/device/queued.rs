//! Asynchronous device backend: a queue in front of a worker task.
//!
//! ```text
//! MonoSink ──submit (try_send)──▶ block queue ──▶ worker task ──play().await──▶ device
//!    ▲                                                  │
//!    └────────── free buffer ring (lock-free) ◀─────────┘
//! ```
//!
//! Block buffers are owned by exactly one side at a time. The sink copies a
//! block into a free buffer and hands it over; the worker gives the buffer
//! back only after the device has finished with it. The producer never
//! awaits anything: when no buffer is free, `submit` reports
//! [`DeviceError::Busy`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use super::{Block, MemoryDevice, PlaybackDevice};
use crate::{DeviceError, OutputChannel, QueueConfig, SinkError};

/// A playback device driven from an async worker task.
///
/// Implement this for hardware whose submit call may wait (network
/// speakers, DMA drivers with completion futures) and wrap it in a
/// [`QueuedDevice`].
#[async_trait]
pub trait AsyncPlaybackDevice: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Plays one block. The worker bounds this call with the queue's
    /// submit timeout.
    async fn play(&mut self, block: &Block<'_>) -> Result<(), DeviceError>;

    /// Called once after the queue has been drained during shutdown.
    ///
    /// Default implementation does nothing.
    async fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[async_trait]
impl AsyncPlaybackDevice for MemoryDevice {
    fn name(&self) -> &str {
        PlaybackDevice::name(self)
    }

    async fn play(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        PlaybackDevice::submit(self, block)
    }
}

/// Counters kept by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Blocks the device accepted.
    pub played: u64,
    /// Blocks the device rejected.
    pub failed: u64,
    /// Blocks abandoned after the submit timeout.
    pub timed_out: u64,
}

#[derive(Default)]
struct QueueCounters {
    played: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl QueueCounters {
    fn snapshot(&self) -> QueueStats {
        QueueStats {
            played: self.played.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            timed_out: self.timed_out.load(Ordering::SeqCst),
        }
    }
}

/// A block that has left the sink and is owned by the queue.
struct QueuedBlock {
    samples: Vec<i16>,
    sample_rate: u32,
    channel: OutputChannel,
    stereo: bool,
    repeat: u32,
    stop_current: bool,
}

impl QueuedBlock {
    fn as_block(&self) -> Block<'_> {
        Block {
            samples: &self.samples,
            sample_rate: self.sample_rate,
            channel: self.channel,
            stereo: self.stereo,
            repeat: self.repeat,
            stop_current: self.stop_current,
        }
    }
}

/// A [`PlaybackDevice`] that forwards blocks to an [`AsyncPlaybackDevice`]
/// running on a tokio task.
///
/// # Example
///
/// ```
/// use speaker_sink::device::QueuedDevice;
/// use speaker_sink::{FrameSink, MemoryDevice, MonoSink, QueueConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let speaker = MemoryDevice::new();
/// let mut queued = QueuedDevice::spawn(speaker.clone(), QueueConfig::default())?;
///
/// {
///     let mut sink = MonoSink::builder(&mut queued).build()?;
///     sink.consume(1000, 1000);
///     sink.stop();
/// }
///
/// let stats = queued.shutdown().await?;
/// assert_eq!(stats.played, 1);
/// assert_eq!(speaker.block_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct QueuedDevice {
    name: String,
    block_tx: mpsc::Sender<QueuedBlock>,
    free: ringbuf::HeapCons<Vec<i16>>,
    spare: Option<Vec<i16>>,
    counters: Arc<QueueCounters>,
    worker: JoinHandle<()>,
}

impl QueuedDevice {
    /// Starts a worker task for `device` on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::NoRuntime`] when called outside a tokio runtime.
    pub fn spawn<A>(device: A, config: QueueConfig) -> Result<Self, SinkError>
    where
        A: AsyncPlaybackDevice + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SinkError::NoRuntime)?;

        let depth = config.effective_depth();
        let (block_tx, block_rx) = mpsc::channel(depth);
        let (mut free_tx, free) = HeapRb::<Vec<i16>>::new(depth).split();
        for _ in 0..depth {
            let _ = free_tx.try_push(Vec::with_capacity(config.block_capacity));
        }

        let name = format!("queued:{}", device.name());
        let counters = Arc::new(QueueCounters::default());

        tracing::debug!(
            "{}: starting worker (depth {}, timeout {:?})",
            name,
            depth,
            config.submit_timeout
        );

        let worker = runtime.spawn(run_worker(
            device,
            block_rx,
            free_tx,
            config.submit_timeout,
            Arc::clone(&counters),
        ));

        Ok(Self {
            name,
            block_tx,
            free,
            spare: None,
            counters,
            worker,
        })
    }

    /// Number of block buffers currently available to the producer.
    pub fn free_buffers(&self) -> usize {
        self.free.occupied_len() + usize::from(self.spare.is_some())
    }

    /// Current worker counters.
    pub fn stats(&self) -> QueueStats {
        self.counters.snapshot()
    }

    /// Closes the queue, waits for queued blocks to be played, and closes
    /// the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker task panicked.
    pub async fn shutdown(self) -> Result<QueueStats, DeviceError> {
        let Self {
            name,
            block_tx,
            counters,
            worker,
            ..
        } = self;

        // Worker exits once the queue is closed and drained
        drop(block_tx);
        worker
            .await
            .map_err(|e| DeviceError::custom(format!("{name}: worker task failed: {e}")))?;

        let stats = counters.snapshot();
        tracing::debug!("{}: shut down ({:?})", name, stats);
        Ok(stats)
    }
}

impl PlaybackDevice for QueuedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        !self.block_tx.is_closed()
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        let Some(mut samples) = self.spare.take().or_else(|| self.free.try_pop()) else {
            return Err(DeviceError::Busy);
        };

        // Buffers are preallocated, so this only copies
        samples.clear();
        samples.extend_from_slice(block.samples);

        let queued = QueuedBlock {
            samples,
            sample_rate: block.sample_rate,
            channel: block.channel,
            stereo: block.stereo,
            repeat: block.repeat,
            stop_current: block.stop_current,
        };

        match self.block_tx.try_send(queued) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(queued)) => {
                self.spare = Some(queued.samples);
                Err(DeviceError::Busy)
            }
            Err(TrySendError::Closed(queued)) => {
                self.spare = Some(queued.samples);
                Err(DeviceError::Disconnected)
            }
        }
    }
}

/// Plays one block, giving up after `limit`.
async fn play_bounded<A: AsyncPlaybackDevice>(
    device: &mut A,
    block: &Block<'_>,
    limit: Duration,
) -> Result<(), DeviceError> {
    tokio::time::timeout(limit, device.play(block))
        .await
        .unwrap_or(Err(DeviceError::Timeout { after: limit }))
}

async fn run_worker<A: AsyncPlaybackDevice>(
    mut device: A,
    mut block_rx: mpsc::Receiver<QueuedBlock>,
    mut free_tx: ringbuf::HeapProd<Vec<i16>>,
    submit_timeout: Duration,
    counters: Arc<QueueCounters>,
) {
    while let Some(queued) = block_rx.recv().await {
        {
            let block = queued.as_block();
            match play_bounded(&mut device, &block, submit_timeout).await {
                Ok(()) => {
                    counters.played.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    let counter = if matches!(e, DeviceError::Timeout { .. }) {
                        &counters.timed_out
                    } else {
                        &counters.failed
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(
                        "{}: dropped block of {} samples: {}",
                        device.name(),
                        block.len(),
                        e
                    );
                }
            }
        }

        // Hand the buffer back; the ring holds exactly `depth` buffers
        let _ = free_tx.try_push(queued.samples);
    }

    if let Err(e) = device.close().await {
        tracing::warn!("{}: close failed: {}", device.name(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Semaphore;

    /// Device that only finishes a block when the test releases a permit.
    struct GatedDevice {
        gate: Arc<Semaphore>,
        inner: MemoryDevice,
    }

    #[async_trait]
    impl AsyncPlaybackDevice for GatedDevice {
        fn name(&self) -> &str {
            "gated"
        }

        async fn play(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
            self.gate.acquire().await.unwrap().forget();
            PlaybackDevice::submit(&mut self.inner, block)
        }
    }

    /// Device that never finishes a block.
    struct HungDevice;

    #[async_trait]
    impl AsyncPlaybackDevice for HungDevice {
        fn name(&self) -> &str {
            "hung"
        }

        async fn play(&mut self, _block: &Block<'_>) -> Result<(), DeviceError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn block(samples: &[i16]) -> Block<'_> {
        Block::mono(samples, 44_100, OutputChannel(0))
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = QueuedDevice::spawn(MemoryDevice::new(), QueueConfig::default());
        assert!(matches!(result, Err(SinkError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_blocks_reach_device_in_order() {
        let speaker = MemoryDevice::new();
        let mut queued = QueuedDevice::spawn(speaker.clone(), QueueConfig::default()).unwrap();
        assert_eq!(queued.name(), "queued:memory");
        assert!(queued.is_available());

        queued.submit(&block(&[1, 2])).unwrap();
        queued.submit(&block(&[3, 4])).unwrap();

        let stats = queued.shutdown().await.unwrap();
        assert_eq!(stats.played, 2);
        assert_eq!(speaker.samples(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_full_queue_reports_busy() {
        let gate = Arc::new(Semaphore::new(0));
        let speaker = MemoryDevice::new();
        let device = GatedDevice {
            gate: Arc::clone(&gate),
            inner: speaker.clone(),
        };
        let mut queued = QueuedDevice::spawn(device, QueueConfig::default()).unwrap();

        for i in 0..3 {
            queued.submit(&block(&[i; 8])).unwrap();
        }
        assert_eq!(queued.free_buffers(), 0);
        assert!(matches!(
            queued.submit(&block(&[9; 8])),
            Err(DeviceError::Busy)
        ));

        gate.add_permits(3);
        let stats = queued.shutdown().await.unwrap();
        assert_eq!(stats.played, 3);
        assert_eq!(speaker.block_count(), 3);
        assert_eq!(speaker.blocks()[2].samples, vec![2; 8]);
    }

    #[tokio::test]
    async fn test_buffers_return_after_playback() {
        let speaker = MemoryDevice::new();
        let mut queued = QueuedDevice::spawn(speaker.clone(), QueueConfig::default()).unwrap();

        queued.submit(&block(&[1; 16])).unwrap();
        while queued.stats().played < 1 {
            tokio::task::yield_now().await;
        }
        // The worker pushes the buffer back right after counting the block
        while queued.free_buffers() < 3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(queued.free_buffers(), 3);
        queued.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_device_is_timed_out() {
        let config = QueueConfig {
            submit_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let mut queued = QueuedDevice::spawn(HungDevice, config).unwrap();

        queued.submit(&block(&[5; 4])).unwrap();
        queued.submit(&block(&[6; 4])).unwrap();

        let stats = queued.shutdown().await.unwrap();
        assert_eq!(stats.timed_out, 2);
        assert_eq!(stats.played, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_bounded_reports_timeout() {
        let limit = Duration::from_millis(50);
        let samples = [1i16; 4];

        let result = play_bounded(&mut HungDevice, &block(&samples), limit).await;
        match result {
            Err(DeviceError::Timeout { after }) => assert_eq!(after, limit),
            other => panic!("expected Timeout, got {other:?}"),
        }

        let mut speaker = MemoryDevice::new();
        assert!(play_bounded(&mut speaker, &block(&samples), limit)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_device_errors_are_counted() {
        let speaker = MemoryDevice::new();
        speaker.fail_next(DeviceError::Disconnected);
        let mut queued = QueuedDevice::spawn(speaker.clone(), QueueConfig::default()).unwrap();

        queued.submit(&block(&[1])).unwrap();
        queued.submit(&block(&[2])).unwrap();

        let stats = queued.shutdown().await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.played, 1);
        assert_eq!(speaker.samples(), vec![2]);
    }
}
