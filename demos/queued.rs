//! Queued device example.
//!
//! Puts a slow asynchronous "speaker" behind a `QueuedDevice` and shows the
//! sink dropping blocks once the queue is full instead of blocking.
//!
//! Run with: cargo run --example queued

use std::time::Duration;

use async_trait::async_trait;
use speaker_sink::device::{AsyncPlaybackDevice, QueuedDevice};
use speaker_sink::{Block, DeviceError, MonoSink, QueueConfig, SignalGenerator, SinkEvent};
use tracing_subscriber::EnvFilter;

/// Pretends to play each block in real time.
struct SlowSpeaker;

#[async_trait]
impl AsyncPlaybackDevice for SlowSpeaker {
    fn name(&self) -> &str {
        "slow-speaker"
    }

    async fn play(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        tokio::time::sleep(block.duration()).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("speaker_sink=debug".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut queued = QueuedDevice::spawn(
        SlowSpeaker,
        QueueConfig {
            submit_timeout: Duration::from_secs(1),
            ..QueueConfig::default()
        },
    )?;

    let mut signal = SignalGenerator::new(44_100);
    signal.sine(440.0, 0.3, 2000);

    let stats = {
        let mut sink = MonoSink::builder(&mut queued)
            .on_event(|event| {
                if let SinkEvent::BlockDropped { samples, reason, .. } = event {
                    println!("dropped {samples} samples: {reason}");
                }
            })
            .build()?;

        // The producer runs far faster than real time, so most blocks are dropped
        signal.play_into(&mut sink);
        sink.stats()
    };

    let queue_stats = queued.shutdown().await?;

    println!("\nSink:  {stats:?}");
    println!("Queue: {queue_stats:?}");

    Ok(())
}
