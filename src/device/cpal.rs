//! CPAL output device wrapper.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, StreamConfig as CpalStreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{Block, PlaybackDevice};
use crate::format::i16_to_f32;
use crate::{DeviceError, SinkError};

/// Full blocks the output ring can hold ahead of playback.
const QUEUED_BLOCKS: usize = 3;

/// Plays blocks on the system's default output device.
///
/// Submitted samples go into a lock-free ring drained by the CPAL callback.
/// The ring holds three blocks of the size given to
/// [`open_default()`](Self::open_default). A block that does not fit in the
/// free space is rejected whole with [`DeviceError::Busy`] rather than
/// written in part. When the ring runs dry the callback plays silence.
///
/// Only mono blocks are accepted. The block's output selector is not used:
/// each sample is written to every channel of the default output.
///
/// The stream runs while this value exists and stops when it is dropped.
///
/// # Example
///
/// ```no_run
/// use speaker_sink::device::CpalDevice;
/// use speaker_sink::{FrameSink, MonoSink};
///
/// let device = CpalDevice::open_default(44_100, 1536)?;
/// let mut sink = MonoSink::builder(device)
///     .sample_rate(44_100)
///     .buffer_capacity(1536)
///     .build()?;
///
/// sink.begin();
/// sink.consume(0, 0);
/// sink.stop();
/// # Ok::<(), speaker_sink::SinkError>(())
/// ```
pub struct CpalDevice {
    name: String,
    sample_rate: u32,
    ring_capacity: usize,
    producer: HeapProd<i16>,
    /// Dropping this stops playback.
    _stream: Stream,
}

impl CpalDevice {
    /// Opens the default output device at `sample_rate`, buffering up to
    /// three blocks of `block_capacity` samples.
    ///
    /// `block_capacity` should match the sink's buffer capacity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero or oversized `block_capacity`,
    /// `NoDefaultDevice` if no default output device is configured, or
    /// `BackendError` if the stream cannot be built or started.
    pub fn open_default(sample_rate: u32, block_capacity: usize) -> Result<Self, SinkError> {
        let ring_capacity = block_capacity
            .checked_mul(QUEUED_BLOCKS)
            .filter(|&capacity| capacity > 0)
            .ok_or_else(|| {
                SinkError::invalid_config(format!(
                    "output block capacity {block_capacity} out of range"
                ))
            })?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(SinkError::NoDefaultDevice)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported_config = device
            .default_output_config()
            .map_err(|e| SinkError::BackendError(e.to_string()))?;
        let sample_format = supported_config.sample_format();
        let mut cpal_config: CpalStreamConfig = supported_config.into();
        cpal_config.sample_rate = SampleRate(sample_rate);

        let ring_buffer = HeapRb::<i16>::new(ring_capacity);
        let (producer, consumer) = ring_buffer.split();

        let stream = match sample_format {
            SampleFormat::I16 => build_i16_stream(&device, &cpal_config, consumer)?,
            SampleFormat::F32 => build_f32_stream(&device, &cpal_config, consumer)?,
            format => {
                return Err(SinkError::BackendError(format!(
                    "unsupported output sample format: {format:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| SinkError::BackendError(e.to_string()))?;

        tracing::info!(
            "CpalDevice: playing on {} at {}Hz, {} channels, {:?}, {} samples buffered",
            name,
            sample_rate,
            cpal_config.channels,
            sample_format,
            ring_capacity
        );

        Ok(Self {
            name,
            sample_rate,
            ring_capacity,
            producer,
            _stream: stream,
        })
    }

    /// Rate the output stream runs at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples waiting to be played.
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }
}

impl PlaybackDevice for CpalDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        admit(
            block,
            self.sample_rate,
            self.ring_capacity,
            self.producer.vacant_len(),
        )?;

        for _ in 0..block.repeat {
            self.producer.push_slice(block.samples);
        }
        Ok(())
    }
}

/// Checks whether `block` can be pushed whole into a ring with `vacant` free
/// slots out of `ring_capacity`.
///
/// Only a block that would fit once the ring drains is `Busy`; one larger
/// than the whole ring is rejected outright so it is not retried.
fn admit(
    block: &Block<'_>,
    sample_rate: u32,
    ring_capacity: usize,
    vacant: usize,
) -> Result<(), DeviceError> {
    if block.sample_rate != sample_rate {
        return Err(DeviceError::UnsupportedRate {
            requested: block.sample_rate,
            supported: sample_rate,
        });
    }
    if block.stereo {
        return Err(DeviceError::custom("cpal output plays mono blocks only"));
    }

    let needed = block.len().saturating_mul(block.repeat as usize);
    if needed > ring_capacity {
        return Err(DeviceError::custom(format!(
            "block of {needed} samples exceeds output buffer of {ring_capacity}"
        )));
    }
    if needed > vacant {
        return Err(DeviceError::Busy);
    }
    Ok(())
}

fn build_i16_stream(
    device: &cpal::Device,
    config: &CpalStreamConfig,
    mut consumer: HeapCons<i16>,
) -> Result<Stream, SinkError> {
    let channels = usize::from(config.channels);
    device
        .build_output_stream(
            config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    frame.fill(consumer.try_pop().unwrap_or(0));
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SinkError::BackendError(e.to_string()))
}

fn build_f32_stream(
    device: &cpal::Device,
    config: &CpalStreamConfig,
    mut consumer: HeapCons<i16>,
) -> Result<Stream, SinkError> {
    let channels = usize::from(config.channels);
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    frame.fill(i16_to_f32(consumer.try_pop().unwrap_or(0)));
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SinkError::BackendError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameSink, MonoSink, OutputChannel};

    fn block(samples: &[i16]) -> Block<'_> {
        Block::mono(samples, 44_100, OutputChannel(0))
    }

    #[test]
    fn test_admit_fits() {
        let samples = [0i16; 8];
        assert!(admit(&block(&samples), 44_100, 24, 8).is_ok());
    }

    #[test]
    fn test_admit_busy_until_drained() {
        let samples = [0i16; 8];
        assert!(matches!(
            admit(&block(&samples), 44_100, 24, 7),
            Err(DeviceError::Busy)
        ));
    }

    #[test]
    fn test_admit_rejects_block_larger_than_ring() {
        let samples = vec![0i16; 8192];
        let result = admit(&block(&samples), 44_100, 1536 * 3, 1536 * 3);
        assert!(matches!(result, Err(DeviceError::Custom(_))));
        assert!(!result.unwrap_err().is_retryable());
    }

    #[test]
    fn test_admit_counts_repeats() {
        let samples = [0i16; 10];
        let mut repeated = block(&samples);
        repeated.repeat = 3;
        assert!(matches!(
            admit(&repeated, 44_100, 24, 24),
            Err(DeviceError::Custom(_))
        ));
        assert!(admit(&repeated, 44_100, 30, 30).is_ok());
    }

    #[test]
    fn test_admit_rejects_stereo_and_foreign_rate() {
        let samples = [0i16; 4];
        let mut stereo = block(&samples);
        stereo.stereo = true;
        assert!(matches!(
            admit(&stereo, 44_100, 24, 24),
            Err(DeviceError::Custom(_))
        ));
        assert!(matches!(
            admit(&block(&samples), 22_050, 24, 24),
            Err(DeviceError::UnsupportedRate {
                requested: 44_100,
                supported: 22_050
            })
        ));
    }

    // Device tests require actual audio hardware and are skipped in CI
    #[test]
    #[ignore = "requires audio hardware"]
    fn test_open_default_device() {
        let device = CpalDevice::open_default(44_100, 1536).unwrap();
        println!("Default output: {}", device.name());
        assert_eq!(device.sample_rate(), 44_100);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_rejects_foreign_rate() {
        let mut sink = MonoSink::builder(CpalDevice::open_default(44_100, 1536).unwrap())
            .sample_rate(22_050)
            .build()
            .unwrap();
        sink.consume(0, 0);
        sink.flush();
        assert_eq!(sink.stats().blocks_dropped, 1);
    }
}
