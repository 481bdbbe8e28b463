//! Serial-to-broadcast bridge
//!
//! Owns the parser, the snapshot and the statistics for one meter, and
//! pushes payloads to a [`BroadcastSink`]. The caller supplies bytes as they
//! arrive from the UART; everything else happens inline.

use teleinfo_protocol::{DatasetEvent, EventSink, FrameError, FrameParser, ParserState};

use crate::broadcast::Payloads;
use crate::config::{BridgeConfig, BroadcastPolicy};
use crate::historic::{InterpretError, Snapshot};
use crate::stats::{bump, LinkStats};
use crate::traits::BroadcastSink;

/// Everything the parser's events act on
///
/// Kept apart from the parser so both can be borrowed mutably at once.
struct Pipeline<S> {
    config: BridgeConfig,
    snapshot: Snapshot,
    stats: LinkStats,
    sink: S,
    /// Set once any dataset has updated the snapshot
    primed: bool,
}

impl<S: BroadcastSink> Pipeline<S> {
    fn broadcast(&mut self) {
        let payloads = Payloads::encode(&self.snapshot);
        match self.sink.publish(&payloads.primary, &payloads.secondary) {
            Ok(()) => bump(&mut self.stats.broadcasts),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Failed to publish broadcast payloads");
                bump(&mut self.stats.broadcast_errors);
            }
        }
    }
}

impl<S: BroadcastSink> EventSink for Pipeline<S> {
    fn on_event(&mut self, event: DatasetEvent<'_>) {
        match event {
            DatasetEvent::Dataset(dataset) => {
                bump(&mut self.stats.datasets);
                match self.snapshot.apply_with(&dataset, self.config.numbers) {
                    Ok(_label) => {
                        #[cfg(feature = "defmt")]
                        defmt::trace!("{} = {}", _label, dataset.data);
                        self.primed = true;
                        if self.config.broadcast == BroadcastPolicy::PerDataset {
                            self.broadcast();
                        }
                    }
                    Err(InterpretError::UnknownLabel) => {
                        #[cfg(feature = "defmt")]
                        defmt::debug!("Ignoring label {}", dataset.label);
                        bump(&mut self.stats.unknown_labels);
                    }
                    Err(InterpretError::UnsupportedValue(_label)) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Unsupported {} value: {}", _label, dataset.data);
                        bump(&mut self.stats.unsupported_values);
                    }
                    Err(InterpretError::InvalidNumber(_label)) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Invalid {} number: {}", _label, dataset.data);
                        bump(&mut self.stats.invalid_numbers);
                    }
                }
            }
            DatasetEvent::EndOfTransmission => {
                bump(&mut self.stats.frames);
                if self.primed && self.config.broadcast == BroadcastPolicy::PerFrame {
                    self.broadcast();
                }
            }
            DatasetEvent::ChecksumError { .. } => {
                bump(&mut self.stats.checksum_errors);
            }
        }
    }

    fn on_error(&mut self, error: FrameError) {
        match error {
            FrameError::LabelOverflow | FrameError::DataOverflow => {
                bump(&mut self.stats.overflows)
            }
            FrameError::Framing { .. } => bump(&mut self.stats.framing_errors),
        }
    }
}

/// TIC-to-broadcast bridge for one meter
///
/// Payloads are published only after at least one dataset has been accepted,
/// so listeners never see an all-zero snapshot.
pub struct Bridge<S> {
    parser: FrameParser,
    pipeline: Pipeline<S>,
}

impl<S: BroadcastSink> Bridge<S> {
    /// Create a bridge with the default configuration
    pub fn new(sink: S) -> Self {
        Self::with_config(BridgeConfig::default(), sink)
    }

    /// Create a bridge with the given configuration
    pub fn with_config(config: BridgeConfig, sink: S) -> Self {
        Self {
            parser: FrameParser::with_config(config.parser()),
            pipeline: Pipeline {
                config,
                snapshot: Snapshot::new(),
                stats: LinkStats::new(),
                sink,
                primed: false,
            },
        }
    }

    /// Feed bytes received from the meter
    ///
    /// Any broadcast triggered by these bytes has been published by the time
    /// this returns.
    pub fn feed(&mut self, bytes: &[u8]) {
        let stats = &mut self.pipeline.stats;
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        stats.bytes = stats.bytes.wrapping_add(len);
        self.parser.feed_bytes(bytes, &mut self.pipeline);
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.pipeline.snapshot
    }

    /// Link statistics
    pub fn stats(&self) -> &LinkStats {
        &self.pipeline.stats
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.pipeline.config
    }

    /// Current parser state
    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    /// Borrow the broadcast sink
    pub fn sink(&self) -> &S {
        &self.pipeline.sink
    }

    /// Mutably borrow the broadcast sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.pipeline.sink
    }

    /// Consume the bridge and return the broadcast sink
    pub fn into_sink(self) -> S {
        self.pipeline.sink
    }
}
