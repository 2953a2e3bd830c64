//! Pulse-train encoder: protocol timing grammar and transmission builder
//!
//! A [`ProtocolTiming`] captures a protocol's timing grammar (base unit T,
//! leader shape, bit shapes, stop pulse, frame length, repeat headers). A
//! [`PulseTrain`] consumes logical bits against that grammar and produces the
//! flat tick array the infrared transport expects.

use crate::bits::{Bit, Byte, Nibble};
use crate::error::{CodecError, Result};
use crate::frame::{Entry, Frame};
use crate::hw;
use crate::token::{Polarity, TimeToken};

/// Immutable per-protocol timing configuration
///
/// Construction follows the builder idiom:
///
/// ```
/// use ir_pulse_codec::{ProtocolTiming, TimeToken, Polarity};
///
/// let timing = ProtocolTiming::new(
///     425.0,
///     vec![
///         TimeToken::units_of_t(8.0).with_polarity(Polarity::Pulse),
///         TimeToken::units_of_t(4.0),
///     ],
/// )
/// .with_bit1(vec![TimeToken::units_of_t(1.0), TimeToken::units_of_t(3.0)])
/// .with_bit0(vec![TimeToken::units_of_t(1.0), TimeToken::units_of_t(1.0)])
/// .with_frame_length(130_000.0);
/// assert_eq!(timing.unit_us(), 425.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolTiming {
    unit_us: f64,
    leader: Vec<TimeToken>,
    bit1: Vec<TimeToken>,
    bit0: Vec<TimeToken>,
    stop_pulse: Option<TimeToken>,
    frame_length_us: Option<f64>,
    repeat_headers: Vec<Vec<TimeToken>>,
    repeat_lengths_us: Vec<f64>,
}

impl ProtocolTiming {
    /// Create a timing grammar from the base unit T and the leader shape
    ///
    /// Bit shapes default to 1T/1T for a one and 1T/3T for a zero; override
    /// with [`with_bit1`](Self::with_bit1) / [`with_bit0`](Self::with_bit0).
    pub fn new(unit_us: f64, leader: Vec<TimeToken>) -> Self {
        ProtocolTiming {
            unit_us,
            leader,
            bit1: vec![
                TimeToken::units_of_t(1.0).with_polarity(Polarity::Pulse),
                TimeToken::units_of_t(1.0),
            ],
            bit0: vec![
                TimeToken::units_of_t(1.0).with_polarity(Polarity::Pulse),
                TimeToken::units_of_t(3.0),
            ],
            stop_pulse: None,
            frame_length_us: None,
            repeat_headers: Vec::new(),
            repeat_lengths_us: Vec::new(),
        }
    }

    /// Set the pulse/space shape encoding a logical 1
    pub fn with_bit1(mut self, tokens: Vec<TimeToken>) -> Self {
        self.bit1 = tokens;
        self
    }

    /// Set the pulse/space shape encoding a logical 0
    pub fn with_bit0(mut self, tokens: Vec<TimeToken>) -> Self {
        self.bit0 = tokens;
        self
    }

    /// Set the stop pulse appended before padding when a frame terminates
    pub fn with_stop_pulse(mut self, token: TimeToken) -> Self {
        self.stop_pulse = Some(token);
        self
    }

    /// Set the target frame duration in microseconds (frames are padded with
    /// space ticks up to this length)
    pub fn with_frame_length(mut self, us: f64) -> Self {
        self.frame_length_us = Some(us);
        self
    }

    /// Set the repeat-header shapes and their target frame durations
    ///
    /// The first header is used for the first repeat; the last header is
    /// reused for all subsequent repeats. Lengths follow the same rule.
    pub fn with_repeats(mut self, headers: Vec<Vec<TimeToken>>, lengths_us: Vec<f64>) -> Self {
        self.repeat_headers = headers;
        self.repeat_lengths_us = lengths_us;
        self
    }

    /// The base unit T in microseconds
    pub fn unit_us(&self) -> f64 {
        self.unit_us
    }

    /// Whether the protocol defines repeat frames
    pub fn has_repeats(&self) -> bool {
        !self.repeat_headers.is_empty() && !self.repeat_lengths_us.is_empty()
    }

    /// Repeat header and target length for the given repeat index
    ///
    /// Index 0 selects the first header; indices past the end reuse the last
    /// one. Returns `None` when the protocol defines no repeats.
    pub fn repeat_info(&self, repeat_index: usize) -> Option<(&[TimeToken], f64)> {
        if !self.has_repeats() {
            return None;
        }
        let idx = repeat_index.min(self.repeat_headers.len() - 1);
        let len_idx = idx.min(self.repeat_lengths_us.len() - 1);
        Some((&self.repeat_headers[idx], self.repeat_lengths_us[len_idx]))
    }

    /// Parse a list of token strings into time tokens
    pub fn parse_tokens(tokens: &[&str]) -> Result<Vec<TimeToken>> {
        tokens.iter().map(|t| t.parse()).collect()
    }

    /// The NEC protocol grammar
    ///
    /// T = 562 us, leader 16T/8T, one = 1T/1T, zero = 1T/3T, stop pulse 1T,
    /// 108 ms frames, repeat header 16T/4T/1T padded to 108 ms.
    /// See <http://elm-chan.org/docs/ir_format.html>.
    pub fn nec() -> Self {
        ProtocolTiming::new(
            562.0,
            vec![
                TimeToken::units_of_t(16.0).with_polarity(Polarity::Pulse),
                TimeToken::units_of_t(8.0),
            ],
        )
        .with_bit1(vec![
            TimeToken::units_of_t(1.0).with_polarity(Polarity::Pulse),
            TimeToken::units_of_t(1.0),
        ])
        .with_bit0(vec![
            TimeToken::units_of_t(1.0).with_polarity(Polarity::Pulse),
            TimeToken::units_of_t(3.0),
        ])
        .with_stop_pulse(TimeToken::units_of_t(1.0))
        .with_frame_length(108_000.0)
        .with_repeats(
            vec![vec![
                TimeToken::units_of_t(16.0).with_polarity(Polarity::Pulse),
                TimeToken::units_of_t(4.0),
                TimeToken::units_of_t(1.0),
            ]],
            vec![108_000.0],
        )
    }
}

/// The transport envelope consumed by the physical infrared transmitter
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WireFormat {
    /// Always `"raw"`
    pub format: String,
    /// Carrier frequency in kHz
    pub freq: u8,
    /// Flat alternating pulse/space tick array
    pub data: Vec<u16>,
}

/// Builder for one infrared transmission (initial frame plus repeats)
///
/// Owned and used linearly by one caller; construct an independent train per
/// transmission when encoding concurrently.
///
/// ```
/// use ir_pulse_codec::{ProtocolTiming, PulseTrain};
///
/// let timing = ProtocolTiming::nec();
/// let mut train = PulseTrain::new(&timing)?;
/// train.append_byte("a".parse()?)?;
/// train.terminate_frame()?;
/// let envelope = train.to_wire_format();
/// assert_eq!(envelope.format, "raw");
/// # Ok::<(), ir_pulse_codec::CodecError>(())
/// ```
#[derive(Debug)]
pub struct PulseTrain<'a> {
    timing: &'a ProtocolTiming,
    frames: Vec<Frame>,
    bits: Vec<Bit>,
    repeat_count: usize,
}

impl<'a> PulseTrain<'a> {
    /// Start a new transmission: opens the first frame and appends the leader
    pub fn new(timing: &'a ProtocolTiming) -> Result<Self> {
        let mut train = PulseTrain {
            timing,
            frames: vec![Frame::new()],
            bits: Vec::new(),
            repeat_count: 0,
        };
        train.append_time(&timing.leader)?;
        Ok(train)
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new());
        }
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    /// Resolve and append time tokens to the open frame
    ///
    /// Polarity-forced tokens insert a zero-length filler first when the
    /// slot's implied polarity disagrees. An untagged token resolving to
    /// exactly zero microseconds is dropped with a diagnostic.
    pub fn append_time(&mut self, tokens: &[TimeToken]) -> Result<&mut Self> {
        for token in tokens {
            let entry = token.resolve(self.timing.unit_us);
            let frame = self.current_frame_mut();
            if frame.is_closed() {
                return Err(CodecError::frame_closed(
                    "cannot append time to a terminated frame",
                ));
            }
            match token.polarity {
                Some(want) => {
                    if frame.next_polarity() != want {
                        // zero filler lands the duration on the required polarity
                        frame.push(Entry::Micros(0.0))?;
                    }
                    frame.push(entry)?;
                }
                None => {
                    if entry.is_zero() {
                        log::warn!("dropping zero-duration token with no polarity tag");
                    } else {
                        frame.push(entry)?;
                    }
                }
            }
        }
        Ok(self)
    }

    /// Append one logical bit using the protocol's bit-1 or bit-0 shape
    ///
    /// The bit is also recorded in the train's bit history (see
    /// [`bits`](Self::bits)).
    pub fn append_bit(&mut self, bit: impl Into<Bit>) -> Result<&mut Self> {
        let bit = bit.into();
        let timing = self.timing;
        let tokens = if bit.is_set() {
            &timing.bit1
        } else {
            &timing.bit0
        };
        self.bits.push(bit);
        self.append_time(tokens)?;
        Ok(self)
    }

    /// Append a sequence of logical bits
    pub fn append_bits<B: Into<Bit> + Copy>(&mut self, bits: &[B]) -> Result<&mut Self> {
        for &bit in bits {
            self.append_bit(bit)?;
        }
        Ok(self)
    }

    /// Append bits, invoking an observer after each one is encoded
    pub fn append_bits_observed<B, F>(&mut self, bits: &[B], mut observe: F) -> Result<&mut Self>
    where
        B: Into<Bit> + Copy,
        F: FnMut(Bit),
    {
        for &bit in bits {
            let bit = bit.into();
            self.append_bit(bit)?;
            observe(bit);
        }
        Ok(self)
    }

    /// Append a 4-bit group, most-significant bit first
    pub fn append_nibble(&mut self, nibble: Nibble) -> Result<&mut Self> {
        self.append_bits(&nibble.to_bits())
    }

    /// Append an 8-bit group, most-significant bit first
    pub fn append_byte(&mut self, byte: Byte) -> Result<&mut Self> {
        self.append_bits(&byte.to_bits())
    }

    /// Open a new data frame beginning with the leader
    pub fn begin_frame(&mut self) -> Result<&mut Self> {
        let timing = self.timing;
        self.frames.push(Frame::new());
        self.append_time(&timing.leader)?;
        Ok(self)
    }

    /// Terminate the open frame: append the stop pulse and pad to the target
    /// frame duration
    ///
    /// Padding is appended as space ticks in chunks of at most 65535. A frame
    /// already over its target length is closed as-is with a diagnostic; no
    /// truncation is performed.
    pub fn terminate_frame(&mut self) -> Result<&mut Self> {
        let timing = self.timing;
        if let Some(stop) = timing.stop_pulse {
            self.append_time(&[stop.with_polarity(Polarity::Pulse)])?;
        }
        self.pad_and_close(timing.frame_length_us)?;
        Ok(self)
    }

    /// Open, pad and terminate a repeat frame for the current repeat index
    pub fn begin_repeat(&mut self) -> Result<&mut Self> {
        let timing = self.timing;
        let (header, target_us) = timing.repeat_info(self.repeat_count).ok_or_else(|| {
            CodecError::no_repeat_configured("protocol defines no repeat headers")
        })?;
        self.frames.push(Frame::new());
        self.append_time(header)?;
        self.pad_and_close(Some(target_us))?;
        self.repeat_count += 1;
        Ok(self)
    }

    /// Append `n` repeat frames
    pub fn append_repeats(&mut self, n: usize) -> Result<&mut Self> {
        for _ in 0..n {
            self.begin_repeat()?;
        }
        Ok(self)
    }

    fn pad_and_close(&mut self, target_us: Option<f64>) -> Result<()> {
        if let Some(target) = target_us {
            let current = self.current_frame_mut().duration_us();
            if current <= target {
                let mut need_ticks = ((target - current) * hw::TICKS_PER_US).round() as u64;
                while need_ticks > 0 {
                    let chunk = need_ticks.min(hw::MAX_TICKS as u64) as u32;
                    self.append_time(&[
                        TimeToken::ticks(chunk).with_polarity(Polarity::Space)
                    ])?;
                    need_ticks -= chunk as u64;
                }
            } else {
                log::warn!(
                    "frame duration {:.1} us exceeds target {:.1} us; closing without padding",
                    current,
                    target
                );
            }
        }
        self.current_frame_mut().close();
        Ok(())
    }

    /// The logical bits appended so far, in order
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// The frames built so far, in order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of repeat frames appended so far
    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }

    /// Flatten all frames into the final tick array
    ///
    /// Microsecond durations convert at 2 ticks/us, rounded to nearest. Any
    /// duration beyond 65535 ticks is split into consecutive entries summing
    /// to the original, with a zero opposite-polarity filler between splits
    /// to preserve alternation parity.
    pub fn to_ticks(&self) -> Vec<u16> {
        let mut data = Vec::new();
        for frame in &self.frames {
            for entry in frame.entries() {
                let ticks = match *entry {
                    Entry::Micros(us) => (us * hw::TICKS_PER_US).round() as u64,
                    Entry::Ticks(ticks) => ticks as u64,
                };
                push_split(&mut data, ticks);
            }
        }
        data
    }

    /// Wrap the tick array in the transport envelope
    ///
    /// All currently supported protocols assume a 38 kHz carrier.
    pub fn to_wire_format(&self) -> WireFormat {
        WireFormat {
            format: "raw".to_string(),
            freq: hw::CARRIER_FREQUENCY_KHZ,
            data: self.to_ticks(),
        }
    }
}

fn push_split(data: &mut Vec<u16>, mut ticks: u64) {
    loop {
        let chunk = ticks.min(hw::MAX_TICKS as u64);
        data.push(chunk as u16);
        ticks -= chunk;
        if ticks == 0 {
            return;
        }
        // same-polarity continuation needs an opposite-polarity filler
        data.push(0);
    }
}
