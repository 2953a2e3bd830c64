//! # Infrared Pulse-Train Codec
//!
//! A Rust library for encoding and decoding the infrared pulse trains used
//! by remote-controlled home appliances (air conditioners, ceiling lamps,
//! TVs).
//!
//! The codec has two halves:
//!
//! - Encoding: a protocol's timing grammar ([`ProtocolTiming`]) plus logical
//!   bits produce a flat array of alternating pulse/space durations in
//!   hardware ticks (1 tick = 0.5 microseconds), padded to exact frame
//!   lengths and wrapped in the transmitter's wire envelope.
//! - Decoding: a raw tick sequence from a receiver is classified into a
//!   protocol family (NEC, AEHA, Sony, Iris-Oyama) with an estimated base
//!   unit T, then decoded back into bit frames.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support
//!
//! ## Example
//!
//! ```
//! use ir_pulse_codec::{ProtocolTiming, PulseTrain, decode};
//!
//! let timing = ProtocolTiming::nec();
//! let mut train = PulseTrain::new(&timing)?;
//! train.append_bits(&[1u8, 0, 1, 1])?;
//! train.terminate_frame()?;
//!
//! let guess = decode(&train.to_ticks())?;
//! assert_eq!(guess.family.map(|f| f.to_string()), Some("nec".to_string()));
//! # Ok::<(), ir_pulse_codec::CodecError>(())
//! ```

pub mod bits;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod guess;
pub mod token;

pub use bits::{Bit, Byte, Nibble};
pub use encoder::{ProtocolTiming, PulseTrain, WireFormat};
pub use error::{CodecError, Result};
pub use frame::{Entry, Frame};
pub use guess::{classify, decode, Classification, DecodedBit, DecodedFrame, DecodedGuess, Family};
pub use token::{Polarity, TimeToken, TimeValue};

/// Hardware timing constants shared by the encoder and decoder
pub mod hw {
    /// Duration of one hardware tick in microseconds
    pub const TICK_US: f64 = 0.5;

    /// Ticks per microsecond
    pub const TICKS_PER_US: f64 = 2.0;

    /// Largest tick count the transmitter register holds
    pub const MAX_TICKS: u16 = 65535;

    /// Carrier frequency assumed by all supported protocols, in kHz
    pub const CARRIER_FREQUENCY_KHZ: u8 = 38;
}
