//! Protocol classification and decoding of received pulse trains
//!
//! Given a raw tick sequence captured from a receiver, [`classify`] infers
//! which protocol family produced it and estimates the base unit T, and
//! [`decode`] turns the sequence back into bits grouped into frames.
//! Signature references: <http://elm-chan.org/docs/ir_format.html>.

use crate::error::{CodecError, Result};
use crate::hw;

/// NEC's fixed frame length in microseconds
const NEC_FRAME_US: f64 = 108_000.0;

/// A known protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    /// Association for Electric Home Appliances (Panasonic, Sharp, ...)
    Aeha,
    /// NEC format (most TV/AV remotes)
    Nec,
    /// Sony SIRC
    Sony,
    /// Iris-Oyama lighting
    IrisOyama,
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Aeha => write!(f, "aeha"),
            Family::Nec => write!(f, "nec"),
            Family::Sony => write!(f, "sony"),
            Family::IrisOyama => write!(f, "iris-oyama"),
        }
    }
}

/// Result of classifying a received signal
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Classification {
    /// The matched protocol family
    pub family: Family,
    /// The estimated base unit T in microseconds
    pub unit_us: f64,
}

/// A decoded bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodedBit {
    /// Recognized as a logical 0
    Zero,
    /// Recognized as a logical 1
    One,
    /// Timing matched neither bit shape
    Unrecognized,
}

impl std::fmt::Display for DecodedBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodedBit::Zero => write!(f, "0"),
            DecodedBit::One => write!(f, "1"),
            DecodedBit::Unrecognized => write!(f, "?"),
        }
    }
}

/// One decoded frame: either data bits or a repeat marker
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodedFrame {
    /// A sequence of decoded bit values
    Bits(Vec<DecodedBit>),
    /// A repeat header (no data)
    Repeat,
}

/// Output of [`decode`]
///
/// An unrecognized signal yields `family: None` with no frames; unrecognized
/// signals are an expected runtime condition, not an error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedGuess {
    /// The guessed protocol family, if any qualified
    pub family: Option<Family>,
    /// The estimated base unit T in microseconds
    pub unit_us: Option<f64>,
    /// Decoded frames, in order of appearance
    pub frames: Vec<DecodedFrame>,
}

type MatchFn = fn(&[f64], f64) -> bool;

/// Leader-signature matchers in fixed priority order
///
/// Signatures overlap between families (a noisy AEHA leader can satisfy the
/// NEC ratio for some T), so the first family with a non-empty qualifying
/// set wins. The order is resolution policy, not a quality ranking.
const MATCHERS: [(Family, MatchFn); 4] = [
    (Family::Aeha, is_aeha),
    (Family::Nec, is_nec),
    (Family::Sony, is_sony),
    (Family::IrisOyama, is_iris_oyama),
];

fn ratio(times: &[f64], index: usize, unit: f64) -> Option<i64> {
    times.get(index).map(|&us| (us / unit).round() as i64)
}

/// AEHA leader: 8T pulse, 4T space
fn is_aeha(times: &[f64], unit: f64) -> bool {
    ratio(times, 0, unit) == Some(8) && ratio(times, 1, unit) == Some(4)
}

/// NEC leader: 16T pulse, 8T space
fn is_nec(times: &[f64], unit: f64) -> bool {
    ratio(times, 0, unit) == Some(16) && ratio(times, 1, unit) == Some(8)
}

/// Sony leader: 4T pulse (space unchecked)
fn is_sony(times: &[f64], unit: f64) -> bool {
    ratio(times, 0, unit) == Some(4)
}

/// Iris-Oyama leader: 9T pulse, 9T space
fn is_iris_oyama(times: &[f64], unit: f64) -> bool {
    ratio(times, 0, unit) == Some(9) && ratio(times, 1, unit) == Some(9)
}

fn to_micros(ticks: &[u16]) -> Vec<f64> {
    ticks.iter().map(|&t| t as f64 / hw::TICKS_PER_US).collect()
}

/// Classify a raw tick sequence into a protocol family and base unit
///
/// Every candidate T from 300 to 795 us (stepped by 5) is tested against each
/// family's leader signature; a family's estimated T is the mean of its
/// qualifying candidates. Errors with `UnknownProtocol` when no family
/// qualifies.
pub fn classify(ticks: &[u16]) -> Result<Classification> {
    let times = to_micros(ticks);

    let mut qualifying: [Vec<f64>; MATCHERS.len()] = std::array::from_fn(|_| Vec::new());
    for unit in (300u32..800).step_by(5) {
        let unit = unit as f64;
        for (set, (_, matcher)) in qualifying.iter_mut().zip(MATCHERS.iter()) {
            if matcher(&times, unit) {
                set.push(unit);
            }
        }
    }

    for (set, (family, _)) in qualifying.iter().zip(MATCHERS.iter()) {
        if !set.is_empty() {
            let unit_us = set.iter().sum::<f64>() / set.len() as f64;
            return Ok(Classification {
                family: *family,
                unit_us,
            });
        }
    }

    Err(CodecError::unknown_protocol(
        "no family signature matched the leader",
    ))
}

/// Decode a raw tick sequence into a protocol guess and bit frames
///
/// Classification failure folds into an unknown [`DecodedGuess`] rather than
/// an error. A Sony classification errors with `NotImplemented`: the family
/// is detectable but its decoder does not exist yet.
pub fn decode(ticks: &[u16]) -> Result<DecodedGuess> {
    let classification = match classify(ticks) {
        Ok(c) => c,
        Err(CodecError::UnknownProtocol(_)) => {
            return Ok(DecodedGuess {
                family: None,
                unit_us: None,
                frames: Vec::new(),
            });
        }
        Err(e) => return Err(e),
    };

    let times = to_micros(ticks);
    let frames = match classification.family {
        Family::Nec => decode_nec(&times, classification.unit_us),
        Family::Aeha => decode_aeha(&times, classification.unit_us),
        Family::Sony => {
            return Err(CodecError::not_implemented(
                "sony decoding is not implemented",
            ));
        }
        // detected but has no decoder
        Family::IrisOyama => Vec::new(),
    };

    Ok(DecodedGuess {
        family: Some(classification.family),
        unit_us: Some(classification.unit_us),
        frames,
    })
}

/// NEC decode: lenient leader match, fixed 108 ms frame, repeat markers
fn decode_nec(times: &[f64], unit: f64) -> Vec<DecodedFrame> {
    let ratios: Vec<i64> = times.iter().map(|&us| (us / unit).round() as i64).collect();

    let leader_index = (0..ratios.len()).find(|&i| {
        [15, 16, 17].contains(&ratios[i])
            && matches!(ratios.get(i + 1), Some(r) if [7, 8, 9].contains(r))
    });
    let leader_index = match leader_index {
        Some(index) => index,
        // no leader at all: nothing recognized, which is a valid outcome
        None => return Vec::new(),
    };

    let mut frames = Vec::new();
    let mut bits = Vec::new();
    let mut frame_time = (16.0 + 8.0) * unit;
    let mut i = leader_index + 2;
    while i < ratios.len() {
        let highs = ratios[i];
        let lows = ratios.get(i + 1).copied().unwrap_or(0);
        frame_time += (highs + lows) as f64 * unit;
        if frame_time >= NEC_FRAME_US {
            break;
        }
        let bit = if highs == 1 && lows == 1 {
            DecodedBit::One
        } else if highs == 1 && lows == 3 {
            DecodedBit::Zero
        } else {
            DecodedBit::Unrecognized
        };
        bits.push(bit);
        i += 2;
    }

    // end-of-frame padding shows up as trailing unrecognized pairs
    while bits.last() == Some(&DecodedBit::Unrecognized) {
        bits.pop();
    }
    frames.push(DecodedFrame::Bits(bits));

    // a 16T/4T pair after the data frame is a repeat header
    while i < ratios.len() {
        let highs = ratios[i];
        let lows = ratios.get(i + 1).copied().unwrap_or(0);
        if highs == 16 && lows == 4 {
            frames.push(DecodedFrame::Repeat);
        }
        i += 2;
    }

    frames
}

/// AEHA decode: space durations carry the bits, long spaces trace frame
/// boundaries
///
/// A space longer than 3T is a tracer. When the tracer is immediately
/// followed by a fresh 8T/4T leader the current frame closes and decoding
/// continues past the leader; otherwise one position is skipped and decoding
/// continues, which keeps pair alignment on noisy input but can misalign on
/// genuinely malformed signals.
fn decode_aeha(times: &[f64], unit: f64) -> Vec<DecodedFrame> {
    let mut frames = Vec::new();
    let mut frame = Vec::new();

    let round = |us: f64| (us / unit).round() as i64;

    // first two entries are the initial leader
    let mut i = 2;
    while i < times.len() {
        // even positions are pulses; only spaces decide bits
        if i % 2 == 1 {
            let n = round(times[i]);
            if n > 3 {
                let led_pulse = times.get(i + 1).map(|&us| round(us)) == Some(8);
                let led_space = times.get(i + 2).map(|&us| round(us)) == Some(4);
                if led_pulse && led_space {
                    frames.push(DecodedFrame::Bits(std::mem::take(&mut frame)));
                    i += 4;
                } else {
                    log::warn!(
                        "aeha: tracer at position {} not followed by a leader; skipping one position",
                        i
                    );
                    i += 2;
                }
                continue;
            } else if n == 3 {
                frame.push(DecodedBit::One);
            } else if n == 1 {
                frame.push(DecodedBit::Zero);
            } else {
                frame.push(DecodedBit::Unrecognized);
            }
        }
        i += 1;
    }

    if !frame.is_empty() {
        frames.push(DecodedFrame::Bits(frame));
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{ProtocolTiming, PulseTrain};

    fn nec_ticks(unit: u16, ratios: &[u16]) -> Vec<u16> {
        ratios.iter().map(|&r| r * unit * 2).collect()
    }

    #[test]
    fn test_classify_nec_leader() -> Result<()> {
        // leader, bit 1 (1T/1T), bit 0 (1T/3T)
        let ticks = nec_ticks(562, &[16, 8, 1, 1, 1, 3]);
        let c = classify(&ticks)?;
        assert_eq!(c.family, Family::Nec);
        assert!(
            (c.unit_us - 562.0).abs() < 20.0,
            "estimated T {} too far from 562",
            c.unit_us
        );
        Ok(())
    }

    #[test]
    fn test_classify_is_deterministic() -> Result<()> {
        let ticks = nec_ticks(562, &[16, 8, 1, 1, 1, 3]);
        let first = classify(&ticks)?;
        let second = classify(&ticks)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_classify_unknown_signal() {
        assert!(matches!(
            classify(&[0u16; 10]),
            Err(CodecError::UnknownProtocol(_))
        ));
        assert!(classify(&[]).is_err());
    }

    #[test]
    fn test_decode_unknown_never_errors() -> Result<()> {
        let guess = decode(&[0u16; 10])?;
        assert_eq!(guess.family, None);
        assert_eq!(guess.unit_us, None);
        assert!(guess.frames.is_empty());
        Ok(())
    }

    #[test]
    fn test_decode_nec_leader_scenario() -> Result<()> {
        let ticks = nec_ticks(562, &[16, 8, 1, 1, 1, 3]);
        let guess = decode(&ticks)?;
        assert_eq!(guess.family, Some(Family::Nec));
        assert_eq!(
            guess.frames,
            vec![DecodedFrame::Bits(vec![DecodedBit::One, DecodedBit::Zero])]
        );
        Ok(())
    }

    #[test]
    fn test_nec_decode_without_leader_yields_no_frames() {
        // bit-sized durations only, no leader anywhere
        let times: Vec<f64> = vec![562.0, 562.0, 562.0, 1686.0];
        assert!(decode_nec(&times, 562.0).is_empty());
    }

    #[test]
    fn test_nec_repeat_marker() {
        // leader, one bit, then a 16T/4T repeat header past the frame end
        let mut times: Vec<f64> = vec![16.0 * 562.0, 8.0 * 562.0, 562.0, 562.0];
        // padding space pushes accumulated time past 108 ms
        times.push(562.0);
        times.push(170_000.0);
        times.push(16.0 * 562.0);
        times.push(4.0 * 562.0);

        let frames = decode_nec(&times, 562.0);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], DecodedFrame::Bits(vec![DecodedBit::One]));
        assert_eq!(frames[1], DecodedFrame::Repeat);
    }

    #[test]
    fn test_nec_roundtrip_32_bits() -> Result<()> {
        let payload: Vec<u8> = (0..32).map(|i| (i * 7 % 3 == 0) as u8).collect();

        let timing = ProtocolTiming::nec();
        let mut train = PulseTrain::new(&timing)?;
        train.append_bits(&payload)?;
        train.terminate_frame()?;
        let ticks = train.to_ticks();

        let guess = decode(&ticks)?;
        assert_eq!(guess.family, Some(Family::Nec));

        let decoded = match &guess.frames[0] {
            DecodedFrame::Bits(bits) => bits,
            other => panic!("expected a bit frame, got {:?}", other),
        };
        let decoded_values: Vec<u8> = decoded
            .iter()
            .map(|bit| match bit {
                DecodedBit::One => 1,
                DecodedBit::Zero => 0,
                DecodedBit::Unrecognized => panic!("unrecognized bit in clean signal"),
            })
            .collect();
        assert_eq!(decoded_values, payload);
        Ok(())
    }

    #[test]
    fn test_nec_roundtrip_with_repeats() -> Result<()> {
        let timing = ProtocolTiming::nec();
        let mut train = PulseTrain::new(&timing)?;
        train.append_bits(&[1u8, 0, 1, 0])?;
        train.terminate_frame()?;
        train.append_repeats(1)?;

        let guess = decode(&train.to_ticks())?;
        assert_eq!(guess.family, Some(Family::Nec));
        assert!(guess.frames.len() >= 2, "repeat frame not detected");
        assert_eq!(guess.frames[1], DecodedFrame::Repeat);
        Ok(())
    }

    #[test]
    fn test_classify_sony() -> Result<()> {
        // 4T pulse at T=450 leads; later entries don't matter for the match
        let ticks = vec![4 * 450 * 2, 450 * 2, 450 * 2];
        let c = classify(&ticks)?;
        assert_eq!(c.family, Family::Sony);
        Ok(())
    }

    #[test]
    fn test_sony_decode_is_a_known_gap() {
        let ticks = vec![4 * 450 * 2, 450 * 2, 450 * 2];
        assert!(matches!(
            decode(&ticks),
            Err(CodecError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_classify_iris_oyama() -> Result<()> {
        let ticks = vec![9 * 600 * 2, 9 * 600 * 2, 600 * 2];
        let c = classify(&ticks)?;
        assert_eq!(c.family, Family::IrisOyama);

        // detection works, decoding yields no frames
        let guess = decode(&ticks)?;
        assert_eq!(guess.family, Some(Family::IrisOyama));
        assert!(guess.frames.is_empty());
        Ok(())
    }

    #[test]
    fn test_decode_aeha_single_frame() -> Result<()> {
        // leader 8T/4T at T=425, then spaces 3T, 1T, 3T => bits 1, 0, 1
        let times_us: Vec<u16> = vec![3400, 1700, 425, 1275, 425, 425, 425, 1275];
        let ticks: Vec<u16> = times_us.iter().map(|&us| us * 2).collect();

        let guess = decode(&ticks)?;
        assert_eq!(guess.family, Some(Family::Aeha));
        assert_eq!(
            guess.frames,
            vec![DecodedFrame::Bits(vec![
                DecodedBit::One,
                DecodedBit::Zero,
                DecodedBit::One,
            ])]
        );
        Ok(())
    }

    #[test]
    fn test_decode_aeha_tracer_splits_frames() {
        let unit = 425.0;
        let times: Vec<f64> = vec![
            8.0 * unit, 4.0 * unit,   // leader
            unit, 3.0 * unit,          // bit 1
            unit, 20.0 * unit,         // tracer
            8.0 * unit, 4.0 * unit,    // fresh leader
            unit, unit,                // bit 0
        ];
        let frames = decode_aeha(&times, unit);
        assert_eq!(
            frames,
            vec![
                DecodedFrame::Bits(vec![DecodedBit::One]),
                DecodedFrame::Bits(vec![DecodedBit::Zero]),
            ]
        );
    }

    #[test]
    fn test_decode_aeha_tracer_recovery_skips_one_position() {
        // tracer with no leader behind it: decoder skips one position and
        // keeps going instead of aborting
        let unit = 425.0;
        let times: Vec<f64> = vec![
            8.0 * unit, 4.0 * unit,   // leader
            unit, 20.0 * unit,         // orphan tracer
            unit, unit,                // bit 0
            unit, 3.0 * unit,          // bit 1
        ];
        let frames = decode_aeha(&times, unit);
        assert_eq!(
            frames,
            vec![DecodedFrame::Bits(vec![DecodedBit::Zero, DecodedBit::One])]
        );
    }

    #[test]
    fn test_decode_aeha_unrecognized_space() {
        let unit = 425.0;
        // space of 2T matches neither bit shape
        let times: Vec<f64> = vec![8.0 * unit, 4.0 * unit, unit, 2.0 * unit];
        let frames = decode_aeha(&times, unit);
        assert_eq!(
            frames,
            vec![DecodedFrame::Bits(vec![DecodedBit::Unrecognized])]
        );
    }

    #[test]
    fn test_family_display() {
        assert_eq!(Family::Aeha.to_string(), "aeha");
        assert_eq!(Family::Nec.to_string(), "nec");
        assert_eq!(Family::Sony.to_string(), "sony");
        assert_eq!(Family::IrisOyama.to_string(), "iris-oyama");
    }

    #[test]
    fn test_decoded_bit_display() {
        assert_eq!(DecodedBit::Zero.to_string(), "0");
        assert_eq!(DecodedBit::One.to_string(), "1");
        assert_eq!(DecodedBit::Unrecognized.to_string(), "?");
    }
}
