//! Budget-fit JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, RgbImage};

use super::IngestError;

/// Quality search parameters.
///
/// The ladder is walked greedily from `start` down to `floor` in `step`
/// decrements; `last_resort` is tried once after that. A handful of encodes
/// keeps the search cheap and every outcome reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityLadder {
    pub start: u8,
    pub floor: u8,
    pub step: u8,
    pub last_resort: u8,
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self {
            start: 80,
            floor: 40,
            step: 5,
            last_resort: 35,
        }
    }
}

impl QualityLadder {
    /// Qualities in the order they are attempted, each clamped to `1..=100`.
    ///
    /// ```
    /// use showcase_core::photo::QualityLadder;
    ///
    /// let ladder = QualityLadder { start: 50, floor: 40, step: 5, last_resort: 30 };
    /// assert_eq!(ladder.steps(), vec![50, 45, 40, 30]);
    /// ```
    pub fn steps(&self) -> Vec<u8> {
        let step = self.step.max(1);
        let floor = self.floor.clamp(1, 100);
        let mut q = self.start.clamp(1, 100);

        let mut steps = Vec::new();
        while q >= floor {
            steps.push(q);
            match q.checked_sub(step) {
                Some(next) => q = next,
                None => break,
            }
        }

        let last = self.last_resort.clamp(1, 100);
        if !steps.contains(&last) {
            steps.push(last);
        }
        steps
    }
}

/// Encode an RGB image as baseline JPEG at `quality`.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(image)?;
    Ok(out)
}

/// Encode at the highest ladder quality whose output is within `max_bytes`.
///
/// Returns the encoded bytes together with the quality used. Fails with
/// [`IngestError::CannotFit`] when even the last resort is too large.
pub(crate) fn fit_to_budget(
    image: &RgbImage,
    ladder: &QualityLadder,
    max_bytes: usize,
) -> Result<(Vec<u8>, u8), IngestError> {
    let mut smallest = usize::MAX;

    for quality in ladder.steps() {
        let encoded = encode_jpeg(image, quality).map_err(IngestError::Encode)?;
        if encoded.len() <= max_bytes {
            return Ok((encoded, quality));
        }
        smallest = smallest.min(encoded.len());
    }

    Err(IngestError::CannotFit {
        limit: max_bytes,
        smallest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ladder_matches_documented_sequence() {
        assert_eq!(
            QualityLadder::default().steps(),
            vec![80, 75, 70, 65, 60, 55, 50, 45, 40, 35]
        );
    }

    #[test]
    fn zero_step_does_not_loop_forever() {
        let ladder = QualityLadder {
            start: 42,
            floor: 40,
            step: 0,
            last_resort: 10,
        };
        assert_eq!(ladder.steps(), vec![42, 41, 40, 10]);
    }

    #[test]
    fn last_resort_inside_ladder_is_not_repeated() {
        let ladder = QualityLadder {
            start: 60,
            floor: 40,
            step: 10,
            last_resort: 50,
        };
        assert_eq!(ladder.steps(), vec![60, 50, 40]);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let ladder = QualityLadder {
            start: 250,
            floor: 95,
            step: 5,
            last_resort: 0,
        };
        assert_eq!(ladder.steps(), vec![100, 95, 1]);
    }
}
