//! PNG row predictors (`/Predictor` 10..=15) applied after Flate or LZW decoding.

use std::io::{Error, ErrorKind, Result};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
}

impl TryFrom<u8> for FilterType {
    type Error = u8;

    fn try_from(n: u8) -> std::result::Result<FilterType, u8> {
        match n {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Avg),
            4 => Ok(FilterType::Paeth),
            other => Err(other),
        }
    }
}

fn paeth_predict(left: u8, above: u8, upperleft: u8) -> u8 {
    let estimate = i16::from(left) + i16::from(above) - i16::from(upperleft);

    let dist_left = (estimate - i16::from(left)).abs();
    let dist_above = (estimate - i16::from(above)).abs();
    let dist_upperleft = (estimate - i16::from(upperleft)).abs();

    if dist_left <= dist_above && dist_left <= dist_upperleft {
        left
    } else if dist_above <= dist_upperleft {
        above
    } else {
        upperleft
    }
}

fn decode_row(filter: FilterType, bpp: usize, previous: &[u8], current: &mut [u8]) {
    let len = current.len();
    let bpp = bpp.min(len);

    match filter {
        FilterType::None => (),
        FilterType::Sub => {
            for i in bpp..len {
                current[i] = current[i].wrapping_add(current[i - bpp]);
            }
        }
        FilterType::Up => {
            for i in 0..len {
                current[i] = current[i].wrapping_add(previous[i]);
            }
        }
        FilterType::Avg => {
            for i in 0..len {
                let left = if i >= bpp { u16::from(current[i - bpp]) } else { 0 };
                current[i] = current[i].wrapping_add(((left + u16::from(previous[i])) / 2) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..len {
                let (left, upperleft) = if i >= bpp {
                    (current[i - bpp], previous[i - bpp])
                } else {
                    (0, 0)
                };
                current[i] = current[i].wrapping_add(paeth_predict(left, previous[i], upperleft));
            }
        }
    }
}

/// Longest predictor row accepted, in bytes.
pub const MAX_ROW_BYTES: usize = 1 << 24;

/// Undo PNG prediction. Each row starts with a filter-type byte; a truncated final
/// row is decoded as far as it goes.
pub fn decode_frame(content: &[u8], bytes_per_pixel: usize, pixels_per_row: usize) -> Result<Vec<u8>> {
    let bytes_per_row = bytes_per_pixel
        .checked_mul(pixels_per_row)
        .filter(|&n| bytes_per_pixel > 0 && (1..=MAX_ROW_BYTES).contains(&n))
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("PNG row of {} x {} bytes is out of range", pixels_per_row, bytes_per_pixel),
            )
        })?;
    let mut previous = vec![0_u8; bytes_per_row];
    let mut current = vec![0_u8; bytes_per_row];
    let mut decoded = Vec::with_capacity(content.len());

    for row in content.chunks(bytes_per_row + 1) {
        let filter = FilterType::try_from(row[0])
            .map_err(|n| Error::new(ErrorKind::InvalidData, format!("invalid PNG filter type ({})", n)))?;
        let data = &row[1..];
        current[..data.len()].copy_from_slice(data);
        current[data.len()..].fill(0);

        decode_row(filter, bytes_per_pixel, &previous, &mut current);
        decoded.extend_from_slice(&current[..data.len()]);
        mem::swap(&mut previous, &mut current);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_filter_accumulates_rows() {
        let content = [2, 1, 2, 2, 1, 1];
        let decoded = decode_frame(&content, 1, 2).unwrap();
        assert_eq!(decoded, vec![1, 2, 2, 3]);
    }

    #[test]
    fn sub_filter_uses_left_neighbour() {
        let content = [1, 5, 1, 1];
        assert_eq!(decode_frame(&content, 1, 3).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn rejects_unknown_filter_byte() {
        assert!(decode_frame(&[9, 0, 0], 1, 2).is_err());
    }

    #[test]
    fn rejects_oversized_rows() {
        assert_eq!(decode_frame(&[0], usize::MAX, 2).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(decode_frame(&[0], 1, MAX_ROW_BYTES + 1).is_err());
        assert!(decode_frame(&[0], 0, 4).is_err());
    }
}
