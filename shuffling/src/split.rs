use core::num::NonZeroU64;

use anyhow::Result;
use tap::TryConv as _;

/// Start of piece `index` when a list of `list_size` elements is split into `chunks` pieces.
///
/// Equal to `list_size * index / chunks` rounded down. The product is computed without
/// overflow. `index` may exceed `chunks`, in which case the result may exceed `list_size`.
/// Fails if the result does not fit in [`u64`].
pub fn split_offset(list_size: u64, chunks: NonZeroU64, index: u64) -> Result<u64> {
    let offset = u128::from(list_size) * u128::from(index) / u128::from(chunks.get());
    Ok(offset.try_conv::<u64>()?)
}

/// Splits `list` into `chunks` contiguous pieces whose lengths differ by at most 1.
pub fn split_indices<T>(list: &[T], chunks: NonZeroU64) -> Result<Vec<&[T]>> {
    let list_size = list.len().try_conv::<u64>()?;

    (0..chunks.get())
        .map(|index| {
            let start = split_offset(list_size, chunks, index)?.try_conv::<usize>()?;
            let end = split_offset(list_size, chunks, index + 1)?.try_conv::<usize>()?;
            Ok(&list[start..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use itertools::Itertools as _;
    use nonzero_ext::nonzero;
    use test_case::test_case;
    use types::preset::{Mainnet, Preset as _};

    use super::*;

    #[test_case(30, 3, 2 => 20)]
    #[test_case(1000, 10, 60 => 6000)]
    #[test_case(2482, 10, 70 => 17374)]
    #[test_case(323, 98, 56 => 184)]
    #[test_case(273, 8, 6 => 204)]
    #[test_case(3274, 98, 256 => 8552)]
    #[test_case(23, 3, 2 => 15)]
    #[test_case(23, 3, 9 => 69)]
    fn split_offset_rounds_down(list_size: u64, chunks: u64, index: u64) -> u64 {
        let chunks = NonZeroU64::new(chunks).expect("test cases have nonzero chunk counts");
        split_offset(list_size, chunks, index).expect("test cases fit in u64")
    }

    #[test]
    fn split_offset_does_not_overflow() -> Result<()> {
        assert_eq!(split_offset(u64::MAX, nonzero!(4_u64), 2)?, u64::MAX / 2);
        Ok(())
    }

    #[test]
    fn split_offset_fails_when_result_exceeds_u64() {
        assert!(split_offset(u64::MAX, nonzero!(1_u64), 2).is_err());
        assert!(split_offset(u64::MAX, nonzero!(2_u64), 3).is_err());
    }

    #[test]
    fn split_indices_produces_pieces_of_equal_length() -> Result<()> {
        let list = (0..64000_u64).collect_vec();
        let pieces = split_indices(&list, Mainnet::SLOTS_PER_EPOCH)?;

        assert_eq!(pieces.len(), 32);
        assert!(pieces.iter().all(|piece| piece.len() == 2000));

        Ok(())
    }

    #[test]
    fn split_indices_agrees_with_split_offset() -> Result<()> {
        let list = (0..64000_u64).collect_vec();
        let chunks = nonzero!(6_u64);
        let pieces = split_indices(&list, chunks)?;

        for (index, piece) in (0..).zip(&pieces) {
            let start = split_offset(64000, chunks, index)?.try_conv::<usize>()?;
            let end = split_offset(64000, chunks, index + 1)?.try_conv::<usize>()?;
            assert_eq!(*piece, &list[start..end]);
        }

        assert_eq!(pieces.concat(), list);

        Ok(())
    }

    #[test]
    fn split_indices_handles_lists_shorter_than_chunk_count() -> Result<()> {
        let list = [1, 2, 3];
        let pieces = split_indices(&list, nonzero!(5_u64))?;

        assert_eq!(pieces.len(), 5);
        assert_eq!(pieces.concat(), list);
        assert!(pieces.iter().all(|piece| piece.len() <= 1));

        Ok(())
    }
}
