use std::cmp::Ordering;

/// argmax returns the index of the maximum value in the array x, which must not be empty. For
/// equal maxima the first index wins.
pub fn argmax<T: std::cmp::PartialOrd + std::marker::Copy>(x: &[T]) -> usize {
    let mut idx_max = 0;
    let mut val_max = x[0];

    for (i, &val) in x.iter().enumerate().skip(1) {
        if val > val_max {
            val_max = val;
            idx_max = i;
        }
    }

    idx_max
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their relative order. Incomparable values (NaN) count as equal.
pub fn argsort<T: std::cmp::PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => {
            indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_of_equal_maxima() {
        assert_eq!(argmax(&[1, 7, 3, 7]), 1);
        assert_eq!(argmax(&[4.0]), 0);
    }

    #[test]
    fn argsort_descending_is_stable() {
        let x = [10.0, 55.5, 10.0, 100.0];
        assert_eq!(argsort(&x, SortOrder::Descending), vec![3, 1, 0, 2]);
        assert_eq!(argsort(&x, SortOrder::Ascending), vec![0, 2, 1, 3]);
    }
}
