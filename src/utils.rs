//! Small helpers shared across modules

/// Index of the largest value; the first one wins on ties.
///
/// Returns `None` for an empty slice.
pub fn index_max<T: PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in values.iter().enumerate() {
        match best {
            Some(b) if values[b] >= *v => {}
            _ => best = Some(i),
        }
    }
    best
}
