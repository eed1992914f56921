//! Result Reassembler.

use serde::{Deserialize, Serialize};
use tracing::warn;

use scenecast_models::RenderedSegment;

use crate::error::ReassemblyError;

/// Handling of scenes that produced no segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fail the job, naming the missing scenes.
    #[default]
    Reject,
    /// Log the gap and assemble what was rendered.
    Tolerate,
}

/// Restore submission order over the segments of a storyboard of `expected`
/// scenes.
pub fn reassemble(
    mut segments: Vec<RenderedSegment>,
    expected: usize,
    policy: GapPolicy,
) -> Result<Vec<RenderedSegment>, ReassemblyError> {
    if segments.is_empty() {
        return Err(ReassemblyError::Empty);
    }

    segments.sort_by_key(|s| s.order_index);

    if let Some(pair) = segments
        .windows(2)
        .find(|pair| pair[0].order_index == pair[1].order_index)
    {
        return Err(ReassemblyError::Duplicate(pair[0].order_index));
    }

    if let Some(last) = segments.last() {
        if last.order_index >= expected {
            return Err(ReassemblyError::OutOfRange {
                index: last.order_index,
                expected,
            });
        }
    }

    let missing = missing_indices(&segments, expected);
    if !missing.is_empty() {
        match policy {
            GapPolicy::Reject => return Err(ReassemblyError::Missing(missing)),
            GapPolicy::Tolerate => warn!(
                missing = ?missing,
                rendered = segments.len(),
                expected,
                "Assembling storyboard with missing scenes"
            ),
        }
    }

    Ok(segments)
}

/// Indices in `0..expected` with no segment. `segments` must be sorted.
fn missing_indices(segments: &[RenderedSegment], expected: usize) -> Vec<usize> {
    let mut present = segments.iter().map(|s| s.order_index).peekable();
    (0..expected)
        .filter(|i| {
            if present.peek() == Some(i) {
                present.next();
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(indices: &[usize]) -> Vec<RenderedSegment> {
        indices
            .iter()
            .map(|&i| RenderedSegment::new(i, format!("/scratch/w{}_scene_{}.mp4", i % 2, i)))
            .collect()
    }

    fn order(segments: &[RenderedSegment]) -> Vec<usize> {
        segments.iter().map(|s| s.order_index).collect()
    }

    #[test]
    fn test_sorts_worker_batches_back_into_order() {
        // worker 0 then worker 1, as collected from dispatch
        let out = reassemble(segments(&[0, 2, 4, 1, 3]), 5, GapPolicy::Reject).unwrap();
        assert_eq!(order(&out), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_integrity_violations() {
        assert_eq!(
            reassemble(Vec::new(), 3, GapPolicy::Tolerate),
            Err(ReassemblyError::Empty)
        );
        assert_eq!(
            reassemble(segments(&[0, 1, 1]), 3, GapPolicy::Tolerate),
            Err(ReassemblyError::Duplicate(1))
        );
        assert_eq!(
            reassemble(segments(&[0, 1, 3]), 3, GapPolicy::Tolerate),
            Err(ReassemblyError::OutOfRange { index: 3, expected: 3 })
        );
    }

    #[test]
    fn test_gap_policy() {
        assert_eq!(
            reassemble(segments(&[3, 0]), 5, GapPolicy::Reject),
            Err(ReassemblyError::Missing(vec![1, 2, 4]))
        );

        let out = reassemble(segments(&[3, 0]), 5, GapPolicy::Tolerate).unwrap();
        assert_eq!(order(&out), vec![0, 3]);
    }

    #[test]
    fn test_default_policy_rejects() {
        assert_eq!(GapPolicy::default(), GapPolicy::Reject);
    }
}
