//! Placement of caller-supplied exemplars onto histogram buckets.
//!
//! Exemplars must arrive sorted ascending by value. They are not re-sorted here; an
//! unsorted slice gives an unspecified (but panic-free) assignment.

use tracing::debug;

use crate::{
    exemplar::Exemplar,
    types::{Bucket, HistogramSnapshot},
};

/// Attaches at most one exemplar to each bucket.
///
/// Each bucket takes the largest not-yet-consumed exemplar whose value is at or below
/// its upper bound, consuming it and everything before it. If exemplars remain once
/// the declared buckets are exhausted, a `+Inf` bucket holding the total count is
/// appended for the next unplaced exemplar. The rest are dropped.
///
/// The overflow bucket is added whenever the last exemplar lies above every declared
/// bound, even if there are fewer exemplars than buckets. A snapshot that already ends
/// in a `+Inf` bucket can still get a second one when a NaN exemplar is left over, so
/// encoders may see two `le="+Inf"` buckets.
pub fn place_exemplars(mut snapshot: HistogramSnapshot, exemplars: &[Exemplar]) -> HistogramSnapshot {
    if exemplars.is_empty() {
        return snapshot;
    }

    let mut pointer = 0_usize;
    for bucket in &mut snapshot.buckets {
        let fits = exemplars[pointer..]
            .iter()
            .take_while(|exemplar| exemplar.value <= bucket.upper_bound)
            .count();
        if fits > 0 {
            pointer += fits;
            bucket.exemplar = Some(exemplars[pointer - 1].clone());
        }
    }

    if let Some(next) = exemplars.get(pointer) {
        let discarded = exemplars.len() - pointer - 1;
        debug!(
            exemplar = next.value,
            discarded, "exemplars exceed declared buckets, adding +Inf bucket"
        );
        snapshot.buckets.push(Bucket {
            upper_bound: f64::INFINITY,
            cumulative_count: snapshot.sample_count,
            exemplar: Some(next.clone()),
        });
    }

    snapshot
}

/// Counters, gauges and untyped metrics keep a single exemplar: the last one
/// supplied.
pub fn retain_scalar_exemplar(exemplars: &[Exemplar]) -> Option<Exemplar> {
    if exemplars.len() > 1 {
        debug!(
            discarded = exemplars.len() - 1,
            "scalar metric keeps only the last exemplar"
        );
    }
    exemplars.last().cloned()
}

#[cfg(test)]
mod tests {
    use super::{place_exemplars, retain_scalar_exemplar};
    use crate::{exemplar::Exemplar, types::HistogramSnapshot};

    fn exemplars(values: &[f64]) -> Vec<Exemplar> {
        values
            .iter()
            .map(|value| Exemplar::new(*value, [("trace_id", "t")], None).unwrap())
            .collect()
    }

    fn histogram(bounds: &[f64]) -> HistogramSnapshot {
        let counts = bounds.iter().map(|bound| (*bound, 1)).collect::<Vec<_>>();
        HistogramSnapshot::from_bucket_counts(bounds.len() as u64 + 3, 17.0, &counts)
    }

    fn placed(snapshot: &HistogramSnapshot) -> Vec<Option<f64>> {
        snapshot
            .buckets
            .iter()
            .map(|bucket| bucket.exemplar.as_ref().map(|exemplar| exemplar.value))
            .collect()
    }

    #[test]
    fn overflow_takes_next_unplaced_exemplar() {
        let snapshot = place_exemplars(
            histogram(&[25.0, 50.0, 100.0, 200.0]),
            &exemplars(&[24.0, 25.1, 42.0, 89.0, 100.0, 157.0, 500.0, 2000.0]),
        );

        assert_eq!(
            placed(&snapshot),
            vec![
                Some(24.0),
                Some(42.0),
                Some(100.0),
                Some(157.0),
                Some(500.0)
            ]
        );
        let overflow = &snapshot.buckets[4];
        assert_eq!(overflow.upper_bound, f64::INFINITY);
        assert_eq!(overflow.cumulative_count, snapshot.sample_count);
    }

    #[test]
    fn fewer_exemplars_than_buckets() {
        let snapshot = place_exemplars(histogram(&[10.0, 20.0]), &exemplars(&[5.0]));
        assert_eq!(placed(&snapshot), vec![Some(5.0), None]);
    }

    #[test]
    fn no_exemplars_leaves_snapshot_untouched() {
        let original = histogram(&[10.0, 20.0]);
        let snapshot = place_exemplars(original.clone(), &[]);
        assert_eq!(snapshot, original);
        assert_eq!(placed(&snapshot), vec![None, None]);
    }

    #[test]
    fn skipped_bucket_does_not_move_the_cursor() {
        let snapshot = place_exemplars(histogram(&[1.0, 2.0, 3.0]), &exemplars(&[2.5, 2.9]));
        assert_eq!(placed(&snapshot), vec![None, None, Some(2.9)]);
    }

    #[test]
    fn exact_fit_adds_no_overflow_bucket() {
        let snapshot = place_exemplars(histogram(&[1.0, 2.0]), &exemplars(&[0.5, 1.5]));
        assert_eq!(snapshot.buckets.len(), 2);
        assert_eq!(placed(&snapshot), vec![Some(0.5), Some(1.5)]);
    }

    #[test]
    fn declared_inf_bucket_absorbs_the_tail() {
        let snapshot = place_exemplars(
            histogram(&[1.0, f64::INFINITY]),
            &exemplars(&[0.5, 7.0, 9.0]),
        );
        assert_eq!(snapshot.buckets.len(), 2);
        assert_eq!(placed(&snapshot), vec![Some(0.5), Some(9.0)]);
    }

    #[test]
    fn no_buckets_at_all() {
        let snapshot = place_exemplars(histogram(&[]), &exemplars(&[3.0, 4.0]));
        assert_eq!(placed(&snapshot), vec![Some(3.0)]);
        assert_eq!(snapshot.buckets[0].upper_bound, f64::INFINITY);
    }

    #[test]
    fn assignment_is_monotonic_and_bounded() {
        let bounds = [1.0, 2.0, 4.0, 8.0];
        let values = [0.1, 0.2, 1.5, 3.0, 3.5, 9.0, 10.0, 11.0, 12.0];
        for take in 0..=values.len() {
            let snapshot = place_exemplars(histogram(&bounds), &exemplars(&values[..take]));
            let attached = snapshot
                .exemplars()
                .map(|exemplar| exemplar.value)
                .collect::<Vec<_>>();

            assert!(attached.windows(2).all(|pair| pair[0] <= pair[1]));
            assert!(attached.len() <= bounds.len() + 1);

            let all_fit = values[..take]
                .last()
                .is_none_or(|value| *value <= bounds[bounds.len() - 1]);
            assert_eq!(snapshot.buckets.len() == bounds.len(), all_fit, "take={take}");
        }
    }

    #[test]
    fn single_exemplar_above_all_bounds_still_overflows() {
        let snapshot = place_exemplars(histogram(&[10.0, 20.0]), &exemplars(&[50.0]));

        assert_eq!(placed(&snapshot), vec![None, None, Some(50.0)]);
        assert_eq!(snapshot.buckets[2].upper_bound, f64::INFINITY);
        assert_eq!(snapshot.buckets[2].cumulative_count, snapshot.sample_count);
    }

    #[test]
    fn nan_exemplar_next_to_declared_inf_bucket() {
        let snapshot = place_exemplars(
            histogram(&[1.0, f64::INFINITY]),
            &exemplars(&[0.5, f64::NAN]),
        );

        let bounds = snapshot
            .buckets
            .iter()
            .map(|bucket| bucket.upper_bound)
            .collect::<Vec<_>>();
        assert_eq!(bounds, vec![1.0, f64::INFINITY, f64::INFINITY]);
        assert!(snapshot.buckets[1].exemplar.is_none());
        assert!(
            snapshot.buckets[2]
                .exemplar
                .as_ref()
                .is_some_and(|exemplar| exemplar.value.is_nan())
        );
    }

    #[test]
    fn scalar_keeps_the_last_exemplar() {
        assert!(retain_scalar_exemplar(&[]).is_none());
        let kept = retain_scalar_exemplar(&exemplars(&[1.0, 2.0, 3.0]));
        assert_eq!(kept.map(|exemplar| exemplar.value), Some(3.0));
    }
}
