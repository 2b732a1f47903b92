use proptest::prelude::*;
use rstest::rstest;
use scale_core::{CalibrationPoint, CalibrationTable, WeightConverter};

fn table(points: &[(i32, f64)]) -> CalibrationTable {
    let pts = points
        .iter()
        .enumerate()
        .map(|(i, &(w, adc))| CalibrationPoint {
            ordinal: i,
            nominal_g: w,
            target_g: w,
            adc_average: adc,
            samples: 300,
        })
        .collect();
    CalibrationTable::new(pts).unwrap()
}

fn reference() -> WeightConverter {
    WeightConverter::new(&table(&[
        (0, 1000.0),
        (500, 1500.0),
        (5000, 6000.0),
        (20000, 21000.0),
    ]))
}

#[rstest]
#[case::inside_second_segment(3500.0, 2500.0)]
#[case::below_range(500.0, -500.0)]
#[case::above_range(25000.0, 24000.0)]
#[case::exact_first_point(1000.0, 0.0)]
#[case::exact_last_point(21000.0, 20000.0)]
fn reference_table(#[case] adc: f64, #[case] expected: f64) {
    let got = reference().convert(adc);
    assert!((got - expected).abs() < 1e-9, "convert({adc}) = {got}");
}

#[test]
fn degenerate_pair_has_no_division_error() {
    let c = WeightConverter::new(&table(&[(100, 5000.0), (200, 5000.0)]));
    assert_eq!(c.convert(5000.0), 100.0);
}

prop_compose! {
    /// 2..8 points with strictly increasing ADC and arbitrary weights.
    fn calibration_points()(
        len in 2usize..8,
    )(
        steps in prop::collection::vec(1.0f64..5_000.0, len),
        weights in prop::collection::vec(0i32..50_000, len),
        start in -10_000.0f64..10_000.0,
    ) -> Vec<(i32, f64)> {
        let mut adc = start;
        steps
            .iter()
            .zip(weights)
            .map(|(step, w)| {
                adc += step;
                (w, adc)
            })
            .collect()
    }
}

proptest! {
    #[test]
    fn passes_through_every_point(points in calibration_points()) {
        let c = WeightConverter::new(&table(&points));
        for &(w, adc) in &points {
            prop_assert!((c.convert(adc) - f64::from(w)).abs() < 1e-6);
        }
    }

    #[test]
    fn continuous_at_interior_points(points in calibration_points()) {
        let c = WeightConverter::new(&table(&points));
        let eps = 1e-7;
        for &(_, adc) in &points[1..points.len() - 1] {
            let left = c.convert(adc - eps);
            let right = c.convert(adc + eps);
            prop_assert!((left - right).abs() < 5e-2, "jump at {adc}: {left} vs {right}");
        }
    }

    #[test]
    fn linear_within_each_segment(points in calibration_points(), t in 0.0f64..=1.0) {
        let c = WeightConverter::new(&table(&points));
        for pair in points.windows(2) {
            let (w1, a1) = (f64::from(pair[0].0), pair[0].1);
            let (w2, a2) = (f64::from(pair[1].0), pair[1].1);
            let adc = a1 + t * (a2 - a1);
            let expected = w1 + t * (w2 - w1);
            prop_assert!((c.convert(adc) - expected).abs() < 1e-6 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn input_order_is_irrelevant(points in calibration_points(), adc in -20_000.0f64..60_000.0) {
        let forward = WeightConverter::new(&table(&points));
        let mut rev = points.clone();
        rev.reverse();
        let backward = WeightConverter::new(&table(&rev));
        prop_assert_eq!(forward.convert(adc), backward.convert(adc));
    }
}
