/// Format a number like a report would: rounded to an integer (half away from zero),
/// with `,` as thousands separator.
pub(crate) fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Round to `decimals` decimal places, half away from zero.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
macro_rules! assert_approx_eq {
	($left: expr, $right: expr, $tol: expr) => ({
		match ($left, $right, $tol) {
			(left_val , right_val, tol_val) => {
				let delta = (left_val - right_val).abs();
				if !(delta < tol_val) {
					panic!(
						"assertion failed: `(left ≈ right)` \
						(left: `{}`, right: `{}`) \
						with ∆={:1.1e} (allowed ∆={:e})",
						left_val , right_val, delta, tol_val
					)
				}
			}
		}
	});
	($left: expr, $right: expr) => (assert_approx_eq!(($left), ($right), 1e-15))
}

#[cfg(test)]
pub(crate) mod testing {
	use std::collections::HashMap;

	/// Cluster indices are arbitrary, so two labelings are equal when they describe the same partition.
	pub fn assert_same_partition(should: &[usize], actual: &[usize]) {
		assert_eq!(should.len(), actual.len());
		let mut idmap = HashMap::new();
		let mut idrevmap = HashMap::new();
		for idx in 0..should.len() {
			let (should_id, actual_id) = (should[idx], actual[idx]);
			let mapped = *idmap.entry(should_id).or_insert(actual_id);
			let rev_mapped = *idrevmap.entry(actual_id).or_insert(should_id);
			if mapped != actual_id || rev_mapped != should_id {
				panic!(
					"Cluster assignments different at idx {}.\nMapping(should -> actual): {:?}\nActual: {:?}\nShould: {:?}",
					idx, idmap, actual, should
				);
			}
		}
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn thousands_grouping() {
		assert_eq!(format_thousands(0.0), "0");
		assert_eq!(format_thousands(999.0), "999");
		assert_eq!(format_thousands(1000.0), "1,000");
		assert_eq!(format_thousands(85000.0), "85,000");
		assert_eq!(format_thousands(1234567.0), "1,234,567");
		assert_eq!(format_thousands(-4321.0), "-4,321");
	}

	#[test]
	fn thousands_rounds_half_away_from_zero() {
		assert_eq!(format_thousands(2499.5), "2,500");
		assert_eq!(format_thousands(2499.49), "2,499");
		assert_eq!(format_thousands(-0.4), "0");
	}

	#[test]
	fn rounding_to_decimals() {
		assert_approx_eq!(round_to(41.256, 2), 41.26, 1e-12);
		assert_approx_eq!(round_to(41.254, 2), 41.25, 1e-12);
		assert_approx_eq!(round_to(-3.005_1, 2), -3.01, 1e-12);
	}

	#[test]
	fn partition_comparison_ignores_label_names() {
		testing::assert_same_partition(&[0, 0, 1, 2], &[2, 2, 0, 1]);
	}

	#[test]
	#[should_panic]
	fn partition_comparison_detects_split() {
		testing::assert_same_partition(&[0, 0, 1], &[0, 1, 1]);
	}
}
