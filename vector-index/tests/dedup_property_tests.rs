//! Property tests for source deduplication.

use proptest::prelude::*;
use vector_index::deduplicate;

/// **Property: deduplication preserves first-seen order**
/// *For any* sequence with repeats, the output equals the distinct values in
/// order of first appearance.
mod prop_first_seen_order {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn output_is_distinct_values_in_first_seen_order(
            objects in proptest::collection::vec(0u8..10, 0..40),
        ) {
            let result = deduplicate(objects.clone(), &[]);

            let mut expected = Vec::new();
            for object in &objects {
                if !expected.contains(object) {
                    expected.push(*object);
                }
            }
            prop_assert_eq!(result, expected);
        }
    }
}

/// **Property: exclusions never survive deduplication**
/// *For any* sequence and exclusion set, no excluded value is returned, even
/// when it repeats or is not the first occurrence, and every other distinct
/// value is kept.
mod prop_exclusions {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn excluded_values_are_never_returned(
            objects in proptest::collection::vec(0u8..10, 0..40),
            exclusions in proptest::collection::vec(0u8..10, 0..4),
        ) {
            let result = deduplicate(objects.clone(), &exclusions);

            for excluded in &exclusions {
                prop_assert!(!result.contains(excluded));
            }
            for object in &objects {
                prop_assert_eq!(result.contains(object), !exclusions.contains(object));
            }
            for (i, object) in result.iter().enumerate() {
                prop_assert!(!result[i + 1..].contains(object), "duplicate {} in output", object);
            }
        }
    }
}
