use exact_real::BoundedRational;
use num_bigint::BigInt;

#[test]
fn reduction_and_display() {
    let r = BoundedRational::from_ratio(BigInt::from(6), BigInt::from(8)).unwrap();
    assert_eq!(r.to_string(), "3/4");
}

#[test]
fn extract_square_reduced_matches_known_scenario() {
    // 343/352 = 7^3 / (2^5 * 11) -> extract 49/16 leaving 7/22.
    let r = BoundedRational::from_ratio(BigInt::from(343), BigInt::from(352)).unwrap();
    let (outer, inner) = r.extract_square_reduced().unwrap();
    assert_eq!(outer, BoundedRational::from_ratio(BigInt::from(7), BigInt::from(4)).unwrap());
    assert_eq!(inner, BoundedRational::from_ratio(BigInt::from(7), BigInt::from(22)).unwrap());
}

#[test]
fn division_by_zero_is_a_domain_error() {
    let one = BoundedRational::one();
    let zero = BoundedRational::zero();
    assert!(one.checked_div(&zero).is_err());
}

#[test]
fn null_propagates_and_compares_least() {
    let null = BoundedRational::null();
    let valid = BoundedRational::one();
    assert!(null.is_null());
    assert_eq!(null.compare_to(&null), 0);
    assert_eq!(null.compare_to(&valid), -1);
    assert!((&null + &valid).is_null());
}

#[test]
fn oversized_operands_nullify() {
    // A numerator with far more bits than MAX_SIZE should nullify rather
    // than carry an unbounded BigInt forward.
    let huge = BigInt::from(2).pow(20_000);
    let r = BoundedRational::from_big_int(huge);
    assert!((&r + &BoundedRational::one()).is_null());
}
