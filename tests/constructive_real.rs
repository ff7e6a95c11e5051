use exact_real::ConstructiveReal;
use num_bigint::BigInt;

#[test]
fn exp_of_one_matches_eulers_number() {
    let e = ConstructiveReal::one().exp();
    let s = e.to_string(15).unwrap();
    assert!(s.starts_with("2.71828182845904"), "got {s}");
}

#[test]
fn pi_cosine_is_minus_one() {
    let cos_pi = ConstructiveReal::pi().cos();
    let minus_one = ConstructiveReal::from_int(-1);
    assert_eq!(cos_pi.compare_to(&minus_one, -50).unwrap(), 0);
}

#[test]
fn atan_pi_agrees_with_machin_pi() {
    let pi = ConstructiveReal::pi();
    let atan_pi = ConstructiveReal::atan_pi();
    assert_eq!(pi.compare_to(&atan_pi, -50).unwrap(), 0);
}

#[test]
fn sqrt_of_two_squared_is_two() {
    let sqrt2 = ConstructiveReal::from_int(2).sqrt();
    let squared = sqrt2.mul(&sqrt2);
    assert_eq!(squared.compare_to(&ConstructiveReal::from_int(2), -60).unwrap(), 0);
}

#[test]
fn ln_and_exp_are_inverse() {
    let three = ConstructiveReal::from_int(3);
    let round_trip = three.ln().exp();
    assert_eq!(round_trip.compare_to(&three, -40).unwrap(), 0);
}

#[test]
fn from_str_radix_parses_decimal_fraction() {
    let v = ConstructiveReal::from_str_radix("3.25", 10).unwrap();
    let expected = ConstructiveReal::from_ratio(BigInt::from(13), BigInt::from(4));
    assert_eq!(v.compare_to(&expected, -40).unwrap(), 0);
}

#[test]
fn approx_contract_is_within_one_unit() {
    let x = ConstructiveReal::from_ratio(BigInt::from(22), BigInt::from(7));
    for p in [-10, -40, -80] {
        let appr = x.approx(p).unwrap();
        let reconstructed = ConstructiveReal::from_big_int(appr).shift(p);
        // An error of at most one unit at precision `p` is invisible two
        // bits coarser.
        assert_eq!(reconstructed.compare_to(&x, p + 2).unwrap(), 0);
    }
}
