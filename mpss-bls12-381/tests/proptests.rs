use lazy_static::lazy_static;
use mpss_bls12_381::*;
use mpss_core::tests::proptests::{polynomial_case, MAX_DEGREE};
use proptest::prelude::*;

lazy_static! {
    static ref KEY: CommitmentKey = CommitmentKey::insecure_fixed(MAX_DEGREE);
}

proptest! {

    #[test]
    fn interpolation_round_trip(case in polynomial_case()) {
        prop_assert!(case.check_round_trip::<Bls12381>());
    }

    #[test]
    fn commitment_homomorphism(case in polynomial_case()) {
        prop_assert!(case.check_homomorphism::<Bls12381>(&KEY));
    }

}
