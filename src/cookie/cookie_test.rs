use super::*;

#[test]
fn equality_is_byte_wise() {
    let a = Cookie::new([1; COOKIE_LENGTH]);
    let b = Cookie::new([1; COOKIE_LENGTH]);
    let c = Cookie::new([2; COOKIE_LENGTH]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn random_distinct_from_never_collides_with_fixed_peer() {
    let theirs = Cookie::new([9; COOKIE_LENGTH]);
    for _ in 0..64 {
        let ours = Cookie::random_distinct_from(&theirs);
        assert_ne!(ours, theirs);
    }
}
