/// Stamp a test body out once per population size, binding the size to `N`
#[macro_export]
macro_rules! test_n {
  ($name:ident[N: $($n:literal)|*]() $body:tt ) => {$(
      ::paste::paste! {
          #[test]
          fn [<test_ $name _ $n>]() {
            const N: usize = $n;
            $body
          }
      }
  )+};
}

/// Float equality within 1e-12, or within an explicit tolerance
#[macro_export]
macro_rules! assert_f64_approx {
    ($l:expr, $r:expr) => {
        $crate::assert_f64_approx!($l, $r, 1e-12)
    };
    ($l:expr, $r:expr, $tol:expr) => {
        assert!(
            ($l - $r).abs() < $tol,
            "assertion failed: {} !~ {}",
            $l,
            $r
        )
    };
}
