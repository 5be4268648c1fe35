//! Proptest strategies shared with downstream crates' tests.
