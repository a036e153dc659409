//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the
//! controller against the simulated engine.  All tests run on the host
//! (x86_64) with no real hardware required.

mod oneshot_tests;
