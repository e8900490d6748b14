//! Cross-module tests for the octree index
//!
//! Structural invariants are checked by walking every region after random
//! sequences of operations; search results are compared with `LinearScan`.
