//! Integration tests: full load → evaluate → report pipeline.

mod mock_source;
mod simulation;
