// THEORY:
// This file is the main entry point for the `color_census` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the web frontend and the
// terminal frontend).
//
// The primary goal is to export the `CensusPipeline` and its associated data
// structures (`CensusConfig`, `Census`, `DetectedColor`) as the clean,
// high-level interface for the whole detection pipeline. The individual stages
// live in `core_modules` and remain usable on their own, while the `naming`
// module carries the HTTP client for the color-naming service. Compute and
// networking are kept apart on purpose: the pipeline is synchronous and pure,
// naming is async and fallible in its own ways.

pub mod core_modules;
pub mod error;
pub mod naming;
pub mod pipeline;
