//! Integration tests for the map engine using the `TestMap` harness.
//!
//! These tests spin up a headless Bevy App with `MapEnginePlugin` and verify
//! behavior across ingest, selection, fetch, viewport and render systems.

mod lod_tests;
mod selection_tests;
