//! Per-frame ordering of the map engine via `SystemSet` phases.
//!
//! ```text
//! Ingest  →  Interaction  →  Fetch  →  Viewport  →  Render
//! ```
//!
//! * **Ingest** – `ResetMap` and `LoadMapData` handling; replaces `MapData`
//!   and may queue selection events.
//! * **Interaction** – the selection controller consumes `MapEvent`s, starts
//!   viewport fits and issues listing fetch requests.
//! * **Fetch** – spawns, polls and commits spatial listing queries.
//! * **Viewport** – advances the fit animation and reports bounds at rest.
//! * **Render** – rebuilds or restyles the layers in `RenderState`.
//!
//! Drawing surfaces read `RenderState` after `Render`; input surfaces that
//! emit `MapEvent`s may run anywhere, since events are read on the next
//! pass of `Interaction` at the latest.

use bevy::prelude::*;

/// Ordered phases for the engine's `Update` systems, configured as a chain.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapEngineSet {
    Ingest,
    Interaction,
    Fetch,
    Viewport,
    Render,
}
