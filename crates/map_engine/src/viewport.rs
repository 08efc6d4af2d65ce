//! Viewport state and the controller that moves it.
//!
//! [`ViewportState`] is the actual view (center, continuous zoom, screen
//! size). [`ViewportController`] owns the single animation slot: every fit
//! or reset request replaces whatever animation is in flight, so the last
//! request always wins. User pan/zoom jumps immediately and cancels the
//! animation.
//!
//! Fit-to-all is deduplicated by community count only. Swapping one set for
//! a different set of the same size does not re-frame the view.

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::config::{MapConfig, DEFAULT_VIEW_SIZE};
use crate::geo::{project, unproject, zoom_to_fit, Bounds, LatLng};
use crate::model::{Community, CommunityId};
use crate::selection::MapNotification;

// =============================================================================
// State
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub center: LatLng,
    pub zoom: f64,
    /// Screen size in pixels.
    pub size: DVec2,
}

impl FromWorld for ViewportState {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource_or_insert_with(MapConfig::default).clone();
        Self::new(
            config.default_center,
            config.default_zoom,
            DVec2::new(DEFAULT_VIEW_SIZE.0, DEFAULT_VIEW_SIZE.1),
        )
    }
}

impl ViewportState {
    pub fn new(center: LatLng, zoom: f64, size: DVec2) -> Self {
        Self { center, zoom, size }
    }

    fn center_px(&self) -> DVec2 {
        project(self.center, self.zoom)
    }

    /// Screen position (origin top-left) of a geographic point.
    pub fn to_screen(&self, p: LatLng) -> DVec2 {
        project(p, self.zoom) - self.center_px() + self.size * 0.5
    }

    /// Geographic point under a screen position.
    pub fn from_screen(&self, screen: DVec2) -> LatLng {
        unproject(self.center_px() + screen - self.size * 0.5, self.zoom)
    }

    /// Geographic box currently on screen.
    pub fn bounds(&self) -> Bounds {
        let nw = self.from_screen(DVec2::ZERO);
        let se = self.from_screen(self.size);
        Bounds::new(nw.lat, se.lat, se.lng, nw.lng)
    }
}

// =============================================================================
// Animation
// =============================================================================

/// What an animation is framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitKind {
    AllCommunities,
    Community(CommunityId),
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTarget {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewAnimation {
    pub kind: FitKind,
    from: ViewTarget,
    pub to: ViewTarget,
    elapsed: f32,
    duration: f32,
}

impl ViewAnimation {
    fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0) as f64
        }
    }

    fn sample(&self) -> ViewTarget {
        let t = ease_in_out_cubic(self.progress());
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        ViewTarget {
            center: LatLng::new(
                lerp(self.from.center.lat, self.to.center.lat),
                lerp(self.from.center.lng, self.to.center.lng),
            ),
            zoom: lerp(self.from.zoom, self.to.zoom),
        }
    }
}

#[inline]
fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Center and zoom framing `bounds` inside `size` with `padding`, capped at
/// `max_zoom`. The center is the midpoint in projected space.
pub fn fit_target(
    bounds: &Bounds,
    size: DVec2,
    padding: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> ViewTarget {
    let zoom = zoom_to_fit(bounds, size, padding).clamp(min_zoom, max_zoom);
    let nw = project(LatLng::new(bounds.north, bounds.west), zoom);
    let se = project(LatLng::new(bounds.south, bounds.east), zoom);
    ViewTarget {
        center: unproject((nw + se) * 0.5, zoom),
        zoom,
    }
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Resource, Default, Debug)]
pub struct ViewportController {
    /// Community count of the last fit-to-all that actually ran.
    last_fit_count: Option<usize>,
    animation: Option<ViewAnimation>,
    last_emitted: Option<Bounds>,
}

impl ViewportController {
    /// Frame the union of every community footprint. A no-op when the count
    /// matches the last fitted count, or when nothing has a footprint.
    pub fn fit_to_communities(
        &mut self,
        view: &ViewportState,
        communities: &[Community],
        config: &MapConfig,
    ) -> bool {
        let count = communities.len();
        if self.last_fit_count == Some(count) {
            debug!("Skipping fit-to-all: community count unchanged ({})", count);
            return false;
        }
        let Some(union) = communities
            .iter()
            .filter_map(Community::footprint)
            .reduce(|a, b| a.union(&b))
        else {
            return false;
        };

        let target = fit_target(
            &union,
            view.size,
            config.fit_padding_px,
            config.min_zoom,
            config.max_zoom,
        );
        debug!(
            "Fitting {} communities: zoom {:.2} at ({:.4}, {:.4})",
            count, target.zoom, target.center.lat, target.center.lng
        );
        self.start(FitKind::AllCommunities, view, target, config);
        self.last_fit_count = Some(count);
        true
    }

    /// Frame one community, never zooming past the single-fit cap.
    pub fn fit_to_community(
        &mut self,
        view: &ViewportState,
        community: &Community,
        config: &MapConfig,
    ) -> bool {
        let Some(footprint) = community.footprint() else {
            return false;
        };
        let max_zoom = config.single_fit_max_zoom.min(config.max_zoom);
        let target = fit_target(
            &footprint,
            view.size,
            config.fit_padding_px,
            config.min_zoom,
            max_zoom,
        );
        self.start(FitKind::Community(community.id.clone()), view, target, config);
        true
    }

    pub fn reset_to_default(&mut self, view: &ViewportState, config: &MapConfig) {
        let target = ViewTarget {
            center: config.default_center,
            zoom: config.default_zoom.clamp(config.min_zoom, config.max_zoom),
        };
        self.start(FitKind::Default, view, target, config);
    }

    fn start(
        &mut self,
        kind: FitKind,
        view: &ViewportState,
        to: ViewTarget,
        config: &MapConfig,
    ) {
        if let Some(previous) = &self.animation {
            debug!("Viewport animation {:?} replaced by {:?}", previous.kind, kind);
        }
        self.animation = Some(ViewAnimation {
            kind,
            from: ViewTarget {
                center: view.center,
                zoom: view.zoom,
            },
            to,
            elapsed: 0.0,
            duration: config.animation_secs.max(0.0),
        });
    }

    /// Move immediately, cancelling any animation.
    pub fn jump_to(
        &mut self,
        view: &mut ViewportState,
        center: LatLng,
        zoom: f64,
        config: &MapConfig,
    ) {
        self.animation = None;
        view.center = center;
        view.zoom = zoom.clamp(config.min_zoom, config.max_zoom);
    }

    /// Shift the view by `delta` screen pixels.
    pub fn pan_by(&mut self, view: &mut ViewportState, delta: DVec2) {
        if delta == DVec2::ZERO {
            return;
        }
        self.animation = None;
        view.center = unproject(project(view.center, view.zoom) + delta, view.zoom);
    }

    /// Change zoom by `delta`, keeping the point under `anchor` fixed.
    pub fn zoom_at(
        &mut self,
        view: &mut ViewportState,
        delta: f64,
        anchor: DVec2,
        config: &MapConfig,
    ) {
        let zoom = (view.zoom + delta).clamp(config.min_zoom, config.max_zoom);
        if zoom == view.zoom {
            return;
        }
        self.animation = None;
        let pinned = view.from_screen(anchor);
        let offset = anchor - view.size * 0.5;
        view.zoom = zoom;
        view.center = unproject(project(pinned, zoom) - offset, zoom);
    }

    /// Track the drawing surface size. Animations keep running so a fit
    /// requested before the first layout still lands.
    pub fn resize(&mut self, view: &mut ViewportState, size: DVec2) {
        let size = size.max(DVec2::ONE);
        if view.size != size {
            view.size = size;
        }
    }

    /// Advance the animation by `dt` seconds. Returns whether the view moved.
    pub fn step(&mut self, view: &mut ViewportState, dt: f32) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        animation.elapsed += dt.max(0.0);
        let done = animation.progress() >= 1.0;
        let sample = if done {
            animation.to
        } else {
            animation.sample()
        };
        view.center = sample.center;
        view.zoom = sample.zoom;
        if done {
            self.animation = None;
        }
        true
    }

    /// Snap to the animation target.
    pub fn finish(&mut self, view: &mut ViewportState) {
        if let Some(animation) = self.animation.take() {
            view.center = animation.to.center;
            view.zoom = animation.to.zoom;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn active_fit(&self) -> Option<&FitKind> {
        self.animation.as_ref().map(|a| &a.kind)
    }

    pub fn target(&self) -> Option<ViewTarget> {
        self.animation.as_ref().map(|a| a.to)
    }

    pub fn last_fit_count(&self) -> Option<usize> {
        self.last_fit_count
    }

    /// Forget the fit-to-all dedup count so the next fit always runs.
    pub fn clear_fit_signature(&mut self) {
        self.last_fit_count = None;
    }

    /// Back to a fresh controller: no animation, no dedup count.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn animate_viewport(
    time: Res<Time>,
    mut controller: ResMut<ViewportController>,
    mut view: ResMut<ViewportState>,
) {
    if !controller.is_animating() {
        return;
    }
    controller.step(&mut view, time.delta_secs());
}

/// Report the visible bounds once the view is at rest and has moved.
pub fn emit_viewport_bounds(
    view: Res<ViewportState>,
    mut controller: ResMut<ViewportController>,
    mut notifications: EventWriter<MapNotification>,
) {
    if controller.is_animating() {
        return;
    }
    let bounds = view.bounds();
    if controller.last_emitted == Some(bounds) {
        return;
    }
    controller.last_emitted = Some(bounds);
    notifications.send(MapNotification::ViewportBoundsChanged(bounds));
}
