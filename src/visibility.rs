//! Visibility gating - suspends off-screen instances.
//!
//! The controller is a pure state machine: host signals go in, gate
//! commands come out, and the engine facade applies them to the scheduler
//! and surface. Keeping it free of side effects makes the full transition
//! table testable without a scheduler or surface in sight.
//!
//! An instance configured with `start_immediately` never establishes an
//! observation; it runs until detach and ignores intersection signals
//! (used when the surface is nested inside an already-visible parent).

use log::trace;

/// Recommended intersection threshold for host viewport observers: the
/// engine wakes as soon as ~1% of the surface enters the viewport.
pub const INTERSECTION_THRESHOLD: f64 = 0.01;

/// Observation state of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    /// Running unconditionally; no observation exists (`start_immediately`).
    Unobserved,
    /// Observing and currently intersecting the viewport.
    Visible,
    /// Observing and currently off-screen.
    Hidden,
}

/// Command for the engine facade to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Start the frame scheduler.
    Start,
    /// Stop the frame scheduler; keep surface contents.
    Suspend,
    /// Clear the surface to release retained pixel memory.
    ClearSurface,
    /// Stop the scheduler and drop the observation; terminal.
    Release,
}

// =============================================================================
// VisibilityController
// =============================================================================

#[derive(Debug)]
pub struct VisibilityController {
    state: VisibilityState,
    released: bool,
}

impl VisibilityController {
    /// Build the controller for a fresh attach.
    ///
    /// With `start_immediately` the instance enters
    /// [`VisibilityState::Unobserved`] and the scheduler starts right
    /// away; otherwise it observes from [`VisibilityState::Hidden`] and
    /// waits for the first intersection signal.
    pub fn attach(start_immediately: bool) -> (Self, Option<Gate>) {
        if start_immediately {
            (
                Self {
                    state: VisibilityState::Unobserved,
                    released: false,
                },
                Some(Gate::Start),
            )
        } else {
            (
                Self {
                    state: VisibilityState::Hidden,
                    released: false,
                },
                None,
            )
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Viewport intersection changed.
    pub fn on_intersection(&mut self, intersecting: bool) -> Option<Gate> {
        if self.released {
            return None;
        }
        match (self.state, intersecting) {
            (VisibilityState::Hidden, true) => {
                trace!("surface entered viewport");
                self.state = VisibilityState::Visible;
                Some(Gate::Start)
            }
            (VisibilityState::Visible, false) => {
                trace!("surface left viewport");
                self.state = VisibilityState::Hidden;
                Some(Gate::Suspend)
            }
            // Repeated signals and unobserved instances change nothing
            _ => None,
        }
    }

    /// Host process visibility changed (tab/window backgrounded).
    ///
    /// Only a hidden instance clears its surface: a visible-but-
    /// backgrounded surface resumes immediately on foreground, so its
    /// pixels stay.
    pub fn on_host_backgrounded(&mut self, hidden: bool) -> Option<Gate> {
        if self.released {
            return None;
        }
        if hidden && self.state == VisibilityState::Hidden {
            trace!("host backgrounded while hidden, clearing surface");
            Some(Gate::ClearSurface)
        } else {
            None
        }
    }

    /// Teardown. Releases exactly once; later calls and signals are no-ops.
    pub fn detach(&mut self) -> Option<Gate> {
        if self.released {
            return None;
        }
        trace!("visibility controller released");
        self.released = true;
        Some(Gate::Release)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_immediately_starts_without_observation() {
        let (mut controller, gate) = VisibilityController::attach(true);
        assert_eq!(gate, Some(Gate::Start));
        assert_eq!(controller.state(), VisibilityState::Unobserved);

        // Intersection signals do not reach an unobserved instance
        assert_eq!(controller.on_intersection(false), None);
        assert_eq!(controller.on_intersection(true), None);
        assert_eq!(controller.state(), VisibilityState::Unobserved);
    }

    #[test]
    fn test_observed_attach_waits_for_intersection() {
        let (mut controller, gate) = VisibilityController::attach(false);
        assert_eq!(gate, None);
        assert_eq!(controller.state(), VisibilityState::Hidden);

        assert_eq!(controller.on_intersection(true), Some(Gate::Start));
        assert_eq!(controller.state(), VisibilityState::Visible);
    }

    #[test]
    fn test_leaving_viewport_suspends() {
        let (mut controller, _) = VisibilityController::attach(false);
        controller.on_intersection(true);
        assert_eq!(controller.on_intersection(false), Some(Gate::Suspend));
        assert_eq!(controller.state(), VisibilityState::Hidden);

        assert_eq!(controller.on_intersection(true), Some(Gate::Start));
    }

    #[test]
    fn test_repeated_signals_are_noops() {
        let (mut controller, _) = VisibilityController::attach(false);
        assert_eq!(controller.on_intersection(false), None);

        controller.on_intersection(true);
        assert_eq!(controller.on_intersection(true), None);
    }

    #[test]
    fn test_backgrounding_clears_only_while_hidden() {
        let (mut controller, _) = VisibilityController::attach(false);
        controller.on_intersection(true);

        // Visible-but-backgrounded keeps its pixels
        assert_eq!(controller.on_host_backgrounded(true), None);
        assert_eq!(controller.on_host_backgrounded(false), None);

        controller.on_intersection(false);
        assert_eq!(
            controller.on_host_backgrounded(true),
            Some(Gate::ClearSurface)
        );
    }

    #[test]
    fn test_unobserved_instance_never_clears() {
        let (mut controller, _) = VisibilityController::attach(true);
        assert_eq!(controller.on_host_backgrounded(true), None);
    }

    #[test]
    fn test_detach_releases_exactly_once() {
        let (mut controller, _) = VisibilityController::attach(false);
        assert_eq!(controller.detach(), Some(Gate::Release));
        assert!(controller.is_released());
        assert_eq!(controller.detach(), None);
    }

    #[test]
    fn test_signals_after_release_are_ignored() {
        let (mut controller, _) = VisibilityController::attach(false);
        controller.on_intersection(true);
        controller.detach();

        assert_eq!(controller.on_intersection(false), None);
        assert_eq!(controller.on_intersection(true), None);
        assert_eq!(controller.on_host_backgrounded(true), None);
    }
}
