//! One-shot scroll reveal
//!
//! Content blocks start `Pending` and flip to `Revealed` the first time at
//! least `threshold` of their area is inside the viewport. A revealed block is
//! dropped from observation; it never goes back to pending.
//!
//! Two drivers feed the same state: [`RevealObserver::on_intersection`] for
//! hosts that report intersection ratios (the browser's IntersectionObserver),
//! and [`RevealObserver::poll`] for hosts that only know element rectangles.

use glam::Vec2;

use crate::consts::REVEAL_THRESHOLD;

/// Axis-aligned rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w.max(0.0), h.max(0.0)),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max().x && p.y <= self.max().y
    }

    /// Overlap with `other`, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min = self.min.max(other.min);
        let max = self.max().min(other.max());
        if max.x < min.x || max.y < min.y {
            return None;
        }
        Some(Rect {
            min,
            size: max - min,
        })
    }

    /// Fraction of this rect's area inside `viewport`.
    ///
    /// A zero-area rect counts as fully visible when it touches the viewport.
    pub fn visible_ratio(&self, viewport: &Rect) -> f32 {
        match self.intersection(viewport) {
            None => 0.0,
            Some(_) if self.area() == 0.0 => {
                if viewport.contains(self.min) || viewport.contains(self.max()) {
                    1.0
                } else {
                    0.0
                }
            }
            Some(overlap) => overlap.area() / self.area(),
        }
    }
}

/// Handle to an observed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Pending,
    Revealed,
}

#[derive(Debug, Clone)]
struct Target {
    bounds: Rect,
    state: RevealState,
    /// Still watched for intersection
    observed: bool,
}

/// Tracks reveal targets and fires each transition once
#[derive(Debug, Clone)]
pub struct RevealObserver {
    threshold: f32,
    targets: Vec<Target>,
    connected: bool,
}

impl Default for RevealObserver {
    fn default() -> Self {
        Self::new(REVEAL_THRESHOLD)
    }
}

impl RevealObserver {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            targets: Vec::new(),
            connected: true,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Start watching a block
    pub fn observe(&mut self, bounds: Rect) -> TargetId {
        let id = TargetId(self.targets.len());
        self.targets.push(Target {
            bounds,
            state: RevealState::Pending,
            observed: self.connected,
        });
        id
    }

    /// Update a block's layout rectangle (for polling hosts)
    pub fn set_bounds(&mut self, id: TargetId, bounds: Rect) {
        if let Some(t) = self.targets.get_mut(id.0) {
            t.bounds = bounds;
        }
    }

    /// Report an intersection ratio for `id`. Returns true when this report
    /// reveals the target.
    pub fn on_intersection(&mut self, id: TargetId, ratio: f32) -> bool {
        let threshold = self.threshold;
        match self.targets.get_mut(id.0) {
            Some(t) if t.observed && t.state == RevealState::Pending && ratio >= threshold => {
                t.state = RevealState::Revealed;
                t.observed = false;
                log::debug!("Revealed target {} at ratio {:.3}", id.0, ratio);
                true
            }
            _ => false,
        }
    }

    /// Check every observed target against `viewport` and reveal those that
    /// cross the threshold. Returns the ids revealed by this pass.
    pub fn poll(&mut self, viewport: Rect) -> Vec<TargetId> {
        let ratios: Vec<(TargetId, f32)> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.observed)
            .map(|(i, t)| (TargetId(i), t.bounds.visible_ratio(&viewport)))
            .collect();

        ratios
            .into_iter()
            .filter(|(id, ratio)| self.on_intersection(*id, *ratio))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn state(&self, id: TargetId) -> Option<RevealState> {
        self.targets.get(id.0).map(|t| t.state)
    }

    pub fn is_observed(&self, id: TargetId) -> bool {
        self.targets.get(id.0).is_some_and(|t| t.observed)
    }

    /// Targets still waiting to be revealed and still observed
    pub fn pending_count(&self) -> usize {
        self.targets.iter().filter(|t| t.observed).count()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Stop observing everything; later reports are ignored
    pub fn disconnect(&mut self) {
        self.connected = false;
        for t in &mut self.targets {
            t.observed = false;
        }
        log::debug!("Reveal observer disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 800.0)
    }

    #[test]
    fn test_exactly_threshold_reveals_once() {
        let mut obs = RevealObserver::default();
        // 100x100 block with its top 15 rows inside the viewport
        let id = obs.observe(Rect::new(0.0, 785.0, 100.0, 100.0));
        assert_eq!(obs.poll(viewport()), vec![id]);
        assert_eq!(obs.state(id), Some(RevealState::Revealed));
        assert!(obs.poll(viewport()).is_empty());
        assert!(!obs.on_intersection(id, 1.0));
    }

    #[test]
    fn test_below_threshold_never_reveals() {
        let mut obs = RevealObserver::default();
        let id = obs.observe(Rect::new(0.0, 786.0, 100.0, 100.0));
        for _ in 0..5 {
            assert!(obs.poll(viewport()).is_empty());
        }
        assert!(!obs.on_intersection(id, 0.149));
        assert_eq!(obs.state(id), Some(RevealState::Pending));
        assert!(obs.is_observed(id));
    }

    #[test]
    fn test_intersection_events() {
        let mut obs = RevealObserver::new(0.15);
        let a = obs.observe(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = obs.observe(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(obs.on_intersection(a, 0.15));
        assert!(!obs.on_intersection(a, 0.9));
        assert_eq!(obs.pending_count(), 1);
        assert_eq!(obs.state(b), Some(RevealState::Pending));
        assert_eq!(obs.state(TargetId(99)), None);
    }

    #[test]
    fn test_scrolling_reveals_in_order() {
        let mut obs = RevealObserver::default();
        let top = obs.observe(Rect::new(0.0, 100.0, 500.0, 200.0));
        let below = obs.observe(Rect::new(0.0, 1200.0, 500.0, 200.0));
        assert_eq!(obs.poll(viewport()), vec![top]);

        // Scroll down 600px: viewport now covers y in [600, 1400]
        let scrolled = Rect::new(0.0, 600.0, 1000.0, 800.0);
        assert_eq!(obs.poll(scrolled), vec![below]);
        // Scrolling back up does not un-reveal
        assert!(obs.poll(viewport()).is_empty());
        assert_eq!(obs.state(top), Some(RevealState::Revealed));
    }

    #[test]
    fn test_disconnect_ignores_later_events() {
        let mut obs = RevealObserver::default();
        let id = obs.observe(Rect::new(0.0, 0.0, 10.0, 10.0));
        obs.disconnect();
        assert!(!obs.on_intersection(id, 1.0));
        assert!(obs.poll(viewport()).is_empty());
        let late = obs.observe(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!obs.is_observed(late));
        assert_eq!(obs.state(id), Some(RevealState::Pending));
    }

    #[test]
    fn test_zero_area_target() {
        let line = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(line.visible_ratio(&viewport()), 1.0);
        let outside = Rect::new(-10.0, -10.0, 0.0, 0.0);
        assert_eq!(outside.visible_ratio(&viewport()), 0.0);
    }

    #[test]
    fn test_set_bounds_moves_target() {
        let mut obs = RevealObserver::default();
        let id = obs.observe(Rect::new(0.0, 5000.0, 10.0, 10.0));
        assert!(obs.poll(viewport()).is_empty());
        obs.set_bounds(id, Rect::new(0.0, 10.0, 10.0, 10.0));
        assert_eq!(obs.poll(viewport()), vec![id]);
    }
}
