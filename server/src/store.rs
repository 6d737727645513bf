use vortex_shared::{Circle, CircleId, Gem, LaunchRequest};

/// In-memory circles, gems and the live player counter.
///
/// No validation happens here; callers are trusted with coordinates.
/// Every mutation is visible to the next read.
#[derive(Debug)]
pub struct EntityStore {
    circles: Vec<Circle>,
    gems: Vec<Gem>,
    player_count: usize,
    next_circle_id: CircleId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            circles: Vec::new(),
            gems: Vec::new(),
            player_count: 0,
            next_circle_id: 1,
        }
    }

    /// Append a circle built from a launch, returning its new id.
    pub fn push_circle(&mut self, req: LaunchRequest) -> CircleId {
        let id = self.next_circle_id;
        self.next_circle_id = self.next_circle_id.wrapping_add(1).max(1);
        self.circles.push(Circle::from_launch(id, req));
        id
    }

    pub fn remove_circle(&mut self, id: CircleId) -> Option<Circle> {
        let idx = self.circles.iter().position(|c| c.id == id)?;
        Some(self.circles.remove(idx))
    }

    pub fn remove_circle_at(&mut self, index: usize) -> Option<Circle> {
        (index < self.circles.len()).then(|| self.circles.remove(index))
    }

    pub fn contains_circle(&self, id: CircleId) -> bool {
        self.circles.iter().any(|c| c.id == id)
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn circles_mut(&mut self) -> &mut [Circle] {
        &mut self.circles
    }

    pub fn push_gem(&mut self, gem: Gem) {
        self.gems.push(gem);
    }

    pub fn remove_gem_at(&mut self, index: usize) -> Option<Gem> {
        (index < self.gems.len()).then(|| self.gems.remove(index))
    }

    pub fn gems(&self) -> &[Gem] {
        &self.gems
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn add_player(&mut self) {
        self.player_count += 1;
    }

    pub fn remove_player(&mut self) {
        self.player_count = self.player_count.saturating_sub(1);
    }
}
