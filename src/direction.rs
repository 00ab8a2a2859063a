/// Direction of the last observed price move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Neutral,
    Up,
    Down,
}

/// Classifies successive price samples. Only the last price matters; the
/// direction is deliberately "sticky" on an unchanged price rather than
/// decaying back to neutral.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectionTracker {
    last_price: Option<f64>,
    direction: Direction,
}

impl DirectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    /// Feed the next sample; returns the direction after the transition.
    pub fn observe(&mut self, price: f64) -> Direction {
        if !price.is_finite() {
            return self.direction;
        }
        match self.last_price {
            None => {
                // a single point cannot be judged
                self.direction = Direction::Neutral;
            }
            Some(last) => {
                if price > last {
                    self.direction = Direction::Up;
                } else if price < last {
                    self.direction = Direction::Down;
                }
                // equal: keep the prior direction
            }
        }
        self.last_price = Some(price);
        self.direction
    }

    pub fn reset(&mut self) {
        self.last_price = None;
        self.direction = Direction::Neutral;
    }
}
