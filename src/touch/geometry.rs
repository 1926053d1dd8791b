/// Screen-space points and rectangles used for hit-testing

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Half-open containment: the left/top edges are inside, right/bottom are not,
    /// so rectangles that share an edge never both claim a point
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.x
            && point.x < self.max_x()
            && point.y >= self.y
            && point.y < self.max_y()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let rect = Rect::new(10.0, 20.0, 5.0, 5.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(rect.contains(Point::new(14.9, 24.9)));
        assert!(!rect.contains(Point::new(15.0, 22.0)));
        assert!(!rect.contains(Point::new(12.0, 25.0)));
        assert!(!rect.contains(Point::new(9.9, 22.0)));
    }

    #[test]
    fn test_empty_rect_contains_nothing() {
        let rect = Rect::new(0.0, 0.0, 0.0, 10.0);
        assert!(rect.is_empty());
        assert!(!rect.contains(Point::new(0.0, 5.0)));
    }

    #[test]
    fn test_shared_edge_does_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(9.0, 9.0, 2.0, 2.0)));
    }
}
