use std::fmt;

/// Two-component size or position, used for frame dimensions (`x` = width, `y` = height).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

impl<T: fmt::Debug> fmt::Debug for Vec2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vec2")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Vec2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

impl<T> Vec2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Vec2<usize> {
    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        self.x * self.y
    }

    /// Half resolution in both directions, as used by 4:2:0 chroma planes.
    pub fn halved(&self) -> Self {
        Self::new(self.x / 2, self.y / 2)
    }

    pub fn is_even(&self) -> bool {
        self.x % 2 == 0 && self.y % 2 == 0
    }
}

impl From<(usize, usize)> for Vec2<usize> {
    fn from((x, y): (usize, usize)) -> Self {
        Self::new(x, y)
    }
}
