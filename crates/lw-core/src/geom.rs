use core::ops::{Add, Mul, Sub};

const DX: [isize; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [isize; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// Integer pixel coordinate. Image `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
}

impl Pixel {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Row-major linear index in an image of the given width.
    pub fn index(self, width: usize) -> usize {
        self.y * width + self.x
    }

    pub fn from_index(idx: usize, width: usize) -> Self {
        Self {
            x: idx % width,
            y: idx / width,
        }
    }

    /// Neighbor in `dir`, or `None` if it falls outside `width x height`.
    pub fn neighbor(self, dir: Direction, width: usize, height: usize) -> Option<Pixel> {
        let (dx, dy) = dir.offset();
        let nx = self.x.checked_add_signed(dx)?;
        let ny = self.y.checked_add_signed(dy)?;
        if nx >= width || ny >= height {
            return None;
        }
        Some(Pixel { x: nx, y: ny })
    }

    /// Chebyshev distance, the number of 8-connected steps between two pixels.
    pub fn chebyshev(self, other: Pixel) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Direction of the single 8-connected step from `self` to `other`.
    pub fn direction_to(self, other: Pixel) -> Option<Direction> {
        let dx = other.x as isize - self.x as isize;
        let dy = other.y as isize - self.y as isize;
        Direction::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }
}

/// One of the eight neighbor directions, counter-clockwise from east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::E,
        Direction::NE,
        Direction::N,
        Direction::NW,
        Direction::W,
        Direction::SW,
        Direction::S,
        Direction::SE,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn offset(self) -> (isize, isize) {
        let i = self.index();
        (DX[i], DY[i])
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }

    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 4) % 8]
    }

    /// Unit vector along the step.
    pub fn unit(self) -> Vec2f {
        let (dx, dy) = self.offset();
        Vec2f {
            x: dx as f32,
            y: dy as f32,
        }
        .normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            Self::default()
        } else {
            self * (1.0 / n)
        }
    }
}

impl Add for Vec2f {
    type Output = Vec2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Vec2f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2f {
    type Output = Vec2f;

    fn sub(self, rhs: Vec2f) -> Self::Output {
        Vec2f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2f {
    type Output = Vec2f;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec2f {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Pixel, Vec2f};

    #[test]
    fn vec_ops_and_normalize() {
        let a = Vec2f { x: 3.0, y: 4.0 };
        let b = Vec2f { x: 1.0, y: -2.0 };

        assert_eq!(a + b, Vec2f { x: 4.0, y: 2.0 });
        assert_eq!(a - b, Vec2f { x: 2.0, y: 6.0 });
        assert!((a.dot(b) + 5.0).abs() < 1e-6);
        assert!((a.norm() - 5.0).abs() < 1e-6);
        assert!((a.normalize().norm() - 1.0).abs() < 1e-6);
        assert_eq!(Vec2f::default().normalize(), Vec2f::default());
    }

    #[test]
    fn neighbors_respect_image_bounds() {
        let corner = Pixel::new(0, 0);
        let inside: Vec<_> = Direction::ALL
            .into_iter()
            .filter_map(|d| corner.neighbor(d, 3, 3))
            .collect();
        assert_eq!(
            inside,
            vec![Pixel::new(1, 0), Pixel::new(0, 1), Pixel::new(1, 1)]
        );

        let center = Pixel::new(1, 1);
        assert_eq!(
            Direction::ALL
                .into_iter()
                .filter_map(|d| center.neighbor(d, 3, 3))
                .count(),
            8
        );
        assert_eq!(center.neighbor(Direction::NE, 3, 3), Some(Pixel::new(2, 0)));
    }

    #[test]
    fn direction_round_trips_through_offsets() {
        let p = Pixel::new(4, 4);
        for d in Direction::ALL {
            let q = p.neighbor(d, 9, 9).expect("interior neighbor");
            assert_eq!(p.direction_to(q), Some(d));
            assert_eq!(q.direction_to(p), Some(d.opposite()));
            assert_eq!(p.chebyshev(q), 1);
        }
        assert_eq!(p.direction_to(Pixel::new(6, 4)), None);
        assert_eq!(p.index(9), 40);
        assert_eq!(Pixel::from_index(40, 9), p);
    }
}
