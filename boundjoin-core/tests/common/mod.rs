use boundjoin_core::{DistanceSource, SourceError};

/// Taxa placed at points in the plane, with Euclidean distances.
#[derive(Clone)]
pub struct Points {
    name: &'static str,
    points: Vec<(f64, f64)>,
}

impl Points {
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self {
            name: "points",
            points,
        }
    }

    #[must_use]
    pub fn named(name: &'static str, points: Vec<(f64, f64)>) -> Self {
        Self { name, points }
    }

    /// Points on a slowly widening spiral, so no two distances coincide.
    #[must_use]
    pub fn spiral(count: usize) -> Self {
        let points = (0..count)
            .map(|index| {
                let step = index as f64;
                let radius = 1.0 + 0.37 * step;
                (radius * (0.9 * step).cos(), radius * (0.9 * step).sin())
            })
            .collect();
        Self::new(points)
    }
}

impl DistanceSource for Points {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        self.points
            .get(index)
            .map(|_| format!("taxon_{index}"))
            .ok_or(SourceError::OutOfBounds { index })
    }

    fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError> {
        let a = self
            .points
            .get(i)
            .ok_or(SourceError::OutOfBounds { index: i })?;
        let b = self
            .points
            .get(j)
            .ok_or(SourceError::OutOfBounds { index: j })?;
        Ok((a.0 - b.0).hypot(a.1 - b.1))
    }
}
