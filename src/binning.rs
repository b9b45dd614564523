//! Uniform bin edges and counts for 1D and 2D histograms.

use serde::Serialize;

/// `count` equal-width bins starting at `start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinEdges {
    pub start: f64,
    pub width: f64,
    pub count: usize,
}

impl BinEdges {
    /// Bins spanning the min..max of `values`, or `None` if there are no
    /// finite values. A constant column gets the range `v - 0.5..v + 0.5`.
    pub fn spanning<I: IntoIterator<Item = f64>>(values: I, count: usize) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let count = count.max(1);
        Some(Self {
            start: lo,
            width: (hi - lo) / count as f64,
            count,
        })
    }

    pub fn end(&self) -> f64 {
        self.edge(self.count)
    }

    /// Left edge of bin `i` (or the right edge of the last bin for `i == count`)
    pub fn edge(&self, i: usize) -> f64 {
        self.start + self.width * i as f64
    }

    /// Bin holding `v`; the last bin includes its right edge
    pub fn index_of(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.start || v > self.end() {
            return None;
        }
        let i = ((v - self.start) / self.width) as usize;
        Some(i.min(self.count - 1))
    }

    /// Count values per bin
    pub fn counts<I: IntoIterator<Item = f64>>(&self, values: I) -> Vec<u64> {
        let mut counts = vec![0u64; self.count];
        for v in values {
            if let Some(i) = self.index_of(v) {
                counts[i] += 1;
            }
        }
        counts
    }
}

/// 2D bin counts, row-major by x bin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid2d {
    pub x: BinEdges,
    pub y: BinEdges,
    pub counts: Vec<u64>,
}

impl Grid2d {
    /// Bin `(x, y)` pairs using `bins` bins per axis
    pub fn from_points(points: &[(f64, f64)], bins: usize) -> Option<Self> {
        let x = BinEdges::spanning(points.iter().map(|p| p.0), bins)?;
        let y = BinEdges::spanning(points.iter().map(|p| p.1), bins)?;
        let mut counts = vec![0u64; x.count * y.count];
        for &(px, py) in points {
            if let (Some(i), Some(j)) = (x.index_of(px), y.index_of(py)) {
                counts[i * y.count + j] += 1;
            }
        }
        Some(Self { x, y, counts })
    }

    pub fn count(&self, i: usize, j: usize) -> u64 {
        self.counts[i * self.y.count + j]
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Non-empty cells as `(x bin, y bin, count)`
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        (0..self.x.count).flat_map(move |i| {
            (0..self.y.count).filter_map(move |j| {
                let c = self.count(i, j);
                (c > 0).then_some((i, j, c))
            })
        })
    }
}
