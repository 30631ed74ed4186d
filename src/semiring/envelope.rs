use super::Semiring;

/// a piecewise-linear function's single linear piece: `x -> slope*x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// x at which `self` and `other` cross. undefined (infinite) for
    /// parallel lines; callers only invoke this on lines of distinct slope.
    fn intersection_x(&self, other: &Line) -> f64 {
        (other.intercept - self.intercept) / (self.slope - other.slope)
    }
}

/// upper hull of a finite set of lines (§4.1): `+` is union followed by
/// upper-hull reduction, `*` convolves two sets by slope/intercept addition.
/// lines are stored sorted by ascending slope; consecutive lines cross at
/// strictly increasing x, so the dominant line at any x can be found by
/// walking (or bisecting) this list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope(Vec<Line>);

impl Envelope {
    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self(reduce(lines))
    }

    pub fn lines(&self) -> &[Line] {
        &self.0
    }

    /// x-coordinates of the breakpoints between consecutive dominant lines.
    pub fn breakpoints(&self) -> Vec<f64> {
        self.0
            .windows(2)
            .map(|pair| pair[0].intersection_x(&pair[1]))
            .collect()
    }

    /// value of the upper envelope at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.dominant(x).map(|l| l.eval(x)).unwrap_or(f64::NEG_INFINITY)
    }

    /// the line dominating at `x`.
    pub fn dominant(&self, x: f64) -> Option<&Line> {
        if self.0.is_empty() {
            return None;
        }
        let breaks = self.breakpoints();
        // breaks[i] is where self.0[i] stops dominating and self.0[i+1] begins.
        let idx = breaks.partition_point(|&bp| bp <= x);
        self.0.get(idx)
    }
}

/// reduce a set of lines (possibly with duplicate slopes, possibly
/// unsorted) to the upper hull: drop lines that are dominated everywhere,
/// keeping ties broken in favor of the larger slope.
fn reduce(mut lines: Vec<Line>) -> Vec<Line> {
    if lines.is_empty() {
        return lines;
    }
    // ascending slope; for equal slopes keep only the larger intercept, and
    // among those, the larger slope wins any remaining tie (they're already
    // equal here, so this just fixes iteration order).
    lines.sort_by(|a, b| {
        a.slope
            .partial_cmp(&b.slope)
            .unwrap()
            .then(b.intercept.partial_cmp(&a.intercept).unwrap())
    });
    lines.dedup_by(|keep_later, keep_earlier| keep_later.slope == keep_earlier.slope);

    let mut hull: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        while hull.len() >= 2 {
            let l1 = hull[hull.len() - 2];
            let l2 = hull[hull.len() - 1];
            if bad(&l1, &l2, &line) {
                hull.pop();
            } else {
                break;
            }
        }
        if let Some(&last) = hull.last() {
            if last.slope == line.slope {
                // already deduped above, but guards against float-equal
                // slopes reintroduced by convolution.
                if last.intercept >= line.intercept {
                    continue;
                }
                hull.pop();
            }
        }
        hull.push(line);
    }
    hull
}

/// true iff `l2` is unnecessary: `l1` and `l3` cross at or before the point
/// where `l1` and `l2` cross, so `l2` is dominated everywhere by `l1` or `l3`.
fn bad(l1: &Line, l2: &Line, l3: &Line) -> bool {
    (l3.intercept - l1.intercept) * (l1.slope - l2.slope)
        <= (l2.intercept - l1.intercept) * (l1.slope - l3.slope)
}

impl Semiring for Envelope {
    fn zero() -> Self {
        Envelope(Vec::new())
    }
    fn one() -> Self {
        Envelope(vec![Line::new(0.0, 0.0)])
    }
    fn plus(&self, other: &Self) -> Self {
        let mut lines = self.0.clone();
        lines.extend(other.0.iter().copied());
        Envelope::from_lines(lines)
    }
    fn times(&self, other: &Self) -> Self {
        if self.0.is_empty() || other.0.is_empty() {
            return Envelope::zero();
        }
        let mut lines = Vec::with_capacity(self.0.len() * other.0.len());
        for a in &self.0 {
            for b in &other.0 {
                lines.push(Line::new(a.slope + b.slope, a.intercept + b.intercept));
            }
        }
        Envelope::from_lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_sweep_matches_pointwise_maximum() {
        let env = Envelope::from_lines(vec![Line::new(0.0, 0.0), Line::new(1.0, -0.2)]);
        for x in [-1.0, 0.0, 0.1, 0.19, 0.2, 0.21, 1.0, 2.0] {
            let expected = [0.0 * x + 0.0, 1.0 * x - 0.2]
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            assert!((env.eval(x) - expected).abs() < 1e-9, "x={x}");
        }
    }

    #[test]
    fn dominated_line_is_dropped() {
        // y = -1 is never the maximum against y = 0 and y = x.
        let env = Envelope::from_lines(vec![
            Line::new(0.0, 0.0),
            Line::new(1.0, -5.0),
            Line::new(0.0, -1.0),
        ]);
        assert_eq!(env.lines().len(), 2);
    }

    #[test]
    fn times_convolves_slopes_and_intercepts() {
        let a = Envelope::from_lines(vec![Line::new(1.0, 0.0)]);
        let b = Envelope::from_lines(vec![Line::new(2.0, 3.0)]);
        let product = a.times(&b);
        assert_eq!(product.lines(), &[Line::new(3.0, 3.0)]);
    }
}
