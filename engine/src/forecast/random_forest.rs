// Bagged regression trees over a single feature (the year). Every tree is
// grown on a bootstrap sample drawn from one seeded generator, so the same
// seed always gives the same forest.
use super::{ensure_fittable, Forecaster};
use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use shared::TimeSeries;

const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: f64) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split { threshold, left, right } => {
                    node = if x <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Grows a fully expanded tree, splitting on the threshold that minimises
/// the summed squared error of both children.
fn grow(samples: &mut [(f64, f64)]) -> Node {
    let n = samples.len();
    let mean = samples.iter().map(|s| s.1).sum::<f64>() / n as f64;
    if n < MIN_SAMPLES_SPLIT {
        return Node::Leaf(mean);
    }
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: f64 = samples.iter().map(|s| s.1).sum();
    let total_sq: f64 = samples.iter().map(|s| s.1 * s.1).sum();
    let parent_sse = total_sq - total * total / n as f64;
    if parent_sse <= f64::EPSILON {
        return Node::Leaf(mean);
    }

    let mut best: Option<(usize, f64)> = None;
    let (mut left_sum, mut left_sq) = (0.0, 0.0);
    for i in 1..n {
        let y = samples[i - 1].1;
        left_sum += y;
        left_sq += y * y;
        // Equal years cannot be separated.
        if samples[i - 1].0 == samples[i].0 {
            continue;
        }
        let (nl, nr) = (i as f64, (n - i) as f64);
        let right_sum = total - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);
        if best.map_or(true, |(_, b)| sse < b) {
            best = Some((i, sse));
        }
    }

    match best {
        Some((i, _)) => {
            let threshold = (samples[i - 1].0 + samples[i].0) / 2.0;
            let (left, right) = samples.split_at_mut(i);
            Node::Split {
                threshold,
                left: Box::new(grow(left)),
                right: Box::new(grow(right)),
            }
        }
        None => Node::Leaf(mean),
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    name: String,
    n_estimators: usize,
    seed: u64,
}

impl RandomForest {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        RandomForest {
            name: "random_forest".to_string(),
            n_estimators,
            seed,
        }
    }

    fn fit(&self, samples: &[(f64, f64)]) -> Result<Vec<Node>> {
        if self.n_estimators == 0 {
            return Err(EngineError::ConfigError(
                "random forest needs at least one estimator".to_string(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = samples.len();
        let trees = (0..self.n_estimators)
            .map(|_| {
                let mut bootstrap: Vec<(f64, f64)> =
                    (0..n).map(|_| samples[rng.gen_range(0..n)]).collect();
                grow(&mut bootstrap)
            })
            .collect();
        Ok(trees)
    }
}

impl Forecaster for RandomForest {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        json!({
            "n_estimators": self.n_estimators,
            "seed": self.seed,
            "criterion": "squared_error",
            "bootstrap": true,
        })
    }

    /// Years past the last observation fall into the rightmost leaves, so the
    /// forecast plateaus there.
    fn predict(&self, series: &TimeSeries, years: &[i32]) -> Result<Vec<f64>> {
        ensure_fittable(series)?;
        let samples: Vec<(f64, f64)> = series
            .points()
            .iter()
            .map(|p| (p.year as f64, p.value))
            .collect();
        let trees = self.fit(&samples)?;
        let count = trees.len() as f64;
        Ok(years
            .iter()
            .map(|&year| {
                let x = year as f64;
                trees.iter().map(|t| t.predict(x)).sum::<f64>() / count
            })
            .collect())
    }
}
