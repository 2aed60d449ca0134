use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thromb_analysis::core_modules::component::Label;

pub type Rgb = [u8; 3];

pub const BACKGROUND_COLOR: Rgb = [0, 0, 0];

/// One RGB triple per label; background is black.
///
/// Colors come from the generator handed in, so a fixed seed gives the same
/// picture on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<Rgb>,
}

impl ColorTable {
    /// Draws a color for every label `1..=num_labels` from `rng`.
    pub fn random<R: Rng>(num_labels: usize, rng: &mut R) -> Self {
        let mut colors = Vec::with_capacity(num_labels + 1);
        colors.push(BACKGROUND_COLOR);
        for _ in 0..num_labels {
            colors.push([rng.random(), rng.random(), rng.random()]);
        }
        Self { colors }
    }

    pub fn seeded(num_labels: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random(num_labels, &mut rng)
    }

    /// Color of `label`; labels outside the table render as background.
    pub fn color(&self, label: Label) -> Rgb {
        self.colors
            .get(label.to_raw())
            .copied()
            .unwrap_or(BACKGROUND_COLOR)
    }
}
