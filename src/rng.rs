use crate::types::Vec2;

#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        min + (self.next_f32() * span).floor().min(span - 1.0) as i32
    }

    pub fn cell(&mut self, width: i32, height: i32) -> Vec2 {
        Vec2 {
            x: self.int(0, width - 1),
            y: self.int(0, height - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(424_242);
        let mut b = Rng::new(424_242);
        for _ in 0..200 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_in_inclusive_range() {
        let mut rng = Rng::new(7);
        for _ in 0..1_000 {
            let value = rng.int(-3, 5);
            assert!((-3..=5).contains(&value));
        }
        assert_eq!(rng.int(4, 4), 4);
        assert_eq!(rng.int(9, 2), 9);
    }

    #[test]
    fn int_clamps_draws_that_round_to_one() {
        let mut rng = Rng::new(52_078_625);
        assert_eq!(rng.clone().next_f32(), 1.0);
        assert_eq!(rng.int(0, 16), 16);
    }

    #[test]
    fn cell_stays_on_grid() {
        let mut rng = Rng::new(99);
        for _ in 0..1_000 {
            let cell = rng.cell(17, 17);
            assert!((0..17).contains(&cell.x));
            assert!((0..17).contains(&cell.y));
        }
    }

    #[test]
    fn cell_reaches_every_column_eventually() {
        let mut rng = Rng::new(3);
        let mut seen = [false; 17];
        for _ in 0..5_000 {
            seen[rng.cell(17, 17).x as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }
}
