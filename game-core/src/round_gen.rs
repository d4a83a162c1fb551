use game_types::{Prompt, RoundFormat};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dictionary::Dictionary;

pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];
pub const CONSONANTS: &[char] = &[
    'b', 'c', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'm', 'n', 'p', 'q', 'r', 's', 't', 'v', 'w', 'x',
    'y', 'z',
];

/// Produces each round's prompt and owns the draw parameters.
#[derive(Debug, Clone)]
pub struct RoundGenerator {
    pub tile_count: usize,
    /// Probability that a non-forced tile is drawn from the vowel pool.
    pub vowel_bias: f64,
    /// Length range for subword-format main words.
    pub main_word_min_len: usize,
    pub main_word_max_len: usize,
}

impl Default for RoundGenerator {
    fn default() -> Self {
        Self {
            tile_count: 4,
            vowel_bias: 0.4,
            main_word_min_len: 7,
            main_word_max_len: 9,
        }
    }
}

impl RoundGenerator {
    /// Draw the shared tile set. The first tile is forced from the vowel pool
    /// so every round has at least one vowel; the rest follow the configured
    /// bias. The final order is shuffled so tile position carries no signal
    /// about how the set was drawn.
    pub fn letter_tiles<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut tiles = Vec::with_capacity(self.tile_count);

        if self.tile_count > 0 {
            tiles.push(VOWELS[rng.gen_range(0..VOWELS.len())]);
        }
        while tiles.len() < self.tile_count {
            let tile = if rng.gen_bool(self.vowel_bias) {
                VOWELS[rng.gen_range(0..VOWELS.len())]
            } else {
                CONSONANTS[rng.gen_range(0..CONSONANTS.len())]
            };
            tiles.push(tile);
        }

        tiles.shuffle(rng);
        tiles.into_iter().map(|c| c.to_string()).collect()
    }

    /// Pick the main word to decompose from the dictionary's pool of words
    /// long enough to contain multiple valid subwords.
    pub fn main_word<R: Rng>(&self, dictionary: &Dictionary, rng: &mut R) -> String {
        let pool = dictionary.main_word_pool(self.main_word_min_len, self.main_word_max_len);
        pool.choose(rng)
            .cloned()
            .unwrap_or_else(|| "painters".to_string())
    }

    pub fn generate<R: Rng>(
        &self,
        format: RoundFormat,
        dictionary: &Dictionary,
        rng: &mut R,
    ) -> Prompt {
        match format {
            RoundFormat::SharedLetters => Prompt::Letters {
                tiles: self.letter_tiles(rng),
            },
            RoundFormat::Subwords => Prompt::MainWord {
                word: self.main_word(dictionary, rng),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tile_set_size_and_vowel_guarantee() {
        let generator = RoundGenerator::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tiles = generator.letter_tiles(&mut rng);
            assert_eq!(tiles.len(), 4);
            let has_vowel = tiles
                .iter()
                .any(|t| VOWELS.contains(&t.chars().next().unwrap()));
            assert!(has_vowel, "tile set {:?} has no vowel", tiles);
        }
    }

    #[test]
    fn test_tiles_are_single_lowercase_letters() {
        let generator = RoundGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        for tile in generator.letter_tiles(&mut rng) {
            assert_eq!(tile.len(), 1);
            assert!(tile.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_main_word_comes_from_pool() {
        let dictionary = Dictionary::from_list("painters\nmonastery\ncat");
        let generator = RoundGenerator::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let word = generator.main_word(&dictionary, &mut rng);
            assert!(word == "painters" || word == "monastery");
        }
    }

    #[test]
    fn test_generate_matches_format() {
        let dictionary = Dictionary::fallback();
        let generator = RoundGenerator::default();
        let mut rng = StdRng::seed_from_u64(11);

        match generator.generate(RoundFormat::SharedLetters, &dictionary, &mut rng) {
            Prompt::Letters { tiles } => assert_eq!(tiles.len(), 4),
            other => panic!("expected letters prompt, got {:?}", other),
        }
        match generator.generate(RoundFormat::Subwords, &dictionary, &mut rng) {
            Prompt::MainWord { word } => assert!(word.len() >= 7),
            other => panic!("expected main word prompt, got {:?}", other),
        }
    }
}
