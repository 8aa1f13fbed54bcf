pub mod evolution;
pub mod init;
pub mod recommend;
pub mod score;
pub mod validate;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded RNG for reproducible wording, entropy-seeded otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
