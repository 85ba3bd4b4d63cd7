use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Runtime settings shared by the CLI and the web server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the HTTP API
    pub port: u16,
    /// Directory holding one JSON record per assigner
    pub data_dir: PathBuf,
    /// Directory holding one roster CSV per class
    pub roster_dir: PathBuf,
    /// Fixed seed for reproducible runs; fresh entropy when unset
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("data/assigners"),
            roster_dir: PathBuf::from("data/rosters"),
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn app_config_default() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.data_dir, PathBuf::from("data/assigners"));
        assert_eq!(cfg.roster_dir, PathBuf::from("data/rosters"));
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn seeded_config_is_reproducible() {
        let cfg = AppConfig::default().with_seed(17);
        let a: u64 = cfg.rng().gen();
        let b: u64 = cfg.rng().gen();
        assert_eq!(a, b);
    }
}
