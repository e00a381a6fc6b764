//! Reward catalog and weighted draw.
//!
//! Rewards are identified by their overlay asset file name. Assets whose name
//! starts with [`LEGENDARY_PREFIX`] form the rare pool; everything else is a
//! normal reward. The asset listing is re-read on every call, so dropping a new
//! PNG into the overlay folder takes effect on the next bake.

use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Chance of a legendary draw when the legendary pool is non-empty.
pub const LEGENDARY_PROBABILITY: f64 = 0.01;

/// File name prefix that marks a legendary reward asset.
pub const LEGENDARY_PREFIX: &str = "Legendary-";

/// Normal rewards used when the asset source yields nothing.
pub const FALLBACK_REWARDS: [&str; 3] = ["croissant.png", "donut.png", "Pancakes.png"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("reward catalog has no normal rewards")]
    EmptyNormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardTier {
    Normal,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RewardItem {
    pub id: String,
    pub tier: RewardTier,
}

impl RewardItem {
    fn new(id: String, tier: RewardTier) -> Self {
        Self { id, tier }
    }

    pub fn is_legendary(&self) -> bool {
        self.tier == RewardTier::Legendary
    }
}

/// Anything that can list reward asset identifiers.
pub trait AssetSource: Send + Sync {
    fn list(&self) -> std::io::Result<Vec<String>>;
}

/// Lists `*.png` files in a folder.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    dir: PathBuf,
}

impl DirectoryAssets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl AssetSource for DirectoryAssets {
    fn list(&self) -> std::io::Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if let (true, Some(name)) = (is_png, path.file_name().and_then(|n| n.to_str())) {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// A fixed list of asset identifiers.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets(pub Vec<String>);

impl AssetSource for StaticAssets {
    fn list(&self) -> std::io::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Normal and legendary pools resolved from a single asset listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub normal: Vec<RewardItem>,
    pub legendary: Vec<RewardItem>,
}

pub struct RewardCatalog {
    source: Box<dyn AssetSource>,
    fallback: Vec<String>,
}

impl RewardCatalog {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            fallback: FALLBACK_REWARDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the built-in fallback rewards.
    pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Check that a normal reward can always be drawn.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.snapshot().normal.is_empty() {
            return Err(CatalogError::EmptyNormal);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let ids = self.source.list().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list reward assets, using fallback rewards");
            Vec::new()
        });

        let (legendary, normal): (Vec<String>, Vec<String>) = ids
            .iter()
            .cloned()
            .partition(|id| id.starts_with(LEGENDARY_PREFIX));

        let normal = if ids.is_empty() {
            self.fallback.clone()
        } else if normal.is_empty() {
            // Only legendary assets on disk: they double as the normal pool.
            ids
        } else {
            normal
        };

        CatalogSnapshot {
            normal: normal
                .into_iter()
                .map(|id| RewardItem::new(id, RewardTier::Normal))
                .collect(),
            legendary: legendary
                .into_iter()
                .map(|id| RewardItem::new(id, RewardTier::Legendary))
                .collect(),
        }
    }

    pub fn list_normal(&self) -> Vec<RewardItem> {
        self.snapshot().normal
    }

    pub fn list_legendary(&self) -> Vec<RewardItem> {
        self.snapshot().legendary
    }

    /// Draw a reward with the thread-local RNG.
    pub fn draw(&self) -> Result<(RewardItem, bool), CatalogError> {
        self.draw_with(&mut rand::rng())
    }

    /// Draw a reward: 1% legendary when any exist, otherwise uniform normal.
    pub fn draw_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(RewardItem, bool), CatalogError> {
        let snapshot = self.snapshot();
        let roll: f64 = rng.random();
        if !snapshot.legendary.is_empty() && roll < LEGENDARY_PROBABILITY {
            if let Some(item) = snapshot.legendary.choose(rng) {
                return Ok((item.clone(), true));
            }
        }
        snapshot
            .normal
            .choose(rng)
            .map(|item| (item.clone(), false))
            .ok_or(CatalogError::EmptyNormal)
    }

    /// Pick any legendary reward, ignoring the draw probability.
    pub fn pick_legendary_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RewardItem> {
        self.list_legendary().choose(rng).cloned()
    }
}

/// Turn an asset identifier into a display name.
///
/// `Legendary-golden_loaf.png` becomes `Legendary Golden Loaf`.
pub fn format_display_name(id: &str) -> String {
    let stem = Path::new(id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(id);

    let mut out = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog(ids: &[&str]) -> RewardCatalog {
        RewardCatalog::new(StaticAssets(ids.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_format_display_name() {
        assert_eq!(format_display_name("croissant.png"), "Croissant");
        assert_eq!(format_display_name("Pancakes.png"), "Pancakes");
        assert_eq!(format_display_name("cinnamon_roll.png"), "Cinnamon Roll");
        assert_eq!(
            format_display_name("Legendary-GOLDEN_loaf.png"),
            "Legendary Golden Loaf"
        );
        assert_eq!(format_display_name("no_extension"), "No Extension");
    }

    #[test]
    fn test_fallback_when_no_assets() {
        let catalog = catalog(&[]);
        let normal: Vec<_> = catalog.list_normal().into_iter().map(|i| i.id).collect();
        assert_eq!(normal, FALLBACK_REWARDS.to_vec());
        assert!(catalog.list_legendary().is_empty());
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_splits_legendary_assets() {
        let catalog = catalog(&["donut.png", "Legendary-Crown.png", "bagel.png"]);
        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.normal.len(), 2);
        assert_eq!(snapshot.legendary.len(), 1);
        assert!(snapshot.legendary[0].is_legendary());
        assert!(snapshot.normal.iter().all(|i| i.tier == RewardTier::Normal));
    }

    #[test]
    fn test_only_legendary_assets_fill_normal_pool() {
        let catalog = catalog(&["Legendary-Crown.png"]);
        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.normal[0].id, "Legendary-Crown.png");
        assert_eq!(snapshot.legendary[0].id, "Legendary-Crown.png");
    }

    #[test]
    fn test_empty_fallback_is_rejected() {
        let catalog = catalog(&[]).with_fallback(vec![]);
        assert_eq!(catalog.validate(), Err(CatalogError::EmptyNormal));
        assert_eq!(catalog.draw(), Err(CatalogError::EmptyNormal));
    }

    #[test]
    fn test_legendary_rate_is_about_one_percent() {
        let catalog = catalog(&["donut.png", "bagel.png", "Legendary-Crown.png"]);
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let draws = 100_000;
        let legendary = (0..draws)
            .filter(|_| catalog.draw_with(&mut rng).unwrap().1)
            .count();
        // Binomial(100_000, 0.01): sd ~31.5, allow 5 sd.
        assert!(
            (843..=1157).contains(&legendary),
            "legendary count {legendary} out of tolerance"
        );
    }

    #[test]
    fn test_no_legendary_without_legendary_assets() {
        let catalog = catalog(&["donut.png", "bagel.png"]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let (item, is_legendary) = catalog.draw_with(&mut rng).unwrap();
            assert!(!is_legendary);
            assert_eq!(item.tier, RewardTier::Normal);
        }
    }

    #[test]
    fn test_directory_assets_lists_png_only() {
        let dir = std::env::temp_dir().join(format!("bakerank-assets-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["donut.png", "Legendary-Crown.PNG", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.join("nested.png")).unwrap();

        let ids = DirectoryAssets::new(&dir).list().unwrap();
        assert_eq!(ids, vec!["Legendary-Crown.PNG".to_string(), "donut.png".to_string()]);

        // New files show up without rebuilding the catalog.
        let catalog = RewardCatalog::new(DirectoryAssets::new(&dir));
        assert_eq!(catalog.list_normal().len(), 1);
        std::fs::write(dir.join("bagel.png"), b"").unwrap();
        assert_eq!(catalog.list_normal().len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_uses_fallback() {
        let catalog = RewardCatalog::new(DirectoryAssets::new("/definitely/not/here"));
        assert_eq!(catalog.list_normal().len(), FALLBACK_REWARDS.len());
    }
}
