//! Sprite manifest and image cache
//!
//! The cache is filled asynchronously by the host as images finish loading.
//! Lookups never fail hard: a missing sprite just means the render pass falls
//! back to primitives (or skips the explosion frame).

use std::collections::HashMap;

/// Enemy skins available for default enemies
pub const ENEMY_SKIN_COUNT: u8 = 5;
/// First file index of the explosion sheet on disk
pub const EXPLOSION_FILE_OFFSET: u32 = 16;

/// Lookup key for every drawable image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    Player,
    /// Default enemy skin (0..ENEMY_SKIN_COUNT)
    Enemy(u8),
    FireEnemy,
    Heart,
    Buff,
    /// Explosion sheet frame index
    Explosion(u32),
}

impl SpriteKey {
    /// Path of the image backing this sprite
    pub fn path(self) -> String {
        match self {
            SpriteKey::Player => "/chars/15.svg".to_string(),
            SpriteKey::Enemy(skin) => format!("/chars/{}.svg", 10 + u32::from(skin % ENEMY_SKIN_COUNT)),
            SpriteKey::FireEnemy => "/chars/8.svg".to_string(),
            SpriteKey::Heart => "/pickups/heart.svg".to_string(),
            SpriteKey::Buff => "/pickups/buff.svg".to_string(),
            SpriteKey::Explosion(frame) => {
                format!("/explotion/frame({}).png", EXPLOSION_FILE_OFFSET + frame)
            }
        }
    }
}

/// Every sprite the game wants loaded, given the explosion sheet length
pub fn manifest(explosion_frames: u32) -> Vec<SpriteKey> {
    let mut keys = vec![SpriteKey::Player, SpriteKey::FireEnemy, SpriteKey::Heart, SpriteKey::Buff];
    keys.extend((0..ENEMY_SKIN_COUNT).map(SpriteKey::Enemy));
    keys.extend((0..explosion_frames).map(SpriteKey::Explosion));
    keys
}

/// Read-only (from the simulation's side) image store
#[derive(Debug)]
pub struct AssetCache<I> {
    images: HashMap<SpriteKey, I>,
    failed: usize,
}

impl<I> Default for AssetCache<I> {
    fn default() -> Self {
        Self {
            images: HashMap::new(),
            failed: 0,
        }
    }
}

impl<I> AssetCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SpriteKey, image: I) {
        self.images.insert(key, image);
    }

    /// Note a load failure; the sprite stays missing
    pub fn mark_failed(&mut self, key: SpriteKey) {
        log::warn!("Failed to load sprite {}", key.path());
        self.failed += 1;
    }

    pub fn get(&self, key: SpriteKey) -> Option<&I> {
        self.images.get(&key)
    }

    pub fn contains(&self, key: SpriteKey) -> bool {
        self.images.contains_key(&key)
    }

    pub fn loaded(&self) -> usize {
        self.images.len()
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
