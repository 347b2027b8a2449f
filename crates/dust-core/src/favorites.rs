//! Starred events, camps, art and friends.
//!
//! Only the contract and an in-memory store live here; persisting the lists
//! is up to whoever embeds the guide.

use serde::{Deserialize, Serialize};

use crate::model::{ArtId, CampId, EventId};

/// The id lists a user has starred, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    #[serde(default)]
    pub events: Vec<EventId>,
    #[serde(default)]
    pub camps: Vec<CampId>,
    #[serde(default)]
    pub art: Vec<ArtId>,
    #[serde(default)]
    pub friends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Favorite {
    Event(EventId),
    Camp(CampId),
    Art(ArtId),
    Friend(String),
}

pub trait FavoritesStore {
    /// Add (`star = true`) or remove an item. Returns whether the lists
    /// changed; starring twice or removing an absent item is a no-op.
    fn star(&mut self, star: bool, item: Favorite) -> bool;

    fn contains(&self, item: &Favorite) -> bool;

    fn list(&self) -> Favorites;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFavorites {
    favorites: Favorites,
    generation: u64,
}

impl MemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_favorites(favorites: Favorites) -> Self {
        Self {
            favorites,
            generation: 0,
        }
    }

    /// Bumped on every change so observers can tell when to re-read.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl FavoritesStore for MemoryFavorites {
    fn star(&mut self, star: bool, item: Favorite) -> bool {
        let lists = &mut self.favorites;
        let changed = match item {
            Favorite::Event(id) => include(star, id, &mut lists.events),
            Favorite::Camp(id) => include(star, id, &mut lists.camps),
            Favorite::Art(id) => include(star, id, &mut lists.art),
            Favorite::Friend(name) => include(star, name, &mut lists.friends),
        };
        if changed {
            self.generation += 1;
        }
        changed
    }

    fn contains(&self, item: &Favorite) -> bool {
        let lists = &self.favorites;
        match item {
            Favorite::Event(id) => lists.events.contains(id),
            Favorite::Camp(id) => lists.camps.contains(id),
            Favorite::Art(id) => lists.art.contains(id),
            Favorite::Friend(name) => lists.friends.contains(name),
        }
    }

    fn list(&self) -> Favorites {
        self.favorites.clone()
    }
}

fn include<T: PartialEq>(add: bool, value: T, items: &mut Vec<T>) -> bool {
    let position = items.iter().position(|item| *item == value);
    match (add, position) {
        (true, None) => {
            items.push(value);
            true
        }
        (false, Some(index)) => {
            items.remove(index);
            true
        }
        _ => false,
    }
}
