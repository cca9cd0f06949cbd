use crate::config::Config;
use crate::store::{Collection, Entity, Restaurant, SharedCollection, StoreError, UserLocation};

pub struct AppState {
    pub restaurants: SharedCollection<Restaurant>,
    pub user_locations: SharedCollection<UserLocation>,
    pub default_max_distance: f64,
}

impl AppState {
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        Ok(Self {
            restaurants: SharedCollection::new(Collection::open(&config.data_dir)?),
            user_locations: SharedCollection::new(Collection::open(&config.data_dir)?),
            default_max_distance: config.default_max_distance,
        })
    }

    pub fn in_memory(default_max_distance: f64) -> Self {
        Self {
            restaurants: SharedCollection::new(Collection::in_memory()),
            user_locations: SharedCollection::new(Collection::in_memory()),
            default_max_distance,
        }
    }
}

/// An entity exposed as a REST resource under `/api/<PATH>/`.
pub trait Resource: Entity {
    const PATH: &'static str;

    fn shared(state: &AppState) -> &SharedCollection<Self>;
}

impl Resource for Restaurant {
    const PATH: &'static str = "restaurants";

    fn shared(state: &AppState) -> &SharedCollection<Self> {
        &state.restaurants
    }
}

impl Resource for UserLocation {
    const PATH: &'static str = "user-locations";

    fn shared(state: &AppState) -> &SharedCollection<Self> {
        &state.user_locations
    }
}
