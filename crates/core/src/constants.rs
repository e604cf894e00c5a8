/// MQTT topic the smart plate publishes its weight samples to.
pub const SENSOR_READING_TOPIC: &str = "smartbite/sensor/lectura";

/// Role sent with self-service registrations.
pub const DEFAULT_USER_ROLE: &str = "USER";

// Preference keys shared with the mobile client.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_ID_KEY: &str = "user_id";

const OBJECTIVE_KEY_PREFIX: &str = "objetivo_";
const PROTEIN_GOAL_KEY_PREFIX: &str = "meta_prote_";
const CARBOHYDRATE_GOAL_KEY_PREFIX: &str = "meta_carbo_";
const VEGETABLE_GOAL_KEY_PREFIX: &str = "meta_vegetal_";

/// Goal values shown before the user has ever computed their own.
pub const DEFAULT_PROTEIN_GOAL_G: i64 = 1000;
pub const DEFAULT_CARBOHYDRATE_GOAL_G: i64 = 1800;
pub const DEFAULT_VEGETABLE_GOAL_G: i64 = 500;

/// Default interval for the refresh polling fallback.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

pub fn objective_key(user_id: i64) -> String {
    format!("{}{}", OBJECTIVE_KEY_PREFIX, user_id)
}

pub fn protein_goal_key(user_id: i64) -> String {
    format!("{}{}", PROTEIN_GOAL_KEY_PREFIX, user_id)
}

pub fn carbohydrate_goal_key(user_id: i64) -> String {
    format!("{}{}", CARBOHYDRATE_GOAL_KEY_PREFIX, user_id)
}

pub fn vegetable_goal_key(user_id: i64) -> String {
    format!("{}{}", VEGETABLE_GOAL_KEY_PREFIX, user_id)
}
