/// Key the display name is stored under.
pub const USERNAME_KEY: &str = "geo-chat:username";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub key: String,
    pub value: String,
    /// Seconds since the Unix epoch.
    pub updated_at: i64,
}
