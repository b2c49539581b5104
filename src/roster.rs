//! Ordered set of player ids known to be in the held gathering.

/// Player ids in join-arrival order.
///
/// Adding an id that is already present is a no-op, so a duplicated `Join`
/// notification cannot leave a ghost entry behind after the matching
/// `Leave`.
///
/// # Example
///
/// ```
/// use gathering_client::JoinedPlayerRoster;
///
/// let mut roster = JoinedPlayerRoster::new();
/// assert!(roster.is_empty());
/// roster.add("p1");
/// roster.add("p2");
/// assert!(!roster.add("p1"));
/// roster.remove("p1");
/// assert_eq!(roster.as_slice(), ["p2".to_string()]);
/// assert_eq!(roster.len(), 1);
/// assert!(roster.contains("p2"));
/// roster.clear();
/// assert!(roster.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinedPlayerRoster {
    players: Vec<String>,
}

impl JoinedPlayerRoster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `player_id`. Returns `false` if it was already present.
    pub fn add(&mut self, player_id: impl Into<String>) -> bool {
        let player_id = player_id.into();
        if self.contains(&player_id) {
            return false;
        }
        self.players.push(player_id);
        true
    }

    /// Remove `player_id`. Returns `false` if it was not present.
    pub fn remove(&mut self, player_id: &str) -> bool {
        match self.players.iter().position(|p| p == player_id) {
            Some(index) => {
                self.players.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the whole roster with a single player.
    pub fn reset_to(&mut self, player_id: impl Into<String>) {
        self.players.clear();
        self.players.push(player_id.into());
    }

    /// Remove every player.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Whether `player_id` is in the roster.
    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player is in the roster.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player ids in arrival order.
    pub fn as_slice(&self) -> &[String] {
        &self.players
    }

    /// Owned copy for handing out in events.
    pub fn snapshot(&self) -> Vec<String> {
        self.players.clone()
    }
}
