//! Fixed per-command cooldowns keyed by (command, guild, user).

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::base::types::{BotError, Res};

type CooldownKey = (String, Option<u64>, u64);

/// Tracks the last accepted use of each command per guild member.
pub struct Cooldowns {
    period: Duration,
    last_used: Mutex<HashMap<CooldownKey, Instant>>,
}

impl Cooldowns {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_used: Mutex::new(HashMap::new()),
        }
    }

    /// Accept a use now, or fail with `BotError::Cooldown` carrying the remaining wait.
    pub fn check(&self, command: &str, guild_id: Option<u64>, user_id: u64) -> Res<()> {
        self.check_at(command, guild_id, user_id, Instant::now())
    }

    /// As `check`, at an explicit instant.
    pub fn check_at(&self, command: &str, guild_id: Option<u64>, user_id: u64, now: Instant) -> Res<()> {
        let mut last_used = self.last_used.lock().map_err(|_| anyhow::anyhow!("Cooldown table lock poisoned."))?;

        // Forget entries that can no longer block anything.
        last_used.retain(|_, at| now.saturating_duration_since(*at) < self.period);

        let key = (command.to_string(), guild_id, user_id);

        if let Some(at) = last_used.get(&key) {
            let remaining = self.period.saturating_sub(now.saturating_duration_since(*at));
            return Err(BotError::Cooldown { remaining }.into());
        }

        last_used.insert(key, now);

        Ok(())
    }
}

// Tests.
