use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Business hours and slot length, fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    business_hours_start: u32,
    business_hours_end: u32,
    slot_duration_minutes: u32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            business_hours_start: 9,
            business_hours_end: 17,
            slot_duration_minutes: 30,
        }
    }
}

impl SlotConfig {
    pub fn new(
        business_hours_start: u32,
        business_hours_end: u32,
        slot_duration_minutes: u32,
    ) -> Result<Self, ConfigError> {
        if business_hours_start >= business_hours_end || business_hours_end > 24 {
            return Err(ConfigError::BusinessHours {
                start: business_hours_start,
                end: business_hours_end,
            });
        }
        if slot_duration_minutes == 0 {
            return Err(ConfigError::ZeroSlotDuration);
        }

        Ok(Self {
            business_hours_start,
            business_hours_end,
            slot_duration_minutes,
        })
    }

    pub fn business_hours_start(&self) -> u32 {
        self.business_hours_start
    }

    pub fn business_hours_end(&self) -> u32 {
        self.business_hours_end
    }

    pub fn slot_duration_minutes(&self) -> u32 {
        self.slot_duration_minutes
    }

    /// Every slot start from the opening hour up to, but excluding, the
    /// closing hour, as `HH:MM`. The last slot may run past closing when the
    /// duration does not divide the business day.
    pub fn candidate_slots(&self) -> Vec<String> {
        let step = Duration::minutes(i64::from(self.slot_duration_minutes));
        // Closing at 24 has no `NaiveTime`; the grid then ends at the midnight wrap.
        let closing = NaiveTime::from_hms_opt(self.business_hours_end, 0, 0);
        let Some(mut slot) = NaiveTime::from_hms_opt(self.business_hours_start, 0, 0) else {
            return Vec::new();
        };

        let mut slots = Vec::new();
        while closing.map_or(true, |closing| slot < closing) {
            slots.push(slot.format("%H:%M").to_string());
            let (next, wrapped) = slot.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            slot = next;
        }
        slots
    }
}
