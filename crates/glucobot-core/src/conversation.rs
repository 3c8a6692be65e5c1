//! Per-chat conversation state machine for reminder setup.
//!
//! The machine is pure: [`transition`] maps `(state, event, now)` to the
//! next state plus the [`Action`]s the transport layer must execute. No
//! Telegram types appear here; the adapter owns delivery and scheduling.
//!
//! Dialogue shape: `Idle → AwaitingMealTime → AwaitingReminderMinutes → Idle`.
//! Start is a hard reset from any state; Stop clears the chat's notify flag
//! and returns to `Idle` from any state.

use chrono::{DateTime, Local};
use dashmap::DashMap;

use crate::timecalc;

/// A validated wall-clock meal time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealTime {
    pub hour: u8,
    pub minute: u8,
}

impl MealTime {
    /// Parse `HH:MM`: exactly two integer parts, hour in [0,24),
    /// minute in [0,60). Anything else is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let (h, m) = text.trim().split_once(':')?;
        let hour: u8 = h.trim().parse().ok()?;
        let minute: u8 = m.trim().parse().ok()?;
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }
}

/// What the machine expects next from a chat.
///
/// The validated meal time rides inside `AwaitingReminderMinutes`, so "meal
/// time present only once validated" holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    /// No setup in progress.
    #[default]
    Idle,
    /// Waiting for the meal time (`HH:MM`).
    AwaitingMealTime,
    /// Waiting for the delay in minutes.
    AwaitingReminderMinutes { meal: MealTime },
}

/// One inbound unit for a single chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// `/start` command or the Start button.
    Start,
    /// `/stop` command or the Stop button.
    Stop,
    /// Free-form message text.
    Text(&'a str),
}

/// User-facing reply emitted by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome,
    AskDelay,
    BadMealTime,
    BadDelay,
    Confirmed { at: DateTime<Local> },
    Stopped,
}

impl Reply {
    /// The message text sent to the chat.
    pub fn text(&self) -> String {
        match self {
            Reply::Welcome => {
                "Hi! 👋\nI'm here to help you remember your blood draw after a meal.\n\nTo begin, tell me what time you ate (in HH:MM format):".to_string()
            }
            Reply::AskDelay => {
                "Great! 🕒\nNow tell me how many minutes after the meal I should remind you.\n\nSend a number of minutes (for example, 30 or 120):".to_string()
            }
            Reply::BadMealTime => {
                "❌ That time doesn't look right.\nPlease send it in HH:MM format (for example, 14:30).".to_string()
            }
            Reply::BadDelay => {
                "❌ That value doesn't look right.\nPlease send a whole number of minutes (for example, 30 or 120).".to_string()
            }
            Reply::Confirmed { at } => format!(
                "✅ Got it!\n\nI'll remind you about the blood draw at {}.\n\nIf anything changes, just send /start.",
                at.format("%H:%M")
            ),
            Reply::Stopped => {
                "Reminders stopped. Send /start to set up a new one.".to_string()
            }
        }
    }
}

/// Side effect requested by a transition, executed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a reply to the chat.
    Reply(Reply),
    /// Activate the chat's notify flag and enqueue a one-shot job at `at`.
    ScheduleReminder { at: DateTime<Local> },
    /// Clear the chat's notify flag so any running loop stops at its next poll.
    StopNotifications,
}

/// Advance the machine by one event.
///
/// `now` is only read when a setup completes, to anchor the reminder
/// instant; passing it in keeps the function pure.
pub fn transition(
    state: ConversationState,
    event: Event<'_>,
    now: DateTime<Local>,
) -> (ConversationState, Vec<Action>) {
    match (state, event) {
        (_, Event::Start) => (
            ConversationState::AwaitingMealTime,
            vec![Action::Reply(Reply::Welcome)],
        ),
        (_, Event::Stop) => (
            ConversationState::Idle,
            vec![Action::StopNotifications, Action::Reply(Reply::Stopped)],
        ),
        // Free text with no setup in progress is ignored here; the adapter
        // may still answer /help on its own.
        (ConversationState::Idle, Event::Text(_)) => (ConversationState::Idle, Vec::new()),
        (ConversationState::AwaitingMealTime, Event::Text(text)) => match MealTime::parse(text) {
            Some(meal) => (
                ConversationState::AwaitingReminderMinutes { meal },
                vec![Action::Reply(Reply::AskDelay)],
            ),
            None => (
                ConversationState::AwaitingMealTime,
                vec![Action::Reply(Reply::BadMealTime)],
            ),
        },
        (ConversationState::AwaitingReminderMinutes { meal }, Event::Text(text)) => {
            let minutes = match text.trim().parse::<i64>() {
                Ok(m) if m >= 0 => m,
                _ => {
                    return (
                        ConversationState::AwaitingReminderMinutes { meal },
                        vec![Action::Reply(Reply::BadDelay)],
                    )
                }
            };
            match timecalc::reminder_instant(now, meal, minutes) {
                Some(at) => (
                    ConversationState::Idle,
                    vec![
                        Action::ScheduleReminder { at },
                        Action::Reply(Reply::Confirmed { at }),
                    ],
                ),
                // The meal time falls in a DST gap or the delay overflows.
                None => (
                    ConversationState::AwaitingReminderMinutes { meal },
                    vec![Action::Reply(Reply::BadDelay)],
                ),
            }
        }
    }
}

/// In-memory per-chat session store.
///
/// One entry per chat with a setup in progress; `Idle` chats hold no entry.
/// Messages from one chat arrive in order (transport guarantee), so the
/// per-key map entry is the only synchronization needed.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: DashMap<i64, ConversationState>,
}

impl SessionStore {
    /// Current state for `chat_id`; unknown chats are `Idle`.
    pub fn state(&self, chat_id: i64) -> ConversationState {
        self.inner
            .get(&chat_id)
            .map(|entry| *entry)
            .unwrap_or_default()
    }

    /// Store the next state. `Idle` removes the entry instead.
    pub fn put(&self, chat_id: i64, state: ConversationState) {
        if state == ConversationState::Idle {
            self.inner.remove(&chat_id);
        } else {
            self.inner.insert(chat_id, state);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 8, 7, 12, 0, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn meal_time_accepts_valid_bounds() {
        assert_eq!(MealTime::parse("00:00"), Some(MealTime { hour: 0, minute: 0 }));
        assert_eq!(MealTime::parse("23:59"), Some(MealTime { hour: 23, minute: 59 }));
        assert_eq!(MealTime::parse(" 9:5 "), Some(MealTime { hour: 9, minute: 5 }));
    }

    #[test]
    fn meal_time_rejects_out_of_range_and_malformed() {
        for bad in ["24:00", "14:60", "14:99", "14.30", "1430", "a:b", ":30", "14:", "10:30:00", ""] {
            assert_eq!(MealTime::parse(bad), None, "should reject {bad:?}");
        }
    }

    #[test]
    fn start_resets_from_any_state() {
        for state in [
            ConversationState::Idle,
            ConversationState::AwaitingMealTime,
            ConversationState::AwaitingReminderMinutes {
                meal: MealTime { hour: 9, minute: 0 },
            },
        ] {
            let (next, actions) = transition(state, Event::Start, noon());
            assert_eq!(next, ConversationState::AwaitingMealTime);
            assert_eq!(actions, vec![Action::Reply(Reply::Welcome)]);
        }
    }

    #[test]
    fn stop_clears_and_acknowledges_from_any_state() {
        let (next, actions) = transition(ConversationState::AwaitingMealTime, Event::Stop, noon());
        assert_eq!(next, ConversationState::Idle);
        assert_eq!(
            actions,
            vec![Action::StopNotifications, Action::Reply(Reply::Stopped)]
        );
    }

    #[test]
    fn idle_text_is_a_no_op() {
        let (next, actions) = transition(ConversationState::Idle, Event::Text("hello"), noon());
        assert_eq!(next, ConversationState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn valid_meal_time_advances_to_delay_prompt() {
        let (next, actions) = transition(
            ConversationState::AwaitingMealTime,
            Event::Text("09:15"),
            noon(),
        );
        assert_eq!(
            next,
            ConversationState::AwaitingReminderMinutes {
                meal: MealTime { hour: 9, minute: 15 }
            }
        );
        assert_eq!(actions, vec![Action::Reply(Reply::AskDelay)]);
    }

    #[test]
    fn bad_meal_time_reprompts_in_place() {
        let (next, actions) = transition(
            ConversationState::AwaitingMealTime,
            Event::Text("25:00"),
            noon(),
        );
        assert_eq!(next, ConversationState::AwaitingMealTime);
        assert_eq!(actions, vec![Action::Reply(Reply::BadMealTime)]);
    }

    #[test]
    fn completed_setup_schedules_and_confirms_the_computed_time() {
        let meal = MealTime { hour: 9, minute: 15 };
        let (next, actions) = transition(
            ConversationState::AwaitingReminderMinutes { meal },
            Event::Text("45"),
            noon(),
        );
        assert_eq!(next, ConversationState::Idle);
        assert_eq!(actions.len(), 2);
        let Action::ScheduleReminder { at } = &actions[0] else {
            panic!("expected a ScheduleReminder action, got {:?}", actions[0]);
        };
        assert_eq!(at.format("%H:%M").to_string(), "10:00");
        assert_eq!(actions[1], Action::Reply(Reply::Confirmed { at: *at }));
    }

    #[test]
    fn negative_or_non_numeric_delay_reprompts_in_place() {
        let meal = MealTime { hour: 9, minute: 15 };
        for bad in ["-5", "abc", "1.5", ""] {
            let state = ConversationState::AwaitingReminderMinutes { meal };
            let (next, actions) = transition(state, Event::Text(bad), noon());
            assert_eq!(next, state, "state must not advance for {bad:?}");
            assert_eq!(actions, vec![Action::Reply(Reply::BadDelay)]);
        }
    }

    #[test]
    fn zero_delay_is_accepted() {
        let meal = MealTime { hour: 14, minute: 0 };
        let (next, actions) = transition(
            ConversationState::AwaitingReminderMinutes { meal },
            Event::Text("0"),
            noon(),
        );
        assert_eq!(next, ConversationState::Idle);
        assert!(matches!(actions[0], Action::ScheduleReminder { .. }));
    }

    #[test]
    fn session_store_defaults_to_idle_and_drops_idle_entries() {
        let store = SessionStore::default();
        assert_eq!(store.state(1), ConversationState::Idle);

        store.put(1, ConversationState::AwaitingMealTime);
        assert_eq!(store.state(1), ConversationState::AwaitingMealTime);
        assert_eq!(store.len(), 1);

        store.put(1, ConversationState::Idle);
        assert!(store.is_empty());
    }
}
