//! The conversation state machine: tracks what has been collected,
//! decides what to ask next, and drives slot search and booking
//! through the collaborator traits.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};

use crate::calendar::{CalendarService, day_summary, events_for_date};
use crate::nlp::IntentExtractor;
use crate::scheduling::{TimeSlot, dates, find_slots};

use super::MeetingRequest;
use super::ordinal;

const MEETING_KEYWORDS: [&str; 6] = ["schedule", "meeting", "book", "plan", "appointment", "call"];

const SCHEDULE_LOOKUP_PHRASES: [&str; 6] = [
    "do i have",
    "what's on",
    "am i busy",
    "anything on",
    "my schedule",
    "calendar for",
];

// How many past exchanges ride along in the extraction context
const CONTEXT_EXCHANGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Greeting,
    CollectingDuration,
    CollectingTimePreference,
    ShowingOptions,
    ConfirmingSelection,
    Scheduling,
    HandlingConflict,
    Complete,
}

impl ConversationState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::CollectingDuration => "collecting_duration",
            Self::CollectingTimePreference => "collecting_time_preference",
            Self::ShowingOptions => "showing_options",
            Self::ConfirmingSelection => "confirming_selection",
            Self::Scheduling => "scheduling",
            Self::HandlingConflict => "handling_conflict",
            Self::Complete => "complete",
        }
    }
}

/// One live scheduling conversation. Owns the state, the pending
/// request, and the last offered slots; everything external goes
/// through the collaborator traits.
pub struct Conversation {
    state: ConversationState,
    request: MeetingRequest,
    last_offered: Vec<TimeSlot>,
    selected: Option<TimeSlot>,
    recent: VecDeque<(String, String)>,
    calendar: Arc<dyn CalendarService>,
    nlp: Arc<dyn IntentExtractor>,
    tz: Tz,
    max_slots: usize,
}

impl Conversation {
    pub fn new(
        calendar: Arc<dyn CalendarService>,
        nlp: Arc<dyn IntentExtractor>,
        tz: Tz,
        max_slots: usize,
    ) -> Self {
        Self {
            state: ConversationState::Greeting,
            request: MeetingRequest::default(),
            last_offered: Vec::new(),
            selected: None,
            recent: VecDeque::new(),
            calendar,
            nlp,
            tz,
            max_slots,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn request(&self) -> &MeetingRequest {
        &self.request
    }

    pub fn last_offered(&self) -> &[TimeSlot] {
        &self.last_offered
    }

    pub fn is_complete(&self) -> bool {
        self.state == ConversationState::Complete
    }

    /// Back to a fresh greeting: accumulated fields, offered slots,
    /// and context are all cleared.
    pub fn reset(&mut self) {
        self.state = ConversationState::Greeting;
        self.request = MeetingRequest::default();
        self.last_offered.clear();
        self.selected = None;
        self.recent.clear();
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    fn context_blob(&self) -> Value {
        let history: Vec<Value> = self
            .recent
            .iter()
            .map(|(user, bot)| json!({"user": user, "bot": bot}))
            .collect();
        json!({
            "current_state": self.state.label(),
            "meeting_request": self.request,
            "conversation_history": history,
        })
    }

    fn record_exchange(&mut self, user: &str, bot: &str) {
        self.recent.push_back((user.to_string(), bot.to_string()));
        while self.recent.len() > CONTEXT_EXCHANGES {
            self.recent.pop_front();
        }
    }

    /// Run one turn: extract intent, merge it into the pending
    /// request, and respond according to the current state.
    pub async fn process_user_input(&mut self, input: &str) -> Result<String> {
        let context = self.context_blob();

        // Extraction failure means "no new information", never fatal
        match self.nlp.extract_meeting_info(input, &context).await {
            Ok(intent) => self.request.merge(&intent),
            Err(err) => tracing::warn!("Intent extraction failed: {err}"),
        }

        // Schedule lookups answer without touching conversation state
        let lower = input.to_lowercase();
        if SCHEDULE_LOOKUP_PHRASES
            .iter()
            .any(|phrase| lower.contains(phrase))
        {
            let response = self.schedule_lookup(input).await;
            self.record_exchange(input, &response);
            return Ok(response);
        }

        let response = match self.state {
            ConversationState::Greeting => self.handle_greeting(input),
            ConversationState::CollectingDuration => self.handle_duration_collection(),
            ConversationState::CollectingTimePreference => {
                self.handle_time_preference(input).await
            }
            ConversationState::ShowingOptions => self.handle_option_selection(input),
            ConversationState::ConfirmingSelection => self.handle_confirmation(input).await,
            ConversationState::HandlingConflict => self.handle_conflict_resolution().await,
            ConversationState::Scheduling | ConversationState::Complete => {
                self.fallback_response(input).await
            }
        };

        self.record_exchange(input, &response);
        Ok(response)
    }

    async fn schedule_lookup(&self, input: &str) -> String {
        let Some(date) = dates::resolve(input, self.today()) else {
            return "Sure, what day should I check for you?".to_string();
        };
        match day_summary(self.calendar.as_ref(), date, self.tz).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!("Calendar lookup failed: {err}");
                "Sorry, I couldn't reach your calendar just now.".to_string()
            }
        }
    }

    fn handle_greeting(&mut self, input: &str) -> String {
        let lower = input.to_lowercase();
        let wants_meeting = MEETING_KEYWORDS.iter().any(|k| lower.contains(k));

        if !wants_meeting {
            return "I can help you schedule meetings. Just say something like \
                    'I need to schedule a meeting' or 'Book me a 30-minute call.'"
                .to_string();
        }

        if let Some(duration) = self.request.duration_minutes {
            self.state = ConversationState::CollectingTimePreference;
            format!(
                "Great! I see you want to schedule a {duration}-minute meeting. \
                 When would you like to meet?"
            )
        } else {
            self.state = ConversationState::CollectingDuration;
            "I'd be happy to help you schedule a meeting! How long should it be?".to_string()
        }
    }

    fn handle_duration_collection(&mut self) -> String {
        // The merge at the top of the turn already pulled a duration
        // out of the utterance if there was one
        if let Some(duration) = self.request.duration_minutes {
            self.state = ConversationState::CollectingTimePreference;
            format!(
                "Perfect! {duration} minutes it is. When would you like to schedule this meeting?"
            )
        } else {
            "I didn't catch the duration. Could you tell me how long the meeting should be? \
             For example, '30 minutes', '1 hour', or 'a quick 15-minute chat'."
                .to_string()
        }
    }

    async fn handle_time_preference(&mut self, input: &str) -> String {
        if self.request.preferred_date.is_none() {
            match dates::resolve(input, self.today()) {
                Some(date) => self.request.preferred_date = Some(date),
                None => {
                    return "I didn't understand the date. Could you try again? For example, \
                            'tomorrow afternoon', 'next Tuesday', or 'this Friday morning'."
                        .to_string();
                }
            }
        }

        let (Some(date), Some(duration)) =
            (self.request.preferred_date, self.request.duration_minutes)
        else {
            return "How long should the meeting be?".to_string();
        };

        let slots = match self.search_slots(date, duration).await {
            Ok(slots) => slots,
            Err(err) => {
                tracing::error!("Calendar query failed: {err}");
                return "Sorry, I couldn't check your calendar just now. \
                        Could you try that again?"
                    .to_string();
            }
        };

        if slots.is_empty() {
            self.state = ConversationState::HandlingConflict;
            return "Sorry, I couldn't find any open slots for that time. \
                    Would you like to try another day?"
                .to_string();
        }

        self.last_offered = slots;
        self.state = ConversationState::ShowingOptions;

        let plural = if self.last_offered.len() > 1 { "s" } else { "" };
        let mut response = format!(
            "I found {} available time slot{plural}:\n",
            self.last_offered.len()
        );
        for (i, slot) in self.last_offered.iter().enumerate() {
            response.push_str(&format!("{}. {}\n", i + 1, slot));
        }
        response.push_str(
            "Which one works for you? Just say something like 'Option 1' or 'the second one'.",
        );
        response
    }

    fn handle_option_selection(&mut self, input: &str) -> String {
        let selection = ordinal::selection_reference(input);

        match selection {
            Some(n) if n >= 1 && n <= self.last_offered.len() => {
                let slot = self.last_offered[n - 1].clone();
                self.request.preferred_date = Some(slot.start.date_naive());
                self.selected = Some(slot.clone());
                self.state = ConversationState::ConfirmingSelection;
                format!("Got it! You selected: {slot}. Should I go ahead and schedule this meeting?")
            }
            _ => "I'm not sure which option you selected. Please say the number of the option \
                  you'd like, like 'Option 1' or 'the second one'."
                .to_string(),
        }
    }

    async fn handle_confirmation(&mut self, input: &str) -> String {
        let lower = input.to_lowercase();

        if lower.contains("yes") {
            let Some(slot) = self.selected.clone() else {
                self.state = ConversationState::ShowingOptions;
                return "I lost track of your selection. Please pick an option again.".to_string();
            };
            self.state = ConversationState::Scheduling;
            match self
                .calendar
                .schedule_meeting(&slot, &self.request.title, &self.request.attendees, "")
                .await
            {
                Ok(()) => {
                    self.state = ConversationState::Complete;
                    "Your meeting has been successfully scheduled. \
                     Anything else I can help you with?"
                        .to_string()
                }
                Err(err) => {
                    tracing::error!("Failed to schedule meeting: {err}");
                    self.state = ConversationState::ConfirmingSelection;
                    "I tried to schedule the meeting but ran into an issue. \
                     Would you like to try another time?"
                        .to_string()
                }
            }
        } else if lower.contains("no") {
            self.state = ConversationState::ShowingOptions;
            "No problem. Please select another available time slot.".to_string()
        } else {
            "Please confirm if you'd like to schedule this meeting now. \
             You can say 'yes' or 'no'."
                .to_string()
        }
    }

    async fn handle_conflict_resolution(&mut self) -> String {
        // Intent from this utterance was merged at the top of the turn
        if let (Some(date), Some(duration)) =
            (self.request.preferred_date, self.request.duration_minutes)
        {
            return self.find_and_present_options(date, duration).await;
        }
        "Would you like to try a shorter meeting or a different time range?".to_string()
    }

    /// Slot search for the conflict path: presents annotated options,
    /// and falls back to alternative days when the target day is full.
    async fn find_and_present_options(&mut self, date: NaiveDate, duration: i64) -> String {
        let slots = match self.search_slots(date, duration).await {
            Ok(slots) => slots,
            Err(err) => {
                tracing::error!("Calendar query failed: {err}");
                return "Sorry, I couldn't check your calendar just now. \
                        Could you try that again?"
                    .to_string();
            }
        };

        if slots.is_empty() {
            return self.handle_no_slots_available(date, duration).await;
        }

        self.last_offered = slots;
        self.state = ConversationState::ShowingOptions;

        let mut response = format!(
            "I found {} available time slots for your {duration}-minute meeting:\n\n",
            self.last_offered.len()
        );
        for (i, slot) in self.last_offered.iter().enumerate() {
            let annotation = if slot.confidence > 0.8 {
                " (Great time!)"
            } else if slot.confidence < 0.5 {
                " (Workable, but not ideal)"
            } else {
                ""
            };
            response.push_str(&format!("{}. {slot}{annotation}\n", i + 1));
        }
        response
            .push_str("\nWhich option works best for you? Just say the number or describe your preference.");
        response
    }

    async fn handle_no_slots_available(&mut self, date: NaiveDate, duration: i64) -> String {
        let alternatives = self.suggest_alternatives(date, duration).await;

        if alternatives.is_empty() {
            return format!(
                "I'm sorry, I couldn't find any {duration}-minute slots in the next week. \
                 Would you like to try a shorter meeting duration or a different time range?"
            );
        }

        self.last_offered = alternatives;
        self.state = ConversationState::ShowingOptions;

        let day = date.format("%A, %B %d");
        let mut response = format!(
            "I don't have any {duration}-minute slots available on {day}. \
             But I found these alternatives:\n\n"
        );
        for (i, slot) in self.last_offered.iter().take(3).enumerate() {
            response.push_str(&format!("{}. {slot}\n", i + 1));
        }
        response.push_str("\nWould any of these work for you?");
        response
    }

    /// Ranked slots from nearby days when the preferred one is full.
    /// Weekends are skipped unless the original request was already a
    /// weekend.
    async fn suggest_alternatives(&self, original: NaiveDate, duration: i64) -> Vec<TimeSlot> {
        let original_is_weekend = original.weekday().num_days_from_monday() >= 5;
        let mut alternatives = Vec::new();

        for days_ahead in 1..8 {
            let alt_date = original + Duration::days(days_ahead);
            let alt_is_weekend = alt_date.weekday().num_days_from_monday() >= 5;
            if alt_is_weekend && !original_is_weekend {
                continue;
            }

            match self.search_slots(alt_date, duration).await {
                Ok(slots) => alternatives.extend(slots),
                Err(err) => tracing::warn!("Skipping {alt_date} in alternatives: {err}"),
            }

            if alternatives.len() >= 5 {
                break;
            }
        }

        alternatives.truncate(5);
        alternatives
    }

    async fn search_slots(&self, date: NaiveDate, duration: i64) -> Result<Vec<TimeSlot>> {
        let events = events_for_date(self.calendar.as_ref(), date, self.tz).await?;
        Ok(find_slots(
            &events,
            date,
            duration,
            self.request.time_range,
            self.max_slots,
            self.tz,
        ))
    }

    async fn fallback_response(&self, input: &str) -> String {
        match self
            .nlp
            .generate_response(self.state.label(), &self.context_blob(), input)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("Response generation failed: {err}");
                "I'm not sure how to help with that. Could you please try again?".to_string()
            }
        }
    }

    /// Fast-path booking used by the orchestrator when the user names
    /// an offered option directly. `index` is zero-based and must be
    /// in range.
    pub async fn book_offered(&mut self, index: usize) -> String {
        let Some(slot) = self.last_offered.get(index).cloned() else {
            return "I'm not sure which option you selected.".to_string();
        };

        match self
            .calendar
            .schedule_meeting(&slot, "Scheduled via Assistant", &[], "Auto-booked by assistant")
            .await
        {
            Ok(()) => format!(
                "Great! Your meeting has been scheduled at {}.",
                slot.start.format("%I:%M %p on %A, %B %d")
            ),
            Err(err) => {
                tracing::error!("Fast-path booking failed: {err}");
                "Sorry, I wasn't able to schedule the meeting.".to_string()
            }
        }
    }
}
