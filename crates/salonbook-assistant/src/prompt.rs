// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for conversation providers.
//!
//! The system prompt has a static part (instructions and the JSON reply
//! contract, or `assistant.system_prompt` when configured) and a dynamic
//! part rebuilt every turn (today's date and the pending action).

use chrono::NaiveDate;
use salonbook_config::model::AssistantConfig;
use salonbook_core::types::{ConversationRequest, PromptMessage};

use crate::session::ConversationSession;

const REPLY_CONTRACT: &str = r#"Always answer with a single JSON object and nothing else:
{"intent": "<INTENT>", "entities": {<field>: <value>}, "response": "<reply to the admin>", "requiresFollowUp": <bool>, "followUpQuestions": ["<question>"]}

Intents and their fields (required fields first, optional in brackets):
- ADD_EMPLOYEE: name, role, phone, email
- GET_REVENUE: date [endDate]
- REASSIGN_APPOINTMENTS: employeeName, date [toEmployeeName]
- ASSIGN_BOOKING: bookingId, stylistName
- CANCEL_BOOKING: bookingId
- CHAT: no fields; use for greetings and questions

Dates are YYYY-MM-DD, or the words today, yesterday, tomorrow.
Only include entities the admin actually stated. Never invent values.
When a required field is missing, set requiresFollowUp to true and ask for it.
Do not claim an action succeeded; the system confirms it after running it."#;

/// Builds [`ConversationRequest`]s from session state.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instructions: String,
    history_limit: usize,
    max_tokens: u32,
}

impl PromptBuilder {
    pub fn new(config: &AssistantConfig) -> Self {
        let instructions = match config.system_prompt.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => custom.to_string(),
            _ => format!(
                "You are {}, the admin assistant of a salon. You help the salon admin \
                 manage employees, revenue and bookings.\n\n{REPLY_CONTRACT}",
                config.name
            ),
        };
        Self {
            instructions,
            history_limit: config.history_limit.max(1),
            max_tokens: config.max_tokens,
        }
    }

    /// The full system prompt for one turn.
    pub fn system_prompt(&self, session: &ConversationSession, today: NaiveDate) -> String {
        let mut prompt = format!(
            "{}\n\nToday is {} ({}).",
            self.instructions,
            today.format("%Y-%m-%d"),
            today.format("%A")
        );
        if let Some(pending) = &session.pending {
            let known = serde_json::to_string(&pending.entities).unwrap_or_default();
            prompt.push_str(&format!(
                "\n\nThe admin is in the middle of {} ({}). Already collected: {}. \
                 Still missing: {}. Treat the next message as supplying missing fields \
                 unless the admin clearly asks for something else.",
                pending.kind.describe(),
                pending.kind,
                known,
                pending.missing_fields().join(", ")
            ));
        }
        prompt
    }

    /// The provider request for the session's current state. The session's
    /// last message is expected to be the current user turn.
    pub fn build(&self, session: &ConversationSession, today: NaiveDate) -> ConversationRequest {
        let mut messages: Vec<PromptMessage> = session
            .recent_messages(self.history_limit)
            .iter()
            .map(|m| PromptMessage {
                role: m.role,
                content: m.text.clone(),
            })
            .collect();
        // Providers reject a conversation opening with an assistant turn.
        while messages
            .first()
            .is_some_and(|m| m.role == salonbook_core::Role::Assistant)
        {
            messages.remove(0);
        }

        ConversationRequest {
            system_prompt: self.system_prompt(session, today),
            messages,
            max_tokens: self.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, Entities};
    use salonbook_core::{Role, SessionId};

    fn listed_intents() -> [ActionKind; 6] {
        [
            ActionKind::AddEmployee,
            ActionKind::GetRevenue,
            ActionKind::ReassignAppointments,
            ActionKind::AssignBooking,
            ActionKind::CancelBooking,
            ActionKind::Chat,
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn default_prompt_names_every_intent_and_date() {
        let builder = PromptBuilder::new(&AssistantConfig::default());
        let session = ConversationSession::new(SessionId::default_session());
        let prompt = builder.system_prompt(&session, today());
        assert!(prompt.starts_with("You are Salon Assistant"));
        for kind in listed_intents() {
            assert!(prompt.contains(&kind.to_string()), "{kind} missing");
        }
        assert!(prompt.contains("Today is 2026-10-15 (Thursday)"));
    }

    #[test]
    fn custom_prompt_replaces_instructions() {
        let config = AssistantConfig {
            system_prompt: Some("Be brief.".into()),
            ..Default::default()
        };
        let builder = PromptBuilder::new(&config);
        let session = ConversationSession::new(SessionId::default_session());
        assert!(builder.system_prompt(&session, today()).starts_with("Be brief."));
    }

    #[test]
    fn pending_action_is_described() {
        let builder = PromptBuilder::new(&AssistantConfig::default());
        let mut session = ConversationSession::new(SessionId::default_session());
        let mut entities = Entities::new();
        entities.insert("name".into(), "Rahul".into());
        session.begin(ActionKind::AddEmployee, entities);

        let prompt = builder.system_prompt(&session, today());
        assert!(prompt.contains("ADD_EMPLOYEE"));
        assert!(prompt.contains(r#"{"name":"Rahul"}"#));
        assert!(prompt.contains("Still missing: role, phone, email"));
    }

    #[test]
    fn history_is_capped_and_starts_with_user() {
        let config = AssistantConfig {
            history_limit: 3,
            max_tokens: 256,
            ..Default::default()
        };
        let builder = PromptBuilder::new(&config);
        let mut session = ConversationSession::new(SessionId::default_session());
        session.append_message(Role::User, "u1");
        session.append_message(Role::Assistant, "a1");
        session.append_message(Role::User, "u2");
        session.append_message(Role::Assistant, "a2");
        session.append_message(Role::User, "u3");

        let request = builder.build(&session, today());
        let texts: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["u2", "a2", "u3"]);
        assert_eq!(request.max_tokens, 256);

        let config = AssistantConfig {
            history_limit: 2,
            ..Default::default()
        };
        let request = PromptBuilder::new(&config).build(&session, today());
        let texts: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["u3"]);
    }
}
