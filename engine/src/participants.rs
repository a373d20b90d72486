//! Participant Set
//!
//! The fixed, ordered roster of roles taking part in a collaboration. Order is
//! stage order: the first participant answers the user, each participant hands
//! off to the next, and the last participant is the approver, who either signs
//! off or sends the work back to the stage before it.
//!
//! The roster is validated once at construction and never changes during a run.

use sdk::errors::EngineError;
use sdk::types::{ParticipantId, Speaker, SYSTEM_LABEL, USER_LABEL};
use std::collections::HashSet;

/// Placeholder replaced with the configured approval token in instructions
pub const APPROVAL_TOKEN_PLACEHOLDER: &str = "{approval_token}";

/// Default first-stage participant
pub const BUSINESS_ANALYST: &str = "BusinessAnalyst";

/// Default second-stage participant
pub const SOFTWARE_ENGINEER: &str = "SoftwareEngineer";

/// Default approver
pub const PRODUCT_OWNER: &str = "ProductOwner";

const BUSINESS_ANALYST_INSTRUCTIONS: &str = "You are a Business Analyst who takes the \
requirements from the user (also known as a 'customer') and creates a project plan for \
creating the requested app. The Business Analyst understands the user requirements and \
creates detailed documents with requirements and costing. The documents should be usable \
by the SoftwareEngineer as a reference for implementing the required features, and by the \
ProductOwner for reference to determine if the application delivered by the \
SoftwareEngineer meets all of the user's requirements.";

const SOFTWARE_ENGINEER_INSTRUCTIONS: &str = "You are a Software Engineer, and your goal is \
to create a web app using HTML and JavaScript by taking into consideration all the \
requirements given by the Business Analyst. The application should implement all the \
requested features. Deliver the code to the Product Owner for review when completed. You \
can also ask questions of the BusinessAnalyst to clarify any requirements that are unclear.";

const PRODUCT_OWNER_INSTRUCTIONS: &str = "You are the Product Owner which will review the \
software engineer's code to ensure all user requirements are completed. You are the guardian \
of quality, ensuring the final product meets all specifications. IMPORTANT: Verify that the \
Software Engineer has shared the HTML code. Look at everything the engineer delivered and \
provide specific, actionable feedback on anything that is missing or needs more detail. Once \
all client requirements are completed and you have no further feedback, reply with \
{approval_token} and nothing else.";

/// A named role in the collaboration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Unique identity (the configured name)
    pub id: ParticipantId,

    /// Name shown in rendered transcripts
    pub display_name: String,

    /// Persona prompt handed to the agent backend
    pub instructions: String,
}

impl Participant {
    /// Create a participant whose display name is its id
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            id: ParticipantId::new(name),
            instructions: instructions.into(),
        }
    }

    /// Override the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// The three-role team: analyst, engineer, and product owner as approver.
///
/// Instructions still contain [`APPROVAL_TOKEN_PLACEHOLDER`].
pub fn default_participants() -> Vec<Participant> {
    vec![
        Participant::new(BUSINESS_ANALYST, BUSINESS_ANALYST_INSTRUCTIONS)
            .with_display_name("Business Analyst"),
        Participant::new(SOFTWARE_ENGINEER, SOFTWARE_ENGINEER_INSTRUCTIONS)
            .with_display_name("Engineer"),
        Participant::new(PRODUCT_OWNER, PRODUCT_OWNER_INSTRUCTIONS)
            .with_display_name("Product Owner"),
    ]
}

/// Ordered, validated set of participants
#[derive(Debug, Clone)]
pub struct ParticipantSet {
    participants: Vec<Participant>,
}

impl ParticipantSet {
    /// Build a participant set
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two participants are given
    /// - A name is empty, reserved (`user`, `System`), or duplicated
    pub fn new(participants: Vec<Participant>) -> Result<Self, EngineError> {
        if participants.len() < 2 {
            return Err(EngineError::Config(format!(
                "At least two participants are required, got {}",
                participants.len()
            )));
        }

        let mut seen = HashSet::new();
        for participant in &participants {
            let name = participant.id.as_str();
            if name.trim().is_empty() {
                return Err(EngineError::Config(
                    "Participant names must not be empty".to_string(),
                ));
            }
            if name.eq_ignore_ascii_case(USER_LABEL) || name.eq_ignore_ascii_case(SYSTEM_LABEL) {
                return Err(EngineError::Config(format!(
                    "Participant name '{}' is reserved",
                    name
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(EngineError::Config(format!(
                    "Duplicate participant name '{}'",
                    name
                )));
            }
        }

        Ok(Self { participants })
    }

    /// The default team with the approval token substituted into instructions
    pub fn default_team(approval_token: &str) -> Result<Self, EngineError> {
        let participants = default_participants()
            .into_iter()
            .map(|mut p| {
                p.instructions = p
                    .instructions
                    .replace(APPROVAL_TOKEN_PLACEHOLDER, approval_token);
                p
            })
            .collect();
        Self::new(participants)
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns true if the set has no participants
    ///
    /// Construction rejects sets with fewer than two members, so this is
    /// false for every `ParticipantSet` that exists.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants in stage order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Look up a participant by identity
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Returns true if `id` is a member of the set
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Stage index of a participant
    pub fn position(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == id)
    }

    /// First-stage participant (answers the user)
    pub fn first(&self) -> &Participant {
        &self.participants[0]
    }

    /// The approver (last stage)
    pub fn approver(&self) -> &Participant {
        &self.participants[self.participants.len() - 1]
    }

    /// Returns true if `id` is the approver
    pub fn is_approver(&self, id: &ParticipantId) -> bool {
        &self.approver().id == id
    }

    /// The stage that follows `speaker`
    ///
    /// - user → first participant
    /// - participant *i* → participant *i + 1*
    /// - approver → the stage before it (feedback loop)
    ///
    /// Returns `None` for the system speaker or a speaker outside the set.
    pub fn stage_after(&self, speaker: &Speaker) -> Option<&Participant> {
        match speaker {
            Speaker::User => Some(self.first()),
            Speaker::Participant(id) => {
                let index = self.position(id)?;
                if index + 1 < self.participants.len() {
                    self.participants.get(index + 1)
                } else {
                    self.participants.get(self.participants.len() - 2)
                }
            }
            Speaker::System => None,
        }
    }

    /// Map raw classifier text to a participant
    ///
    /// Surrounding whitespace, quotes, backticks, emphasis markers and
    /// trailing punctuation are ignored; names match case-insensitively.
    pub fn resolve(&self, raw: &str) -> Option<&Participant> {
        let cleaned = raw.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*' | '.' | '!' | ':' | ',')
        });
        if cleaned.is_empty() {
            return None;
        }
        self.participants
            .iter()
            .find(|p| p.id.as_str().eq_ignore_ascii_case(cleaned))
    }
}
