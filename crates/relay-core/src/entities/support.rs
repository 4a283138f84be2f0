//! Support tickets - lifecycle, transition table, and audit log

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::room::Room;
use crate::error::DomainError;

/// Longest accepted review text
pub const MAX_REVIEW_LENGTH: usize = 2000;

/// Ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    ClosedByCustomer,
}

impl SupportStatus {
    pub const ALL: [Self; 4] = [
        Self::Open,
        Self::InProgress,
        Self::Resolved,
        Self::ClosedByCustomer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::ClosedByCustomer => "closed_by_customer",
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ClosedByCustomer)
    }

    /// Ratings are accepted once the agent side has resolved the ticket
    #[inline]
    pub fn accepts_rating(self) -> bool {
        matches!(self, Self::Resolved | Self::ClosedByCustomer)
    }
}

impl fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

/// Who is acting on a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The ticket's `user_id`
    Customer,
    /// Any other participant of the bound room
    Agent,
}

/// Allowed next states keyed by (current state, actor role)
pub const TRANSITIONS: &[(SupportStatus, ActorRole, &[SupportStatus])] = &[
    (
        SupportStatus::Open,
        ActorRole::Agent,
        &[SupportStatus::InProgress, SupportStatus::Resolved],
    ),
    (
        SupportStatus::InProgress,
        ActorRole::Agent,
        &[SupportStatus::Open, SupportStatus::Resolved],
    ),
    (
        SupportStatus::Resolved,
        ActorRole::Agent,
        &[SupportStatus::Open, SupportStatus::InProgress],
    ),
    (
        SupportStatus::Resolved,
        ActorRole::Customer,
        &[SupportStatus::ClosedByCustomer],
    ),
];

/// Next states `role` may move a ticket to from `from`
pub fn allowed_transitions(from: SupportStatus, role: ActorRole) -> &'static [SupportStatus] {
    for (state, r, next) in TRANSITIONS {
        if *state == from && *r == role {
            return next;
        }
    }
    &[]
}

/// Check one transition against the table.
///
/// A target the role can never reach is an authorization failure; a target
/// the role could reach from some other state is a lifecycle conflict.
pub fn check_transition(
    from: SupportStatus,
    to: SupportStatus,
    role: ActorRole,
) -> Result<(), DomainError> {
    if allowed_transitions(from, role).contains(&to) {
        return Ok(());
    }
    let reachable_by_role = TRANSITIONS
        .iter()
        .any(|(_, r, next)| *r == role && next.contains(&to));
    if reachable_by_role {
        Err(DomainError::InvalidTransition { from, to })
    } else {
        Err(DomainError::TransitionForbidden { to })
    }
}

/// Validate a rating value
pub fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(DomainError::InvalidRating(rating))
    }
}

fn validate_review(review: Option<&str>) -> Result<(), DomainError> {
    match review {
        Some(text) if text.chars().count() > MAX_REVIEW_LENGTH => {
            Err(DomainError::ContentTooLong {
                max: MAX_REVIEW_LENGTH,
            })
        }
        _ => Ok(()),
    }
}

/// Support ticket bound to a chat room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportEvent {
    pub id: i64,
    pub chat_room_id: i64,
    /// The customer
    pub user_id: i64,
    pub admin_id: Option<i64>,
    pub status: SupportStatus,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the ticket's audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportEventLog {
    pub id: i64,
    pub event_id: i64,
    pub admin_id: Option<i64>,
    pub old_status: Option<SupportStatus>,
    pub new_status: SupportStatus,
    pub created_at: DateTime<Utc>,
}

impl SupportEventLog {
    /// Log row to append (id is assigned by the store)
    pub fn entry(
        event_id: i64,
        admin_id: Option<i64>,
        old_status: Option<SupportStatus>,
        new_status: SupportStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            event_id,
            admin_id,
            old_status,
            new_status,
            created_at: at,
        }
    }
}

/// Ticket together with its full log, as broadcast and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportEventDetail {
    #[serde(flatten)]
    pub event: SupportEvent,
    pub logs: Vec<SupportEventLog>,
}

/// Optional rating that can accompany a customer close
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosingFeedback {
    pub rating: Option<i32>,
    pub review: Option<String>,
}

impl SupportEvent {
    /// Open a ticket in `room`; the room creator is the customer
    pub fn open(room: &Room, at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            chat_room_id: room.id,
            user_id: room.creator_id,
            admin_id: None,
            status: SupportStatus::Open,
            rating: None,
            review: None,
            closed_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Resolve the acting role; only room participants may act
    pub fn role_of(&self, room: &Room, actor_id: i64) -> Result<ActorRole, DomainError> {
        if !room.is_member(actor_id) {
            return Err(DomainError::NotRoomParticipant);
        }
        Ok(if actor_id == self.user_id {
            ActorRole::Customer
        } else {
            ActorRole::Agent
        })
    }

    /// Apply a status change and return the log row to persist with it.
    ///
    /// Nothing is modified when the change is rejected.
    pub fn transition(
        &mut self,
        room: &Room,
        actor_id: i64,
        to: SupportStatus,
        feedback: ClosingFeedback,
        at: DateTime<Utc>,
    ) -> Result<SupportEventLog, DomainError> {
        let role = self.role_of(room, actor_id)?;
        let from = self.status;
        check_transition(from, to, role)?;

        if role == ActorRole::Customer {
            if let Some(rating) = feedback.rating {
                validate_rating(rating)?;
                if self.rating.is_some() {
                    return Err(DomainError::AlreadyRated);
                }
            }
            validate_review(feedback.review.as_deref())?;
        }

        let admin_id = match role {
            ActorRole::Agent => Some(actor_id),
            ActorRole::Customer => None,
        };

        self.status = to;
        self.updated_at = at;
        match role {
            ActorRole::Agent => self.admin_id = admin_id,
            ActorRole::Customer => {
                self.closed_at = Some(at);
                if let Some(rating) = feedback.rating {
                    self.rating = Some(rating);
                }
                if feedback.review.is_some() {
                    self.review = feedback.review;
                }
            }
        }

        Ok(SupportEventLog::entry(self.id, admin_id, Some(from), to, at))
    }

    /// Record the customer's one-time rating
    pub fn rate(
        &mut self,
        actor_id: i64,
        rating: i32,
        review: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if actor_id != self.user_id {
            return Err(DomainError::NotTicketCustomer);
        }
        validate_rating(rating)?;
        validate_review(review.as_deref())?;
        if !self.status.accepts_rating() {
            return Err(DomainError::RatingNotAllowed(self.status));
        }
        if self.rating.is_some() {
            return Err(DomainError::AlreadyRated);
        }
        self.rating = Some(rating);
        if review.is_some() {
            self.review = review;
        }
        self.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RoomKind;

    const CUSTOMER: i64 = 1;
    const ADMIN: i64 = 9;

    fn room() -> Room {
        let mut room = Room::new(RoomKind::Support, CUSTOMER, ADMIN);
        room.id = 7;
        room
    }

    fn ticket(status: SupportStatus) -> SupportEvent {
        let mut t = SupportEvent::open(&room(), Utc::now());
        t.id = 100;
        t.status = status;
        t
    }

    #[test]
    fn test_open_ticket() {
        let t = SupportEvent::open(&room(), Utc::now());
        assert_eq!(t.status, SupportStatus::Open);
        assert_eq!(t.user_id, CUSTOMER);
        assert_eq!(t.chat_room_id, 7);
    }

    #[test]
    fn test_transition_matrix() {
        use SupportStatus::{ClosedByCustomer, InProgress, Open, Resolved};

        for from in SupportStatus::ALL {
            for to in SupportStatus::ALL {
                let agent_ok = check_transition(from, to, ActorRole::Agent).is_ok();
                let customer_ok = check_transition(from, to, ActorRole::Customer).is_ok();

                let expect_agent = matches!(
                    (from, to),
                    (Open, InProgress | Resolved)
                        | (InProgress, Open | Resolved)
                        | (Resolved, Open | InProgress)
                );
                let expect_customer = from == Resolved && to == ClosedByCustomer;

                assert_eq!(agent_ok, expect_agent, "agent {from} -> {to}");
                assert_eq!(customer_ok, expect_customer, "customer {from} -> {to}");
            }
        }
    }

    #[test]
    fn test_rejection_kinds() {
        let err = check_transition(SupportStatus::Open, SupportStatus::InProgress, ActorRole::Customer)
            .unwrap_err();
        assert!(err.is_authorization());

        let err =
            check_transition(SupportStatus::Open, SupportStatus::ClosedByCustomer, ActorRole::Customer)
                .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let err = check_transition(
            SupportStatus::Resolved,
            SupportStatus::ClosedByCustomer,
            ActorRole::Agent,
        )
        .unwrap_err();
        assert!(err.is_authorization());
    }

    #[test]
    fn test_non_participant_rejected() {
        let mut t = ticket(SupportStatus::Open);
        let before = t.clone();
        let err = t
            .transition(&room(), 55, SupportStatus::InProgress, ClosingFeedback::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotRoomParticipant));
        assert_eq!(t, before);
    }

    #[test]
    fn test_agent_transition_records_admin() {
        let mut t = ticket(SupportStatus::Open);
        let log = t
            .transition(&room(), ADMIN, SupportStatus::InProgress, ClosingFeedback::default(), Utc::now())
            .unwrap();
        assert_eq!(t.status, SupportStatus::InProgress);
        assert_eq!(t.admin_id, Some(ADMIN));
        assert_eq!(log.admin_id, Some(ADMIN));
        assert_eq!(log.old_status, Some(SupportStatus::Open));
        assert_eq!(log.new_status, SupportStatus::InProgress);
    }

    #[test]
    fn test_customer_close_with_rating() {
        let mut t = ticket(SupportStatus::Resolved);
        let feedback = ClosingFeedback {
            rating: Some(5),
            review: Some("quick and helpful".into()),
        };
        let log = t
            .transition(&room(), CUSTOMER, SupportStatus::ClosedByCustomer, feedback, Utc::now())
            .unwrap();
        assert_eq!(log.admin_id, None);
        assert_eq!(t.rating, Some(5));
        assert!(t.closed_at.is_some());

        let err = t.rate(CUSTOMER, 4, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyRated));
    }

    #[test]
    fn test_customer_close_rejects_bad_rating() {
        let mut t = ticket(SupportStatus::Resolved);
        let feedback = ClosingFeedback {
            rating: Some(6),
            review: None,
        };
        let err = t
            .transition(&room(), CUSTOMER, SupportStatus::ClosedByCustomer, feedback, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRating(6)));
        assert_eq!(t.status, SupportStatus::Resolved);
    }

    #[test]
    fn test_rating_rules() {
        let mut t = ticket(SupportStatus::InProgress);
        assert!(matches!(
            t.rate(CUSTOMER, 5, None, Utc::now()).unwrap_err(),
            DomainError::RatingNotAllowed(SupportStatus::InProgress)
        ));

        t.status = SupportStatus::Resolved;
        assert!(matches!(
            t.rate(ADMIN, 5, None, Utc::now()).unwrap_err(),
            DomainError::NotTicketCustomer
        ));
        assert!(matches!(
            t.rate(CUSTOMER, 0, None, Utc::now()).unwrap_err(),
            DomainError::InvalidRating(0)
        ));

        t.rate(CUSTOMER, 3, Some("ok".into()), Utc::now()).unwrap();
        assert_eq!(t.rating, Some(3));
        assert!(matches!(
            t.rate(CUSTOMER, 5, None, Utc::now()).unwrap_err(),
            DomainError::AlreadyRated
        ));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "closed_by_customer".parse::<SupportStatus>().unwrap(),
            SupportStatus::ClosedByCustomer
        );
        assert!(matches!(
            "archived".parse::<SupportStatus>().unwrap_err(),
            DomainError::InvalidStatus(_)
        ));
    }
}
