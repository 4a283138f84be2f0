//! Support service
//!
//! Ticket creation, status transitions, and ratings. Every accepted change is
//! persisted together with its log row and then broadcast to the ticket's room.

use chrono::Utc;
use relay_core::entities::{
    ClosingFeedback, Room, SupportEvent, SupportEventDetail, SupportStatus,
};
use relay_core::events::{TicketEvent, TicketEventKind};
use relay_core::DomainError;
use tracing::{debug, info, instrument};

use crate::dto::{CreateSupportEventRequest, RateSupportEventRequest, UpdateSupportStatusRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Support service
pub struct SupportService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SupportService<'a> {
    /// Create a new SupportService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a ticket in a room the actor belongs to
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        actor_id: i64,
        request: CreateSupportEventRequest,
    ) -> ServiceResult<SupportEventDetail> {
        let room = self.load_room(request.chat_room_id).await?;
        if !room.is_member(actor_id) {
            return Err(DomainError::NotRoomParticipant.into());
        }

        let ticket = self
            .ctx
            .support_event_repo()
            .create(&SupportEvent::open(&room, Utc::now()))
            .await?;

        info!(
            event_id = ticket.id,
            room_id = room.id,
            customer_id = ticket.user_id,
            "Support event opened"
        );

        let detail = self.detail(ticket).await?;
        self.broadcast(TicketEventKind::New, &detail);
        Ok(detail)
    }

    /// Ticket with its log; room participants only
    #[instrument(skip(self))]
    pub async fn get(&self, actor_id: i64, event_id: i64) -> ServiceResult<SupportEventDetail> {
        let ticket = self.load_ticket(event_id).await?;
        let room = self.load_room(ticket.chat_room_id).await?;
        ticket.role_of(&room, actor_id)?;
        self.detail(ticket).await
    }

    /// Move a ticket to a new status
    #[instrument(skip(self, request), fields(to = %request.status))]
    pub async fn transition(
        &self,
        actor_id: i64,
        event_id: i64,
        request: UpdateSupportStatusRequest,
    ) -> ServiceResult<SupportEventDetail> {
        let to: SupportStatus = request.status.parse()?;

        let mut ticket = self.load_ticket(event_id).await?;
        let room = self.load_room(ticket.chat_room_id).await?;

        let from = ticket.status;
        let feedback = ClosingFeedback {
            rating: request.rating,
            review: request.review,
        };
        let log = ticket.transition(&room, actor_id, to, feedback, Utc::now())?;

        self.ctx
            .support_event_repo()
            .apply_transition(&ticket, from, &log)
            .await?;

        info!(event_id, actor_id, %from, %to, "Support event transitioned");

        let detail = self.detail(ticket).await?;
        self.broadcast(TicketEventKind::for_status(to), &detail);
        Ok(detail)
    }

    /// Record the customer's one-time rating
    #[instrument(skip(self, request))]
    pub async fn rate(
        &self,
        actor_id: i64,
        event_id: i64,
        request: RateSupportEventRequest,
    ) -> ServiceResult<SupportEventDetail> {
        let mut ticket = self.load_ticket(event_id).await?;
        let room = self.load_room(ticket.chat_room_id).await?;
        ticket.role_of(&room, actor_id)?;

        ticket.rate(actor_id, request.rating, request.review, Utc::now())?;
        self.ctx.support_event_repo().record_rating(&ticket).await?;

        info!(event_id, rating = request.rating, "Support event rated");

        let detail = self.detail(ticket).await?;
        self.broadcast(TicketEventKind::Rated, &detail);
        Ok(detail)
    }

    // === Helpers ===

    async fn load_ticket(&self, event_id: i64) -> ServiceResult<SupportEvent> {
        Ok(self
            .ctx
            .support_event_repo()
            .find_by_id(event_id)
            .await?
            .ok_or(DomainError::SupportEventNotFound(event_id))?)
    }

    async fn load_room(&self, room_id: i64) -> ServiceResult<Room> {
        Ok(self
            .ctx
            .room_repo()
            .find_by_id(room_id)
            .await?
            .ok_or(DomainError::RoomNotFound(room_id))?)
    }

    async fn detail(&self, event: SupportEvent) -> ServiceResult<SupportEventDetail> {
        let logs = self.ctx.support_event_repo().find_logs(event.id).await?;
        Ok(SupportEventDetail { event, logs })
    }

    fn broadcast(&self, kind: TicketEventKind, detail: &SupportEventDetail) {
        let event = TicketEvent::new(kind, detail.clone());
        let delivered = self.ctx.broadcaster().broadcast_ticket(&event);
        debug!(
            event = kind.name(),
            room_id = event.chat_room_id,
            delivered,
            "Ticket event broadcast"
        );
    }
}
