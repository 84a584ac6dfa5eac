//! Lead lifecycle state machine.
//!
//! Status moves forward along `new -> investigating -> ready -> contacted`.
//! The only backward edge is a failed investigation, which returns the lead
//! to `new`. Archiving is a flag overlay and never touches `status`.

use chrono::{DateTime, Utc};

use crate::lead::{ContactInfo, Lead, LeadStatus};
use crate::CoreError;

/// An event that drives a lead through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadEvent {
    InvestigateRequested,
    InvestigationSucceeded(ContactInfo),
    InvestigationFailed,
    InitialEmailSent { at: DateTime<Utc> },
    Archive,
    Unarchive,
}

impl LeadEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LeadEvent::InvestigateRequested => "investigate-requested",
            LeadEvent::InvestigationSucceeded(_) => "investigation-succeeded",
            LeadEvent::InvestigationFailed => "investigation-failed",
            LeadEvent::InitialEmailSent { .. } => "initial-email-sent",
            LeadEvent::Archive => "archive",
            LeadEvent::Unarchive => "unarchive",
        }
    }
}

/// Apply `event` to `lead`, returning the updated record.
///
/// The input is never modified; on an invalid edge the caller keeps the
/// original lead untouched.
///
/// # Errors
///
/// Returns [`CoreError::Transition`] when `event` is not valid from the
/// lead's current status.
pub fn transition(lead: &Lead, event: LeadEvent) -> Result<Lead, CoreError> {
    let mut next = lead.clone();
    match (lead.status, event) {
        (LeadStatus::New, LeadEvent::InvestigateRequested) => {
            next.status = LeadStatus::Investigating;
        }
        (LeadStatus::Investigating, LeadEvent::InvestigationSucceeded(contact)) => {
            next.status = LeadStatus::Ready;
            next.contact_name = Some(contact.name);
            next.contact_email = Some(contact.email);
            next.contact_name_source = Some(contact.source);
        }
        (LeadStatus::Investigating, LeadEvent::InvestigationFailed) => {
            next.status = LeadStatus::New;
        }
        (LeadStatus::Ready, LeadEvent::InitialEmailSent { at }) => {
            next.status = LeadStatus::Contacted;
            // Set once; a contacted lead never re-enters this arm.
            next.contacted_at.get_or_insert(at);
        }
        (_, LeadEvent::Archive) => next.is_archived = true,
        (_, LeadEvent::Unarchive) => next.is_archived = false,
        (from, event) => {
            return Err(CoreError::Transition {
                id: lead.id.clone(),
                from,
                event: event.name(),
            });
        }
    }
    Ok(next)
}
