//! Content lifecycle event adapter.
//!
//! # Responsibility
//! - Keep additional information in step with content versions: copy it
//!   forward to new drafts and copies, drop it with deleted versions, and
//!   purge it when content is destroyed.
//!
//! # Invariants
//! - The adapter only calls the service; it has no storage or cache access.
//! - Trash purges are sent in batches of at most `PURGE_BATCH_SIZE` ids.

use crate::model::info::{ContentId, VersionNo};
use crate::repo::info_repo::{AdditionalInfoRepository, RepoResult};
use crate::repo::record_store::PURGE_BATCH_SIZE;
use crate::service::info_service::AdditionalInfoService;
use log::info;

/// Content repository events that affect additional information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    /// A draft was created from the content's current version.
    DraftCreated {
        content_id: ContentId,
        current_version_no: VersionNo,
        draft_version_no: VersionNo,
    },
    /// One version was deleted.
    VersionDeleted {
        content_id: ContentId,
        version_no: VersionNo,
    },
    /// A content item was copied into a new content item.
    ContentCopied {
        source_content_id: ContentId,
        source_version_no: VersionNo,
        target_content_id: ContentId,
        target_version_no: VersionNo,
    },
    /// One trashed item was permanently deleted.
    TrashItemDeleted { content_id: ContentId },
    /// The trash was emptied.
    TrashEmptied { content_ids: Vec<ContentId> },
}

impl ContentEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::DraftCreated { .. } => "draft_created",
            Self::VersionDeleted { .. } => "version_deleted",
            Self::ContentCopied { .. } => "content_copied",
            Self::TrashItemDeleted { .. } => "trash_item_deleted",
            Self::TrashEmptied { .. } => "trash_emptied",
        }
    }
}

/// Applies content events to an additional information service.
pub struct ContentEventSubscriber<'s, R: AdditionalInfoRepository> {
    service: &'s AdditionalInfoService<R>,
}

impl<'s, R: AdditionalInfoRepository> ContentEventSubscriber<'s, R> {
    pub fn new(service: &'s AdditionalInfoService<R>) -> Self {
        Self { service }
    }

    /// Handles one event, returning the first service error encountered.
    pub fn handle(&self, event: &ContentEvent) -> RepoResult<()> {
        match event {
            ContentEvent::DraftCreated {
                content_id,
                current_version_no,
                draft_version_no,
            } => {
                self.service.copy_version(
                    *content_id,
                    *current_version_no,
                    *content_id,
                    *draft_version_no,
                )?;
            }
            ContentEvent::VersionDeleted {
                content_id,
                version_no,
            } => self.service.delete(*content_id, *version_no, None)?,
            ContentEvent::ContentCopied {
                source_content_id,
                source_version_no,
                target_content_id,
                target_version_no,
            } => {
                self.service.copy_version(
                    *source_content_id,
                    *source_version_no,
                    *target_content_id,
                    *target_version_no,
                )?;
            }
            ContentEvent::TrashItemDeleted { content_id } => {
                self.service.purge(&[*content_id])?
            }
            ContentEvent::TrashEmptied { content_ids } => {
                for batch in content_ids.chunks(PURGE_BATCH_SIZE) {
                    self.service.purge(batch)?;
                }
            }
        }

        info!("event=content_event module=lifecycle status=ok kind={}", event.name());
        Ok(())
    }
}
