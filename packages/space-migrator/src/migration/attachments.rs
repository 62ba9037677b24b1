//! Attachment transfer: download from the source, upload to the copy.
//!
//! Each attachment is handled on its own. A failed download or upload is
//! recorded and the next attachment is tried. When a dump directory is set,
//! downloaded bytes are also written to `<dir>/<attachment id>-<filename>`;
//! a failed local write is only logged.

use anyhow::Result;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::id_map::MappedPage;
use super::report::SatelliteSummary;
use crate::common::{collect_all, AttachmentRef};
use crate::kernel::{BaseDestinationPlatform, BaseSourcePlatform};

pub struct AttachmentReplicator<'a> {
    source: &'a dyn BaseSourcePlatform,
    destination: &'a dyn BaseDestinationPlatform,
    dump_dir: Option<PathBuf>,
}

impl<'a> AttachmentReplicator<'a> {
    pub fn new(
        source: &'a dyn BaseSourcePlatform,
        destination: &'a dyn BaseDestinationPlatform,
    ) -> Self {
        Self {
            source,
            destination,
            dump_dir: None,
        }
    }

    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    pub async fn replicate(&self, page: &MappedPage) -> SatelliteSummary {
        let collected = collect_all("attachments", |cursor| async move {
            self.source
                .list_attachments(&page.source, cursor.as_deref())
                .await
        })
        .await;

        let mut summary = SatelliteSummary {
            listed: collected.items.len(),
            step_error: collected.error_message(),
            ..Default::default()
        };

        for attachment in &collected.items {
            match self.transfer(page, attachment).await {
                Ok(size) => {
                    debug!(
                        destination_id = %page.destination,
                        attachment = %attachment.title,
                        bytes = size,
                        "Attachment copied"
                    );
                    summary.migrated += 1;
                }
                Err(e) => {
                    warn!(
                        destination_id = %page.destination,
                        attachment = %attachment.title,
                        error = %format!("{:#}", e),
                        "Failed to copy attachment"
                    );
                    summary.failures.push(format!("{}: {:#}", attachment.title, e));
                }
            }
        }
        summary
    }

    async fn transfer(&self, page: &MappedPage, attachment: &AttachmentRef) -> Result<usize> {
        let bytes = self.source.download_attachment(attachment).await?;
        let size = bytes.len();

        if let Some(dir) = &self.dump_dir {
            dump(dir, attachment, &bytes).await;
        }

        self.destination
            .upload_attachment(&page.destination, attachment, bytes)
            .await?;
        Ok(size)
    }
}

fn dump_file_name(attachment: &AttachmentRef) -> String {
    let safe = |s: &str| {
        s.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                c => c,
            })
            .collect::<String>()
    };
    format!("{}-{}", safe(&attachment.id), safe(&attachment.title))
}

async fn dump(dir: &Path, attachment: &AttachmentRef, bytes: &Bytes) {
    let path = dir.join(dump_file_name(attachment));
    let written = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, bytes).await
    }
    .await;

    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "Could not save attachment copy");
    }
}
