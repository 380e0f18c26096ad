use std::path::Path;

use tracing::info;
use wirelens_contracts::{ContextId, RelayError, Verdict};

use crate::codec::encode_subject_image;
use crate::decision::parse_verdict;
use crate::gallery::GalleryCache;
use crate::gateway::{CompletionOptions, InferenceGateway};
use crate::prompt::build_inspection_request;
use crate::staging::StagedSubject;

/// One full inspection: resolve the gallery, stage and encode the
/// subject, run the reasoning call, parse the verdict. The staged
/// file's RAII guard removes it on every exit path, including errors
/// and task cancellation. Inference failures surface as errors; a
/// malformed-but-received reply becomes an indeterminate verdict.
pub async fn run_inspection(
    cache: &GalleryCache,
    gateway: &dyn InferenceGateway,
    options: &CompletionOptions,
    staging_dir: &Path,
    context: ContextId,
    bearer: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<Verdict, RelayError> {
    let gallery = cache.get_or_fetch(context, bearer).await?;

    let staged = StagedSubject::stage(staging_dir, file_name, bytes).await?;
    let subject = encode_subject_image(staged.path())?;
    let request = build_inspection_request(&subject, &gallery);
    let raw = gateway.complete(&request.messages, options).await?;
    let verdict = parse_verdict(&raw);
    info!(
        context,
        judgment = verdict.judgment.as_str(),
        "inspection complete"
    );
    drop(staged);
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value;
    use wirelens_contracts::{Judgment, RoomRefs};

    use crate::gallery::RoomDirectory;

    use super::*;

    struct StubDirectory {
        refs: RoomRefs,
    }

    #[async_trait]
    impl RoomDirectory for StubDirectory {
        async fn fetch_room(
            &self,
            _context: ContextId,
            _bearer: &str,
        ) -> Result<RoomRefs, RelayError> {
            Ok(self.refs.clone())
        }
    }

    struct ScriptedGateway {
        reply: Result<String, RelayError>,
        calls: AtomicU64,
        expected_messages: usize,
    }

    #[async_trait]
    impl InferenceGateway for ScriptedGateway {
        async fn complete(
            &self,
            messages: &[Value],
            options: &CompletionOptions,
        ) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            assert_eq!(messages.len(), self.expected_messages);
            assert_eq!(options.temperature, 0.0);
            self.reply.clone()
        }
    }

    fn seeded_uploads(normal: &[&str], abnormal: &[&str]) -> (tempfile::TempDir, RoomRefs) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut refs = RoomRefs::default();
        for name in normal {
            std::fs::write(dir.path().join(name), name.as_bytes()).expect("write");
            refs.normal_images.push(format!("/uploads/{name}"));
        }
        for name in abnormal {
            std::fs::write(dir.path().join(name), name.as_bytes()).expect("write");
            refs.abnormal_images.push(format!("/uploads/{name}"));
        }
        (dir, refs)
    }

    fn staged_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn abnormal_reply_yields_abnormal_verdict_and_clean_staging() -> anyhow::Result<()> {
        let (uploads, refs) = seeded_uploads(&["n1.jpg"], &["a1.jpg", "a2.jpg"]);
        let cache = GalleryCache::new(Arc::new(StubDirectory { refs }), uploads.path());
        let gateway = ScriptedGateway {
            reply: Ok(r#"{"판단":"비정상","이유":"빨간선 누락"}"#.to_string()),
            calls: AtomicU64::new(0),
            // rubric + normal + two abnormal + subject
            expected_messages: 5,
        };
        let staging = tempfile::tempdir()?;
        let options = CompletionOptions::deterministic("gpt-4o", 200);

        let verdict = run_inspection(
            &cache,
            &gateway,
            &options,
            staging.path(),
            11,
            "token",
            "shot.jpg",
            b"subject bytes",
        )
        .await
        .expect("inspection");

        assert_eq!(verdict.judgment, Judgment::Abnormal);
        assert_eq!(verdict.reason, "빨간선 누락");
        assert_eq!(gateway.calls.load(Ordering::Relaxed), 1);
        assert_eq!(staged_entries(staging.path()), 0);
        Ok(())
    }

    #[tokio::test]
    async fn inference_failure_surfaces_and_still_cleans_staging() -> anyhow::Result<()> {
        let (uploads, refs) = seeded_uploads(&["n1.jpg"], &["a1.jpg"]);
        let cache = GalleryCache::new(Arc::new(StubDirectory { refs }), uploads.path());
        let gateway = ScriptedGateway {
            reply: Err(RelayError::inference("429 rate limited")),
            calls: AtomicU64::new(0),
            expected_messages: 4,
        };
        let staging = tempfile::tempdir()?;
        let options = CompletionOptions::deterministic("gpt-4o", 200);

        let err = run_inspection(
            &cache,
            &gateway,
            &options,
            staging.path(),
            11,
            "token",
            "shot.jpg",
            b"subject bytes",
        )
        .await
        .err()
        .expect("must fail");

        assert!(matches!(err, RelayError::InferenceService(_)));
        assert_eq!(staged_entries(staging.path()), 0);
        Ok(())
    }

    #[tokio::test]
    async fn garbled_reply_becomes_indeterminate_not_error() -> anyhow::Result<()> {
        let (uploads, refs) = seeded_uploads(&["n1.jpg"], &["a1.jpg"]);
        let cache = GalleryCache::new(Arc::new(StubDirectory { refs }), uploads.path());
        let gateway = ScriptedGateway {
            reply: Ok("The wiring looks mostly fine to me.".to_string()),
            calls: AtomicU64::new(0),
            expected_messages: 4,
        };
        let staging = tempfile::tempdir()?;
        let options = CompletionOptions::deterministic("gpt-4o", 200);

        let verdict = run_inspection(
            &cache,
            &gateway,
            &options,
            staging.path(),
            11,
            "token",
            "shot.jpg",
            b"subject bytes",
        )
        .await
        .expect("verdict, not error");

        assert_eq!(verdict.judgment, Judgment::Indeterminate);
        assert_eq!(verdict.reason, "The wiring looks mostly fine to me.");
        assert_eq!(staged_entries(staging.path()), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_gallery_fails_before_staging() -> anyhow::Result<()> {
        let uploads = tempfile::tempdir()?;
        let cache = GalleryCache::new(
            Arc::new(StubDirectory {
                refs: RoomRefs::default(),
            }),
            uploads.path(),
        );
        let gateway = ScriptedGateway {
            reply: Ok(String::new()),
            calls: AtomicU64::new(0),
            expected_messages: 0,
        };
        let staging = tempfile::tempdir()?;
        let options = CompletionOptions::deterministic("gpt-4o", 200);

        let err = run_inspection(
            &cache,
            &gateway,
            &options,
            staging.path(),
            11,
            "token",
            "shot.jpg",
            b"subject bytes",
        )
        .await
        .err()
        .expect("must fail");

        assert!(matches!(err, RelayError::BadRequest(_)));
        assert_eq!(gateway.calls.load(Ordering::Relaxed), 0);
        assert_eq!(staged_entries(staging.path()), 0);
        Ok(())
    }
}
