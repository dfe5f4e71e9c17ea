//! Per-item layout
//!
//! Everything for one record lives below `<output>/<ID>/.<from>/`:
//!
//! ```text
//! ABC-123/.javbus/poster
//! ABC-123/.javbus/thumb
//! ABC-123/.javbus/.actor/<name>
//! ABC-123/.javbus/.sample/sample@<index>
//! ABC-123/.javbus/.thumb/thumb@<index>
//! ```
//!
//! No extensions are appended in this layout.

use super::{Collector, Field, MaterializeError, Materialized, copy_one};
use crate::cache::Cache;
use crate::content::Content;
use crate::file_operations::sanitize_filename;
use crate::options::OutputOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root directory of a record in the per-item layout
pub fn item_root(output: &Path, record: &Content) -> PathBuf {
    output
        .join(sanitize_filename(&record.id.to_uppercase()))
        .join(format!(".{}", sanitize_filename(&record.from)))
}

/// Materializes a record into the per-item layout below `options.output_path`
///
/// Copies the poster, the thumb and every actor portrait; sample images and
/// their previews are copied when `options.copy_sample` is set. `skip` and
/// `force` behave as in [`super::materialize`]; the remaining options only
/// apply to the flat layout.
pub fn materialize_by_id(
    cache: &Cache,
    record: &Content,
    options: &OutputOptions,
) -> Result<Materialized, MaterializeError> {
    if options.skip {
        debug!(id = %record.id, "materialization skipped");
        return Ok(Materialized::default());
    }

    let root = item_root(&options.output_path, record);
    let force = options.force;
    let mut run = Collector::default();

    let destination = root.join("poster");
    let result = copy_one(cache, &record.poster, &destination, force);
    run.record(Field::Poster, destination, result);

    let destination = root.join("thumb");
    let result = copy_one(cache, &record.thumb, &destination, force);
    run.record(Field::Thumb, destination, result);

    for (position, actor) in record.actors.iter().enumerate() {
        let mut name = sanitize_filename(&actor.name);
        if name.is_empty() {
            name = format!("actor@{}", position);
        }
        let destination = root.join(".actor").join(name);
        let result = copy_one(cache, &actor.image, &destination, force);
        run.record(Field::Actor(actor.name.clone()), destination, result);
    }

    if options.copy_sample {
        for sample in &record.sample {
            let destination = root.join(".sample").join(format!("sample@{}", sample.index));
            let result = copy_one(cache, &sample.image, &destination, force);
            if run.record(Field::Sample(sample.index), destination.clone(), result) {
                run.outcome.sample_files.push(destination);
            }

            let destination = root.join(".thumb").join(format!("thumb@{}", sample.index));
            let result = copy_one(cache, &sample.thumb, &destination, force);
            run.record(Field::SampleThumb(sample.index), destination, result);
        }
    }

    run.finish(&record.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Sample, Star};
    use crate::testing::{StubFetcher, stub_cache};
    use std::fs;
    use std::sync::Arc;

    fn record() -> Content {
        Content {
            id: "abc-123".to_string(),
            from: "javbus".to_string(),
            poster: "http://h/p.jpg".to_string(),
            thumb: "http://h/t.jpg".to_string(),
            actors: vec![
                Star {
                    name: "Some One".to_string(),
                    image: "http://h/a1.jpg".to_string(),
                    ..Star::default()
                },
                Star {
                    name: "No Portrait".to_string(),
                    ..Star::default()
                },
            ],
            sample: vec![Sample {
                index: 7,
                image: "http://h/s7.jpg".to_string(),
                thumb: "http://h/s7t.jpg".to_string(),
                ..Sample::default()
            }],
            ..Content::default()
        }
    }

    fn stub() -> Arc<StubFetcher> {
        Arc::new(
            StubFetcher::new()
                .serve("http://h/p.jpg", 200, b"poster")
                .serve("http://h/t.jpg", 200, b"thumb")
                .serve("http://h/a1.jpg", 200, b"actor")
                .serve("http://h/s7.jpg", 200, b"sample")
                .serve("http://h/s7t.jpg", 200, b"sample thumb"),
        )
    }

    #[test]
    fn test_item_root() {
        let root = item_root(Path::new("/out"), &record());
        assert_eq!(root, Path::new("/out/ABC-123/.javbus"));
    }

    #[test]
    fn test_item_root_normalizes_unsafe_ids() {
        let record = Content {
            id: "../x".to_string(),
            from: "a/b".to_string(),
            ..Content::default()
        };
        assert_eq!(item_root(Path::new("/out"), &record), Path::new("/out/-X/.a-b"));
        assert_eq!(record.id, "../x");
    }

    #[test]
    fn test_layout_without_samples() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub();
        let cache = stub_cache(&dir.path().join("cache"), &stub);
        let out = dir.path().join("out");

        let produced = materialize_by_id(&cache, &record(), &OutputOptions::new(&out)).unwrap();

        let root = out.join("ABC-123/.javbus");
        assert_eq!(fs::read(root.join("poster")).unwrap(), b"poster");
        assert_eq!(fs::read(root.join("thumb")).unwrap(), b"thumb");
        assert_eq!(fs::read(root.join(".actor/Some One")).unwrap(), b"actor");
        assert!(!root.join(".actor/No Portrait").exists());
        assert!(!root.join(".sample").exists());
        assert_eq!(produced.written.len(), 3);
        assert_eq!(stub.calls("http://h/s7.jpg"), 0);
    }

    #[test]
    fn test_layout_with_samples() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub();
        let cache = stub_cache(&dir.path().join("cache"), &stub);
        let out = dir.path().join("out");
        let options = OutputOptions {
            copy_sample: true,
            ..OutputOptions::new(&out)
        };

        let produced = materialize_by_id(&cache, &record(), &options).unwrap();

        let root = out.join("ABC-123/.javbus");
        assert_eq!(fs::read(root.join(".sample/sample@7")).unwrap(), b"sample");
        assert_eq!(fs::read(root.join(".thumb/thumb@7")).unwrap(), b"sample thumb");
        assert_eq!(produced.sample_files, vec![root.join(".sample/sample@7")]);
        assert_eq!(produced.written.len(), 5);
    }

    #[test]
    fn test_rerun_and_force() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub();
        let cache = stub_cache(&dir.path().join("cache"), &stub);
        let out = dir.path().join("out");

        materialize_by_id(&cache, &record(), &OutputOptions::new(&out)).unwrap();
        let produced = materialize_by_id(&cache, &record(), &OutputOptions::new(&out)).unwrap();
        assert!(produced.written.is_empty());
        assert_eq!(produced.kept.len(), 3);
        assert_eq!(stub.total_calls(), 3);

        stub.set("http://h/p.jpg", 200, b"new poster");
        let options = OutputOptions {
            force: true,
            ..OutputOptions::new(&out)
        };
        materialize_by_id(&cache, &record(), &options).unwrap();
        assert_eq!(
            fs::read(out.join("ABC-123/.javbus/poster")).unwrap(),
            b"new poster"
        );
    }

    #[test]
    fn test_actor_failure_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub();
        stub.set("http://h/a1.jpg", 404, b"");
        let cache = stub_cache(&dir.path().join("cache"), &stub);
        let out = dir.path().join("out");

        let err = materialize_by_id(&cache, &record(), &OutputOptions::new(&out)).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].field, Field::Actor("Some One".to_string()));
        assert_eq!(err.outcome.written.len(), 2);
    }

    #[test]
    fn test_skip() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub();
        let cache = stub_cache(&dir.path().join("cache"), &stub);
        let options = OutputOptions {
            skip: true,
            ..OutputOptions::new(dir.path().join("out"))
        };

        assert_eq!(
            materialize_by_id(&cache, &record(), &options).unwrap(),
            Materialized::default()
        );
        assert_eq!(stub.total_calls(), 0);
    }
}
