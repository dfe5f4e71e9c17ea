//! Flat image-bucket layout

use super::{Collector, CopyError, CopyOutcome, Field, MaterializeError, Materialized, copy_one};
use crate::cache::Cache;
use crate::content::Content;
use crate::file_operations::{ext, sanitize_filename};
use crate::info::write_info;
use crate::options::OutputOptions;
use tracing::debug;

/// Materializes a record into the flat layout described by `options`
///
/// Processes, in order: the sidecar (`copy_info`), the poster
/// (`copy_poster`), the thumb (`copy_thumb`) and every sample image
/// (`copy_sample`). Image names get the extension of their source URL.
///
/// Every enabled artifact is attempted even if an earlier one failed.
///
/// # Returns
///
/// The written and kept destinations, or a [`MaterializeError`] listing every
/// failure along with whatever was produced.
///
/// # Examples
///
/// ```ignore
/// let options = OutputOptions::new("/srv/media/ABC-123");
/// let produced = materialize(&cache, &record, &options)?;
/// for path in &produced.written {
///     println!("{}", path.display());
/// }
/// ```
pub fn materialize(
    cache: &Cache,
    record: &Content,
    options: &OutputOptions,
) -> Result<Materialized, MaterializeError> {
    if options.skip {
        debug!(id = %record.id, "materialization skipped");
        return Ok(Materialized::default());
    }

    let mut run = Collector::default();

    if options.copy_info {
        let dir = options.info_dir();
        let file_name = options.info_file_name(&sanitize_filename(&record.id));
        let result = write_info(record, &dir, &file_name)
            .map(|written| {
                if written {
                    CopyOutcome::Written
                } else {
                    CopyOutcome::Kept
                }
            })
            .map_err(CopyError::from);
        run.record(Field::Info, dir.join(&file_name), result);
    }

    if options.copy_poster {
        let destination = options.poster_dest(&ext(&record.poster));
        let result = copy_one(cache, &record.poster, &destination, options.force);
        run.record(Field::Poster, destination, result);
    }

    if options.copy_thumb {
        let destination = options.thumb_dest(&ext(&record.thumb));
        let result = copy_one(cache, &record.thumb, &destination, options.force);
        run.record(Field::Thumb, destination, result);
    }

    if options.copy_sample {
        for (index, sample) in record.sample.iter().enumerate() {
            let destination = options.sample_dest(index, &ext(&sample.image));
            let result = copy_one(cache, &sample.image, &destination, options.force);
            if run.record(Field::Sample(index), destination.clone(), result) {
                run.outcome.sample_files.push(destination);
            }
        }
    }

    run.finish(&record.id)
}
