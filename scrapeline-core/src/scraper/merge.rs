use scrapeline_model::{CandidateRecord, MergedRecord, SourceId};

/// Fold accepted candidates into one record.
///
/// Candidates must arrive in source precedence order. Scalars come from the
/// first candidate that has them; `Images` and `Actors` are unioned with
/// duplicates dropped. Returns `None` when there is nothing to merge.
pub fn merge_candidates<I>(candidates: I) -> Option<MergedRecord>
where
    I: IntoIterator<Item = (SourceId, CandidateRecord)>,
{
    let mut candidates = candidates.into_iter();
    let (source, first) = candidates.next()?;
    let mut merged = MergedRecord::seed(source, first);
    for (source, candidate) in candidates {
        merged.absorb(source, candidate);
    }
    Some(merged)
}
