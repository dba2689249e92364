use gm_edge::{Attribution, AttributedEdge, Edge, EdgeRecord, Lane};
use gm_ports::{GmError, ResultExt, RepositoryPort, VisitControl};

use crate::journal_ref_name;

/// Visit every edge on `branch`'s journal (or the current `HEAD` branch
/// when `branch` is `None`) in reverse-chronological commit order, and in
/// encoded (insertion) order within a commit.
///
/// Both basic and attributed records are projected down to their
/// underlying [`Edge`] for this reader; use [`read_attributed`] to see
/// provenance and lane. A visitor returning [`VisitControl::Halt`] stops
/// the walk early; this is not an error.
///
/// Fails with [`GmError::NotFound`] when the branch has no journal yet,
/// and with [`GmError::InvalidFormat`] if a commit's payload is corrupt or
/// truncated (the good prefix has already reached the visitor by then).
pub fn read(
    repo: &dyn RepositoryPort,
    branch: Option<&str>,
    visitor: &mut dyn FnMut(&Edge) -> VisitControl,
) -> Result<(), GmError> {
    walk(repo, branch, &mut |record| visitor(record.edge()))
}

/// Like [`read`], but the visitor receives the full [`AttributedEdge`].
/// A basic record is read back with a synthesized default attribution
/// (`{HUMAN, "user@local", "", 0}`) and [`Lane::Default`], matching the
/// reader's legacy/attributed back-compatibility contract.
pub fn read_attributed(
    repo: &dyn RepositoryPort,
    branch: Option<&str>,
    visitor: &mut dyn FnMut(&AttributedEdge) -> VisitControl,
) -> Result<(), GmError> {
    walk(repo, branch, &mut |record| match record {
        EdgeRecord::Attributed(attributed) => visitor(attributed),
        EdgeRecord::Basic(edge) => {
            let synthesized = AttributedEdge {
                edge: edge.clone(),
                attribution: Attribution::default_human(),
                lane: Lane::Default,
            };
            visitor(&synthesized)
        }
    })
}

fn walk(
    repo: &dyn RepositoryPort,
    branch: Option<&str>,
    on_record: &mut dyn FnMut(&EdgeRecord) -> VisitControl,
) -> Result<(), GmError> {
    let branch = match branch {
        Some(b) => b.to_string(),
        None => repo.head_branch().context("journal read failed")?,
    };
    let ref_name = journal_ref_name(&branch);

    let tip = repo
        .reference_tip(&ref_name)
        .context("journal read failed")?;
    if !tip.has_target {
        return Err(GmError::NotFound(format!("journal for branch {branch}")));
    }

    repo.walk_commits(&ref_name, &mut |commit| {
        let payload = repo
            .commit_read_blob(commit, crate::JOURNAL_PAYLOAD_PATH)
            .context("journal read failed")?;
        decode_payload(&payload, on_record)
    })
}

/// Decode every record from a commit's concatenated payload, dispatching
/// each to `on_record` in order. A truncated or otherwise malformed
/// trailing record surfaces as [`GmError::InvalidFormat`] after the good
/// prefix has already been dispatched.
fn decode_payload(
    payload: &[u8],
    on_record: &mut dyn FnMut(&EdgeRecord) -> VisitControl,
) -> Result<VisitControl, GmError> {
    let mut offset = 0;
    while offset < payload.len() {
        let (record, consumed) =
            gm_edge::decode_one(&payload[offset..]).context("journal read failed")?;
        offset += consumed;
        if on_record(&record) == VisitControl::Halt {
            return Ok(VisitControl::Halt);
        }
    }
    Ok(VisitControl::Continue)
}
