//! Sequential segment fetching with version discovery.
//!
//! The object's version is unknown up front: the first Interest asks for
//! the rightmost fresh child under the prefix, and the version is read
//! out of the first response's name. Segments are then requested one at
//! a time until the FinalBlockId matches.

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::error::FetchError;
use crate::face::Face;
use crate::wire::{Data, Interest, Name};

/// Download every segment of the object under `base_interest`'s name.
///
/// `verify_segment` is consulted for each arriving Data; returning false
/// aborts the fetch. On success the segments' contents are concatenated
/// in segment order.
pub async fn fetch<V>(
    face: &Face,
    base_interest: Interest,
    mut verify_segment: V,
) -> Result<Vec<u8>, FetchError>
where
    V: FnMut(&Data) -> bool,
{
    let mut discovery = base_interest.clone();
    discovery.set_child_selector(Some(1));
    discovery.set_must_be_fresh(true);

    let mut parts: Vec<bytes::Bytes> = Vec::new();
    let mut version_prefix: Option<Name> = None;
    let mut interest = discovery;

    loop {
        let data = express_and_await(face, &interest).await?;

        if !verify_segment(&data) {
            return Err(FetchError::SegmentVerificationFailed);
        }
        let Some(segment) = data.name().get(-1).and_then(|c| c.to_segment()) else {
            return Err(FetchError::DataHasNoSegment);
        };

        // `/prefix/<version>/<segment>`: remember everything up to the
        // segment component from the first response.
        let prefix = version_prefix
            .get_or_insert_with(|| data.name().prefix(-1))
            .clone();

        let expected = parts.len() as u64;
        if segment != expected {
            // Discovery answered with a segment other than the one we
            // need next (or a gap opened): re-request the expected one.
            debug!(segment, expected, "resynchronizing segment fetch");
            interest = next_interest(&base_interest, &prefix, expected);
            continue;
        }

        parts.push(data.content().clone());
        if data.is_final_block() {
            let total = parts.iter().map(|p| p.len()).sum();
            let mut blob = Vec::with_capacity(total);
            for part in parts {
                blob.extend_from_slice(&part);
            }
            return Ok(blob);
        }
        interest = next_interest(&base_interest, &prefix, expected + 1);
    }
}

/// Copy the original Interest (to keep its selectors), point it at the
/// next segment, and drop the discovery-only selectors. Setting the name
/// invalidates the nonce, so a fresh one is generated at send time.
fn next_interest(base: &Interest, version_prefix: &Name, segment: u64) -> Interest {
    let mut interest = base.clone();
    interest.set_name(version_prefix.appended_segment(segment));
    interest.set_must_be_fresh(false);
    interest.set_child_selector(None);
    interest
}

async fn express_and_await(face: &Face, interest: &Interest) -> Result<Data, FetchError> {
    let (tx, mut rx) = mpsc::channel::<Option<Data>>(1);
    let timeout_tx = tx.clone();
    face.express_interest(
        interest,
        move |_, data| {
            let _ = tx.try_send(Some(data.clone()));
        },
        move |_| {
            let _ = timeout_tx.try_send(None);
        },
    )?;

    match rx.recv().await {
        Some(Some(data)) => Ok(data),
        Some(None) => Err(FetchError::InterestTimeout),
        None => Err(FetchError::FaceClosed),
    }
}
