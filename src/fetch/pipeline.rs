//! Pipelined segment fetching with an AIMD window.
//!
//! Used when the object's name up to the segment component is already
//! known. Interests for many segments are kept in flight behind a
//! sliding window: additive increase on every in-order arrival, fast
//! retransmit after three consecutive out-of-order arrivals, and a
//! collapse to one segment on timeout. The window arithmetic lives in
//! [`PipelineState`], which is pure and drives no I/O of its own.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::core::constants::{
    FAST_RETRANSMIT_THRESHOLD, MAX_RETRANSMITS, MAX_WINDOW, OOO_RING_SIZE,
};
use crate::core::error::{FaceError, FetchError};
use crate::face::Face;
use crate::wire::{Data, Name};

/// What the state machine wants done after an arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineAction {
    /// Issue a first Interest for this segment.
    Send(u64),
    /// Re-issue the Interest for this segment.
    Retransmit(u64),
    /// Every segment through the final block has arrived.
    Complete,
}

/// Sliding-window state for one object download.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Lowest un-acked segment number.
    snd_una: u64,
    /// Next segment number to issue.
    snd_nxt: u64,
    /// Current window in segments, within `[1, MAX_WINDOW]`.
    snd_wnd: u64,
    /// Ring marking out-of-order arrivals at `segment % OOO_RING_SIZE`.
    ooo: [bool; OOO_RING_SIZE],
    /// Consecutive out-of-order arrivals since the last in-order advance.
    ooo_count: u32,
    dups: u64,
    pkt_recved: u64,
    timed_out: u64,
    interest_sent: u64,
    total_blocks: u64,
    retries: HashMap<u64, u32>,
    final_segment: Option<u64>,
    terminated: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// Fresh state: segment 0's Interest is counted as already in flight.
    pub fn new() -> Self {
        Self {
            snd_una: 0,
            snd_nxt: 1,
            snd_wnd: 1,
            ooo: [false; OOO_RING_SIZE],
            ooo_count: 0,
            dups: 0,
            pkt_recved: 0,
            timed_out: 0,
            interest_sent: 1,
            total_blocks: 0,
            retries: HashMap::new(),
            final_segment: None,
            terminated: false,
        }
    }

    /// Process an arriving segment.
    pub fn handle_data(&mut self, segment: u64, final_block: Option<u64>) -> Vec<PipelineAction> {
        self.pkt_recved += 1;
        if let Some(final_segment) = final_block {
            self.final_segment = Some(final_segment);
        }
        if self.terminated {
            self.dups += 1;
            return Vec::new();
        }

        if segment == self.snd_una {
            self.advance();
            self.snd_nxt = self.snd_nxt.max(self.snd_una);
            self.ooo_count = 0;
            self.snd_wnd = (self.snd_wnd + 1).min(MAX_WINDOW);

            if let Some(final_segment) = self.final_segment {
                if self.snd_una == final_segment + 1 {
                    self.terminated = true;
                    return vec![PipelineAction::Complete];
                }
            }
            self.fill_window()
        } else if segment > self.snd_una && segment < self.snd_nxt {
            let slot = (segment % OOO_RING_SIZE as u64) as usize;
            if self.ooo[slot] {
                self.dups += 1;
                return Vec::new();
            }
            self.ooo[slot] = true;
            self.ooo_count += 1;

            if self.ooo_count == FAST_RETRANSMIT_THRESHOLD {
                // NewReno-style halve-plus-three on the third consecutive
                // out-of-order arrival, then resend the hole.
                self.ooo_count = 0;
                self.snd_wnd = (self.snd_wnd / 2 + 3).clamp(1, MAX_WINDOW);
                self.interest_sent += 1;
                return vec![PipelineAction::Retransmit(self.snd_una)];
            }
            Vec::new()
        } else {
            self.dups += 1;
            Vec::new()
        }
    }

    /// Process a timed-out Interest. Collapses the window and retries the
    /// segment, up to the retry cap.
    pub fn handle_timeout(&mut self, segment: u64) -> Result<Vec<PipelineAction>, FetchError> {
        self.timed_out += 1;
        if self.terminated || segment < self.snd_una {
            // Stale timer for a segment that arrived meanwhile.
            return Ok(Vec::new());
        }
        let attempts = self.retries.entry(segment).or_insert(0);
        *attempts += 1;
        if *attempts > MAX_RETRANSMITS {
            return Err(FetchError::InterestTimeout);
        }
        self.snd_wnd = 1;
        self.interest_sent += 1;
        Ok(vec![PipelineAction::Retransmit(segment)])
    }

    fn advance(&mut self) {
        self.snd_una += 1;
        self.total_blocks += 1;
        loop {
            let slot = (self.snd_una % OOO_RING_SIZE as u64) as usize;
            if !self.ooo[slot] {
                break;
            }
            self.ooo[slot] = false;
            self.snd_una += 1;
            self.total_blocks += 1;
        }
    }

    fn fill_window(&mut self) -> Vec<PipelineAction> {
        let mut actions = Vec::new();
        while self.snd_nxt - self.snd_una < self.snd_wnd
            && self.final_segment.is_none_or(|f| self.snd_nxt <= f)
        {
            actions.push(PipelineAction::Send(self.snd_nxt));
            self.snd_nxt += 1;
            self.interest_sent += 1;
        }
        actions
    }

    /// Lowest un-acked segment.
    pub fn snd_una(&self) -> u64 {
        self.snd_una
    }

    /// Next segment to issue.
    pub fn snd_nxt(&self) -> u64 {
        self.snd_nxt
    }

    /// Current window.
    pub fn snd_wnd(&self) -> u64 {
        self.snd_wnd
    }

    /// Segments delivered in order so far.
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Interests issued, including retransmissions.
    pub fn interest_sent(&self) -> u64 {
        self.interest_sent
    }

    /// Packets counted as duplicates or out-of-window.
    pub fn dups(&self) -> u64 {
        self.dups
    }

    /// Whether the final block has been reached.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

enum SegmentEvent {
    Arrived(Data),
    TimedOut(u64),
}

/// Download all segments under `prefix` (which names the object up to,
/// but not including, the segment component).
pub async fn fetch(face: &Face, prefix: &Name) -> Result<Vec<u8>, FetchError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<SegmentEvent>();

    let mut state = PipelineState::new();
    let mut contents: BTreeMap<u64, bytes::Bytes> = BTreeMap::new();
    express_segment(face, prefix, 0, &tx)?;

    while let Some(event) = rx.recv().await {
        let actions = match event {
            SegmentEvent::Arrived(data) => {
                let Some(segment) = data.name().get(-1).and_then(|c| c.to_segment()) else {
                    return Err(FetchError::DataHasNoSegment);
                };
                let final_block = data
                    .meta_info()
                    .final_block_id()
                    .and_then(|c| c.to_segment());
                contents
                    .entry(segment)
                    .or_insert_with(|| data.content().clone());
                state.handle_data(segment, final_block)
            }
            SegmentEvent::TimedOut(segment) => {
                trace!(segment, "segment interest timed out");
                state.handle_timeout(segment)?
            }
        };

        for action in actions {
            match action {
                PipelineAction::Send(segment) | PipelineAction::Retransmit(segment) => {
                    express_segment(face, prefix, segment, &tx)?;
                }
                PipelineAction::Complete => {
                    let final_segment = state.final_segment.unwrap_or(0);
                    debug!(
                        blocks = state.total_blocks(),
                        interests = state.interest_sent(),
                        "pipelined fetch complete"
                    );
                    let mut blob = Vec::new();
                    for (segment, part) in &contents {
                        if *segment > final_segment {
                            break;
                        }
                        blob.extend_from_slice(part);
                    }
                    return Ok(blob);
                }
            }
        }
    }
    Err(FetchError::FaceClosed)
}

fn express_segment(
    face: &Face,
    prefix: &Name,
    segment: u64,
    tx: &mpsc::UnboundedSender<SegmentEvent>,
) -> Result<(), FaceError> {
    let name = prefix.appended_segment(segment);
    let data_tx = tx.clone();
    let timeout_tx = tx.clone();
    face.express_interest_named(
        &name,
        None,
        move |_, data| {
            let _ = data_tx.send(SegmentEvent::Arrived(data.clone()));
        },
        move |_| {
            let _ = timeout_tx.send(SegmentEvent::TimedOut(segment));
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::face::FaceConfig;
    use crate::testutil::TestForwarder;
    use crate::wire::Component;

    fn check_invariants(state: &PipelineState) {
        assert!(state.snd_una() <= state.snd_nxt());
        assert!(state.snd_wnd() >= 1);
        assert!(state.snd_wnd() <= MAX_WINDOW);
    }

    #[test]
    fn test_in_order_growth() {
        let mut state = PipelineState::new();
        let actions = state.handle_data(0, None);
        check_invariants(&state);
        assert_eq!(state.snd_una(), 1);
        assert_eq!(state.snd_wnd(), 2);
        // Window of 2 with nothing in flight: segments 1 and 2 go out.
        assert_eq!(
            actions,
            vec![PipelineAction::Send(1), PipelineAction::Send(2)]
        );
        assert!(state.snd_nxt() - state.snd_una() <= state.snd_wnd());
    }

    #[test]
    fn test_window_capped() {
        let mut state = PipelineState::new();
        for segment in 0..100 {
            for action in state.handle_data(segment, None) {
                let _ = action;
            }
            check_invariants(&state);
        }
        assert_eq!(state.snd_wnd(), MAX_WINDOW);
    }

    #[test]
    fn test_reorder_absorbed_without_retransmit() {
        // snd_una=0, snd_nxt=5, snd_wnd=5 with segment 0's answer late.
        let mut state = PipelineState {
            snd_nxt: 5,
            snd_wnd: 5,
            ..PipelineState::new()
        };

        for segment in [1u64, 2] {
            let actions = state.handle_data(segment, None);
            assert!(actions.is_empty(), "no retransmit for segment {segment}");
            check_invariants(&state);
        }

        let actions = state.handle_data(0, None);
        check_invariants(&state);
        // 0 arrives: 1 and 2 were marked, so snd_una jumps past them.
        assert_eq!(state.snd_una(), 3);
        assert_eq!(state.ooo_count, 0);
        assert!(actions
            .iter()
            .all(|a| !matches!(a, PipelineAction::Retransmit(_))));

        for segment in [3u64, 4] {
            let actions = state.handle_data(segment, None);
            assert!(actions
                .iter()
                .all(|a| !matches!(a, PipelineAction::Retransmit(_))));
            check_invariants(&state);
        }
        assert_eq!(state.snd_una(), 5);
        assert_eq!(state.ooo_count, 0);
        assert_eq!(state.dups(), 0);
    }

    #[test]
    fn test_fast_retransmit_trigger() {
        let mut state = PipelineState {
            snd_nxt: 10,
            snd_wnd: 10,
            ..PipelineState::new()
        };

        // Three consecutive out-of-order arrivals trip the trigger.
        assert!(state.handle_data(1, None).is_empty());
        assert!(state.handle_data(2, None).is_empty());
        let actions = state.handle_data(3, None);
        assert_eq!(actions, vec![PipelineAction::Retransmit(0)]);
        check_invariants(&state);
        // Halve-plus-three from 10.
        assert_eq!(state.snd_wnd(), 8);
        assert_eq!(state.ooo_count, 0);
    }

    #[test]
    fn test_out_of_window_counts_dup() {
        let mut state = PipelineState {
            snd_nxt: 3,
            snd_wnd: 3,
            ..PipelineState::new()
        };
        // Beyond snd_nxt: dropped.
        assert!(state.handle_data(7, None).is_empty());
        assert_eq!(state.dups(), 1);

        // Marked twice: second is a dup.
        assert!(state.handle_data(2, None).is_empty());
        assert!(state.handle_data(2, None).is_empty());
        assert_eq!(state.dups(), 2);
    }

    #[test]
    fn test_timeout_collapses_window_and_retries() {
        let mut state = PipelineState::new();
        for segment in 0..10 {
            let _ = state.handle_data(segment, None);
        }
        assert!(state.snd_wnd() > 1);

        let actions = state.handle_timeout(10).unwrap();
        assert_eq!(actions, vec![PipelineAction::Retransmit(10)]);
        assert_eq!(state.snd_wnd(), 1);
        check_invariants(&state);
    }

    #[test]
    fn test_retry_cap_aborts() {
        let mut state = PipelineState::new();
        for _ in 0..MAX_RETRANSMITS {
            assert!(state.handle_timeout(0).is_ok());
        }
        assert!(matches!(
            state.handle_timeout(0),
            Err(FetchError::InterestTimeout)
        ));
    }

    #[test]
    fn test_stale_timeout_ignored() {
        let mut state = PipelineState::new();
        let _ = state.handle_data(0, None);
        // Segment 0 already arrived; a late timer is a no-op.
        let actions = state.handle_timeout(0).unwrap();
        assert!(actions.is_empty());
        assert_eq!(state.snd_wnd(), 2);
    }

    #[test]
    fn test_completion_on_final_block() {
        let mut state = PipelineState::new();
        let _ = state.handle_data(0, Some(2));
        let _ = state.handle_data(1, None);
        let actions = state.handle_data(2, None);
        assert_eq!(actions, vec![PipelineAction::Complete]);
        assert!(state.is_terminated());
        assert_eq!(state.total_blocks(), 3);
    }

    #[test]
    fn test_no_interests_issued_past_final() {
        let mut state = PipelineState::new();
        let actions = state.handle_data(0, Some(2));
        for action in &actions {
            if let PipelineAction::Send(segment) = action {
                assert!(*segment <= 2);
            }
        }
    }

    #[tokio::test]
    async fn test_pipelined_fetch_end_to_end() {
        let mut forwarder = TestForwarder::spawn().await;
        let face = Face::new(FaceConfig::new().endpoint(forwarder.endpoint.clone()));

        let responder = tokio::spawn(async move {
            // Segment 0, then whatever the growing window asks for.
            for _ in 0..3 {
                let interest = forwarder.next_interest().await;
                let segment = interest.name().get(-1).unwrap().to_segment().unwrap();
                let mut data = Data::new(interest.name().clone());
                data.set_content(vec![segment as u8 + 1]);
                data.meta_info_mut()
                    .set_final_block_id(Some(Component::from_segment(2)));
                data.meta_info_mut()
                    .set_freshness_period(Some(Duration::from_secs(1)));
                forwarder.send_data(&data);
            }
        });

        let blob = fetch(&face, &Name::from_uri("/obj")).await.unwrap();
        assert_eq!(blob, vec![1, 2, 3]);
        responder.await.unwrap();
    }
}
