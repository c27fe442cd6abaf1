//! Round engine: matchmaking, the timed collection phase and the voting phase.
//!
//! A round runs as its own tokio task. It suspends at the reminder and
//! deadline waits of the collection phase, at the per-poll wait loop of the
//! voting phase and at every outbound send; each of them races against the
//! session's cancellation token.

use super::{AppState, SessionHandle};
use crate::error::{GameError, GameResult};
use crate::matchup::{build_prompt_edges, plan_round, Edge, RoundPlan};
use crate::types::*;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// The session was ended while the round was suspended
struct Cancelled;

type Step<T = ()> = Result<T, Cancelled>;

async fn wait_until(cancel: &CancellationToken, deadline: Instant) -> Step {
    guarded(cancel, sleep_until(deadline)).await
}

/// Run `fut` unless the session ends first; a send in flight is dropped
async fn guarded<F: Future>(cancel: &CancellationToken, fut: F) -> Step<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        out = fut => Ok(out),
    }
}

/// Shuffle the seating order and build this round's edges
fn shuffled_edges(mut player_ids: Vec<PlayerId>, m: usize) -> Vec<Edge> {
    let mut rng = rand::rng();
    player_ids.shuffle(&mut rng);
    build_prompt_edges(&player_ids, m, &mut rng)
}

impl Session {
    /// Install a fresh round plan, discarding the previous round's matchups,
    /// polls and prompt correlations
    pub fn begin_round(&mut self, plan: RoundPlan) {
        self.phase = SessionPhase::Collecting;
        self.answers = self
            .players
            .keys()
            .map(|id| {
                let count = plan.assigned.get(id).map_or(0, Vec::len);
                (id.clone(), vec![AnswerSlot::Unset; count])
            })
            .collect();
        self.assigned = plan.assigned;
        for matchup in &plan.matchups {
            for entry in &matchup.entries {
                self.scores.entry(entry.player_id.clone()).or_insert(0.0);
            }
        }
        self.matchups = plan.matchups;
        self.prompt_messages = HashMap::new();
        self.polls = HashMap::new();
        self.scored_polls = Vec::new();
    }

    /// Players with at least one slot still unset
    pub fn players_missing_answers(&self) -> Vec<PlayerId> {
        self.players
            .keys()
            .filter(|id| {
                self.answers
                    .get(*id)
                    .is_some_and(|slots| slots.iter().any(AnswerSlot::is_unset))
            })
            .cloned()
            .collect()
    }

    /// Close collection: every unset slot becomes the placeholder
    pub fn close_collection(&mut self) -> usize {
        let mut backfilled = 0;
        for slot in self.answers.values_mut().flatten() {
            if slot.is_unset() {
                *slot = AnswerSlot::TimedOut;
                backfilled += 1;
            }
        }
        self.phase = SessionPhase::Voting;
        self.collection_deadline = None;
        backfilled
    }

    pub fn answer(&self, entry: &MatchupEntry) -> Option<&AnswerSlot> {
        self.answers.get(&entry.player_id)?.get(entry.slot)
    }

    /// Poll question and options for a matchup
    pub fn poll_content(&self, matchup: &Matchup, fallback: &str) -> (String, [String; 2]) {
        let option = |entry: &MatchupEntry| {
            let answer = self
                .answer(entry)
                .map_or(fallback, |slot| slot.display(fallback));
            format!("{}: {}", self.player_name(&entry.player_id), answer)
        };
        (
            format!("{}\n\nVote for the better answer!", matchup.prompt_text),
            [option(&matchup.entries[0]), option(&matchup.entries[1])],
        )
    }

    /// Apply points for every poll in matchup order
    pub fn score_all_polls(&mut self) -> usize {
        let mut polls: Vec<(usize, PollRef)> = self
            .polls
            .values()
            .map(|p| (p.matchup, p.poll_ref.clone()))
            .collect();
        polls.sort();

        let mut scored = 0;
        for (_, poll_ref) in &polls {
            if self.score_poll(poll_ref).is_some() {
                scored += 1;
            }
        }
        self.phase = SessionPhase::Scored;
        scored
    }

    /// Wait for the next round trigger
    pub fn advance_round(&mut self) {
        self.round_no += 1;
        self.phase = SessionPhase::Idle;
    }
}

impl AppState {
    /// Start the first round of a lobby, locking it against further joins
    pub async fn start_game(&self, group_id: &GroupId) -> GameResult<u32> {
        self.launch_round(group_id, SessionPhase::Lobby).await
    }

    /// Start the next round of a game whose previous round has been scored
    pub async fn next_round(&self, group_id: &GroupId) -> GameResult<u32> {
        self.launch_round(group_id, SessionPhase::Idle).await
    }

    async fn launch_round(&self, group_id: &GroupId, expected: SessionPhase) -> GameResult<u32> {
        let handle = self.get_session(group_id).await.ok_or_else(|| {
            GameError::NotFound("No lobby found. Use /init_game first.".to_string())
        })?;

        let (round_no, player_count, names, started) = {
            let mut session = handle.session.write().await;
            match (session.phase, expected) {
                (SessionPhase::Lobby, SessionPhase::Lobby) => {
                    if session.players.len() < 2 {
                        return Err(GameError::Precondition(
                            "Need at least two players to start.".to_string(),
                        ));
                    }
                    session.lock();
                    session.phase = SessionPhase::Locked;
                }
                (SessionPhase::Idle, SessionPhase::Idle) => {}
                (SessionPhase::Lobby, _) => {
                    return Err(GameError::Precondition(
                        "The game hasn't started yet. Use /start_game first.".to_string(),
                    ));
                }
                (SessionPhase::Idle, _) => {
                    return Err(GameError::Precondition(
                        "The game is already running. Use /next_round.".to_string(),
                    ));
                }
                _ => {
                    return Err(GameError::Precondition(
                        "A round is already in progress".to_string(),
                    ));
                }
            }

            let player_ids: Vec<PlayerId> = session.players.keys().cloned().collect();
            let edges = shuffled_edges(player_ids, self.config.matchups_per_player);
            let prompt_texts = self.prompts.sample_prompts(edges.len());
            if prompt_texts.is_empty() && !edges.is_empty() {
                tracing::warn!("Prompt pool is empty, using fallback notice");
            }
            let plan = plan_round(
                session.round_no,
                &edges,
                &prompt_texts,
                &self.config.no_prompts_notice,
            );
            tracing::info!(
                "Round {} for group {}: {} matchups over {} players",
                session.round_no,
                group_id,
                plan.matchups.len(),
                session.players.len()
            );
            session.begin_round(plan);

            // The advertised deadline counts from before the first prompt goes out
            let started = Instant::now();
            let deadline = chrono::Utc::now()
                + chrono::Duration::from_std(self.config.response_timeout)
                    .unwrap_or(chrono::Duration::zero());
            session.collection_deadline = Some(deadline.to_rfc3339());

            (
                session.round_no,
                session.players.len(),
                session.player_names(),
                started,
            )
        };

        let announcement = format!(
            "🎬 Game starting with {} players: {}\nPrepare for Round {}!",
            player_count, names, round_no
        );
        if self
            .open_round(&handle, round_no, &announcement)
            .await
            .is_err()
        {
            tracing::info!("Round {} cancelled while sending prompts", round_no);
            return Ok(round_no);
        }

        let state = self.clone();
        tokio::spawn(async move {
            if state.run_round(&handle, started).await.is_err() {
                tracing::info!("Round {} cancelled", round_no);
            }
        });

        Ok(round_no)
    }

    /// Announce the round in the group, then deliver every player's prompts
    async fn open_round(&self, handle: &SessionHandle, round_no: u32, announcement: &str) -> Step {
        let group_id = handle.session.read().await.group_id.clone();
        guarded(&handle.cancel, self.notify_group(&group_id, announcement)).await?;
        self.send_prompts(handle, round_no).await
    }

    /// DM every player their banner and prompts, remembering each prompt
    /// message for reply correlation
    async fn send_prompts(&self, handle: &SessionHandle, round_no: u32) -> Step {
        let (group_id, players, assigned) = {
            let session = handle.session.read().await;
            (
                session.group_id.clone(),
                session.players.values().cloned().collect::<Vec<_>>(),
                session.assigned.clone(),
            )
        };
        let seconds = self.config.response_timeout.as_secs();

        for player in players {
            let banner = format!(
                "🎬 Round {} has begun! You have {} seconds to respond to all prompts.",
                round_no, seconds
            );
            if let Err(e) = guarded(&handle.cancel, self.deliver_direct(&player.id, &banner)).await? {
                tracing::warn!("Cannot deliver prompts to {}: {}", player.id, e);
                guarded(
                    &handle.cancel,
                    self.notify_group(
                        &group_id,
                        &format!(
                            "I can't DM {} their prompts. Please start a private chat with me.",
                            player.name()
                        ),
                    ),
                )
                .await?;
                continue;
            }

            let prompts = assigned.get(&player.id).cloned().unwrap_or_default();
            for (idx, prompt) in prompts.iter().enumerate() {
                let text = format!(
                    "Prompt {}:\n\n{}\n\nPlease reply to this message with your answer.",
                    idx + 1,
                    prompt.text
                );
                match guarded(&handle.cancel, self.deliver_direct(&player.id, &text)).await? {
                    Ok(message_ref) => {
                        let mut session = handle.session.write().await;
                        if handle.cancel.is_cancelled() {
                            return Err(Cancelled);
                        }
                        session
                            .prompt_messages
                            .insert(message_ref, (player.id.clone(), idx));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to send prompt {} to {}: {}", idx + 1, player.id, e);
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_round(&self, handle: &SessionHandle, started: Instant) -> Step {
        self.collect_answers(handle, started).await?;
        self.run_voting(handle).await?;
        self.score_round(handle).await
    }

    /// Collection phase: two reminders, then the unconditional deadline
    async fn collect_answers(&self, handle: &SessionHandle, started: Instant) -> Step {
        let timeout = self.config.response_timeout;

        let first_at = self.config.first_reminder_at();
        wait_until(&handle.cancel, started + first_at).await?;
        self.remind(
            handle,
            &format!(
                "⏱ Half the time has passed! {} seconds left to submit your answers.",
                (timeout - first_at).as_secs()
            ),
        )
        .await?;

        let last_at = self.config.last_reminder_at().max(first_at);
        wait_until(&handle.cancel, started + last_at).await?;
        self.remind(
            handle,
            &format!(
                "⚠️ Only {} seconds left! Quickly finish your prompts!",
                (timeout - last_at).as_secs()
            ),
        )
        .await?;

        wait_until(&handle.cancel, started + timeout).await?;

        let group_id = {
            let mut session = handle.session.write().await;
            if handle.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let backfilled = session.close_collection();
            tracing::info!(
                "Collection closed for group {}, {} answer(s) missing",
                session.group_id,
                backfilled
            );
            session.group_id.clone()
        };

        guarded(
            &handle.cancel,
            self.notify_group(&group_id, "⏰ Time's up! Vote for the better answers."),
        )
        .await
    }

    /// Best-effort reminder to every player still owing an answer
    async fn remind(&self, handle: &SessionHandle, text: &str) -> Step {
        let missing = handle.session.read().await.players_missing_answers();
        for player_id in missing {
            guarded(&handle.cancel, self.notify_player(&player_id, text)).await?;
        }
        Ok(())
    }

    /// Voting phase: one poll per matchup, strictly one after the other
    async fn run_voting(&self, handle: &SessionHandle) -> Step {
        let (group_id, matchups) = {
            let session = handle.session.read().await;
            (session.group_id.clone(), session.matchups.clone())
        };

        for (idx, matchup) in matchups.iter().enumerate() {
            // Votes relayed before open_poll returns queue on this lock until
            // the poll is registered
            let opened = {
                let mut session = handle.session.write().await;
                if handle.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                let (question, options) = session.poll_content(matchup, &self.config.fallback_answer);
                self.transport
                    .open_poll(&group_id, &question, options)
                    .await
                    .map_err(GameError::from)
                    .inspect(|poll_ref| {
                        session
                            .polls
                            .insert(poll_ref.clone(), Poll::new(poll_ref.clone(), idx));
                    })
            };

            let poll_ref = match opened {
                Ok(poll_ref) => poll_ref,
                Err(e) => {
                    tracing::warn!("Failed to open poll for {}: {}", matchup.prompt_id, e);
                    guarded(
                        &handle.cancel,
                        self.notify_group(
                            &group_id,
                            &format!("Couldn't open the poll for \"{}\", skipping it.", matchup.prompt_text),
                        ),
                    )
                    .await?;
                    continue;
                }
            };

            self.await_votes(handle, &poll_ref).await?;

            let mut session = handle.session.write().await;
            if handle.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            if let Some(poll) = session.polls.get_mut(&poll_ref) {
                poll.closed = true;
                tracing::debug!("Poll {} closed with {} vote(s)", poll_ref, poll.votes.len());
            }
        }

        Ok(())
    }

    /// Wait until every player has voted or the poll timeout elapses,
    /// checking at a fixed interval
    async fn await_votes(&self, handle: &SessionHandle, poll_ref: &PollRef) -> Step {
        let opened = Instant::now();
        let interval: Duration = self.config.poll_check_interval;

        loop {
            let complete = {
                let session = handle.session.read().await;
                let votes = session.polls.get(poll_ref).map_or(0, |p| p.votes.len());
                votes >= session.players.len()
            };
            if complete || opened.elapsed() >= self.config.poll_timeout {
                return Ok(());
            }
            wait_until(&handle.cancel, Instant::now() + interval).await?;
        }
    }

    async fn score_round(&self, handle: &SessionHandle) -> Step {
        let (group_id, board) = {
            let mut session = handle.session.write().await;
            if handle.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let scored = session.score_all_polls();
            tracing::info!("Scored {} poll(s) for group {}", scored, session.group_id);
            (session.group_id.clone(), session.scoreboard())
        };

        guarded(
            &handle.cancel,
            self.notify_group(&group_id, &super::format_scoreboard(&board)),
        )
        .await?;

        let mut session = handle.session.write().await;
        if handle.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        session.advance_round();
        Ok(())
    }
}
