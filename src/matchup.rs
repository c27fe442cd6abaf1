//! Pairing of players into prompt-sharing matchups.
//!
//! Every edge of the pairing graph becomes exactly one prompt answered by the
//! two endpoints, so no prompt is ever issued to a single player.

use crate::types::{AssignedPrompt, Matchup, MatchupEntry, PlayerId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

/// Unordered pair of players, stored as (min, max)
pub type Edge = (PlayerId, PlayerId);

fn canonical(a: &PlayerId, b: &PlayerId) -> Edge {
    if a < b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Build a shuffled list of matchup edges giving every player as close to `m`
/// matchups as the player count allows.
///
/// With two players the single pair is repeated `m` times. Otherwise a
/// circulant graph is built with degree `min(m, n - 1)`, lowered by one when
/// `n * degree` would be odd.
pub fn build_prompt_edges<R: Rng + ?Sized>(players: &[PlayerId], m: usize, rng: &mut R) -> Vec<Edge> {
    let n = players.len();
    if n < 2 || m == 0 {
        return Vec::new();
    }

    if n == 2 {
        return vec![canonical(&players[0], &players[1]); m];
    }

    let mut effective_m = m.min(n - 1);
    if (n * effective_m) % 2 == 1 {
        effective_m -= 1;
    }
    if effective_m == 0 {
        return Vec::new();
    }

    // BTreeSet keeps the pre-shuffle order stable so a seeded rng reproduces the pairing
    let mut edges = BTreeSet::new();

    for k in 1..=(effective_m / 2) {
        for i in 0..n {
            let (a, b) = (&players[i], &players[(i + k) % n]);
            if a != b {
                edges.insert(canonical(a, b));
            }
        }
    }

    // Odd degree: add the opposite perfect matching (n is even here)
    if effective_m % 2 == 1 && n % 2 == 0 {
        let half = n / 2;
        for i in 0..half {
            edges.insert(canonical(&players[i], &players[i + half]));
        }
    }

    let mut edges: Vec<Edge> = edges.into_iter().collect();
    edges.shuffle(rng);
    edges
}

/// Matchups for one round together with each player's ordered prompt list
#[derive(Debug, Clone, Default)]
pub struct RoundPlan {
    pub matchups: Vec<Matchup>,
    pub assigned: HashMap<PlayerId, Vec<AssignedPrompt>>,
}

/// Attach one prompt to every edge.
///
/// Prompt texts are reused cyclically when fewer than `edges.len()` are
/// available; with none at all every matchup gets `no_prompts_notice`.
pub fn plan_round(round_no: u32, edges: &[Edge], prompt_texts: &[String], no_prompts_notice: &str) -> RoundPlan {
    let mut plan = RoundPlan::default();

    for (edge_idx, (a, b)) in edges.iter().enumerate() {
        let prompt_id = format!("r{}_e{}", round_no, edge_idx);
        let text = if prompt_texts.is_empty() {
            no_prompts_notice.to_string()
        } else {
            prompt_texts[edge_idx % prompt_texts.len()].clone()
        };

        let mut entry_for = |player: &PlayerId| {
            let prompts = plan.assigned.entry(player.clone()).or_default();
            prompts.push(AssignedPrompt {
                prompt_id: prompt_id.clone(),
                text: text.clone(),
            });
            MatchupEntry {
                player_id: player.clone(),
                slot: prompts.len() - 1,
            }
        };
        let first = entry_for(a);
        let second = entry_for(b);

        plan.matchups.push(Matchup {
            round_no,
            prompt_id,
            prompt_text: text,
            entries: [first, second],
        });
    }

    plan
}
