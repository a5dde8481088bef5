use crate::controller::PlaybackState;
use crate::engine::MediaEngine;
use crate::error::Result;
use crate::player::Player;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Poll the engine on a fixed tick until playback is no longer loading or
/// playing. Returns the state it settled in.
///
/// A clip that never becomes ready keeps the loop running; callers that need
/// a bound wrap this in `tokio::time::timeout` or a `select!`.
pub async fn run_until_finished<E: MediaEngine>(player: &mut Player<E>, tick: Duration) -> Result<PlaybackState> {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        player.pump()?;
        let state = player.state();
        if !state.is_active() {
            tracing::debug!(?state, "playback loop finished");
            return Ok(state);
        }
    }
}
