//! Wait animation shown while a question is in flight.

use crate::session::{SessionEvent, SessionView};
use crate::state::SessionState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Number of glyphs in one frame.
pub const GLYPH_COUNT: usize = 40;

/// The state label goes before the glyph at this index.
pub const LABEL_POSITION: usize = 20;

const BRAILLE_BASE: u32 = 0x2800;
const BRAILLE_BLANK: char = '\u{2800}';

/// Render one animation frame for `state`.
///
/// Busy states get random braille glyphs with the state label spliced in;
/// every other state renders empty.
pub fn indicator<R: Rng + ?Sized>(state: SessionState, rng: &mut R) -> String {
    let Some(label) = state.label() else {
        return String::new();
    };

    let mut frame = String::with_capacity(GLYPH_COUNT * 3 + label.len() + 2);
    for i in 0..GLYPH_COUNT {
        if i == LABEL_POSITION {
            frame.push(' ');
            frame.push_str(label);
            frame.push(' ');
        }
        frame.push(random_glyph(rng));
    }
    frame
}

fn random_glyph<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from_u32(BRAILLE_BASE + rng.gen_range(0..0x100)).unwrap_or(BRAILLE_BLANK)
}

/// Render a frame immediately, then again every `interval`.
///
/// Only reads the session view. Runs until the task is aborted.
pub async fn run_ticker(
    view: watch::Receiver<SessionView>,
    interval: Duration,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut rng = StdRng::from_entropy();
    loop {
        let state = view.borrow().state;
        let _ = event_tx.send(SessionEvent::Indicator(indicator(state, &mut rng)));
        tokio::time::sleep(interval).await;
    }
}
