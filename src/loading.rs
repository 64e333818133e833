// loading.rs - Animated ellipsis shown while a request is pending
use crate::view::{LoadingTarget, PageView};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Frames cycle through 0..=6 dots
pub const MAX_DOTS: usize = 6;

pub fn next_frame(dots: usize) -> usize {
    (dots + 1) % (MAX_DOTS + 1)
}

/// Handle to a running ellipsis animation.
///
/// Stopping (or dropping) the handle only halts the animation; hiding the
/// indicator is left to the owner because a newer request may own it by then.
#[derive(Debug)]
pub struct LoadingAnimation {
    token: CancellationToken,
}

impl LoadingAnimation {
    /// Show the indicator for `target` and start cycling its dots every `tick`
    pub fn start(view: Arc<dyn PageView>, target: LoadingTarget, tick: Duration) -> Self {
        view.show_loading(target);
        view.set_loading_dots(target, 0);

        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            let mut dots = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        dots = next_frame(dots);
                        view.set_loading_dots(target, dots);
                    }
                }
            }
        });

        Self { token }
    }

    pub fn stop(self) {
        self.token.cancel();
    }
}

impl Drop for LoadingAnimation {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_wrap_after_six_dots() {
        let frames: Vec<usize> = std::iter::successors(Some(0), |d| Some(next_frame(*d)))
            .take(9)
            .collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 4, 5, 6, 0, 1]);
    }
}
