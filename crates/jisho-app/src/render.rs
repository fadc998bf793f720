use indicatif::{ProgressBar, ProgressStyle};
use jisho_core::{Stage, UpdateStatus};
use jisho_lang_japanese::{render_detail, render_summary};
use jisho_types::RankedEntry;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Bar positions per stage; progress fractions are scaled to this
const BAR_SCALE: u64 = 1000;

/// `Indexing dictionary  42%`
pub fn progress_line(status: &UpdateStatus) -> Option<String> {
    match status {
        UpdateStatus::Running { stage, progress } => Some(format!(
            "{} {:>3}%",
            stage.label(),
            (progress * 100.0).floor() as u32
        )),
        _ => None,
    }
}

fn stage_bar(stage: Stage, tty: bool) -> ProgressBar {
    let bar = if tty {
        let bar = ProgressBar::new(BAR_SCALE);
        match ProgressStyle::default_bar().template("{msg:24} [{bar:30.cyan/blue}] {percent:>3}%") {
            Ok(style) => bar.set_style(style.progress_chars("━━─")),
            Err(e) => tracing::debug!("Progress template rejected: {e}"),
        }
        bar
    } else {
        let bar = ProgressBar::hidden();
        bar.set_length(BAR_SCALE);
        bar
    };
    bar.set_message(stage.label());
    bar
}

/// One progress bar per update stage, replaced when the stage changes.
///
/// Without a terminal the bars stay hidden and each new percentage is
/// handed back as a plain line instead.
struct StageBars {
    tty: bool,
    current: Option<(Stage, ProgressBar)>,
    last_line: Option<String>,
}

impl StageBars {
    fn new(tty: bool) -> Self {
        Self {
            tty,
            current: None,
            last_line: None,
        }
    }

    /// Returns the line to print when no bar is drawn
    fn apply(&mut self, status: &UpdateStatus) -> Option<String> {
        let UpdateStatus::Running { stage, progress } = status else {
            self.finish();
            return None;
        };

        let bar = self.bar_for(*stage);
        bar.set_position((progress * BAR_SCALE as f64) as u64);
        if !bar.is_hidden() {
            return None;
        }

        let line = progress_line(status)?;
        if self.last_line.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last_line = Some(line.clone());
        Some(line)
    }

    fn bar_for(&mut self, stage: Stage) -> &ProgressBar {
        let bar = match self.current.take() {
            Some((current, bar)) if current == stage => bar,
            previous => {
                if let Some((_, bar)) = previous {
                    bar.finish_and_clear();
                }
                stage_bar(stage, self.tty)
            }
        };
        &self.current.insert((stage, bar)).1
    }

    fn finish(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

/// Render update progress on stderr until the update reaches a terminal
/// state or `done` fires.
///
/// `done` covers updates that end without publishing a status of their own,
/// such as one refused because another is already running.
pub async fn watch_progress(
    mut rx: watch::Receiver<UpdateStatus>,
    tty: bool,
    done: CancellationToken,
) {
    let mut bars = StageBars::new(tty);
    loop {
        let status = rx.borrow_and_update().clone();
        if let Some(line) = bars.apply(&status) {
            eprintln!("{line}");
        }
        if status.is_terminal() {
            break;
        }

        tokio::select! {
            biased;
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = done.cancelled() => break,
        }
    }
    bars.finish();
}

pub fn print_results(hits: &[RankedEntry], detail: bool) {
    if detail {
        for hit in hits {
            println!("{}", render_detail(hit));
        }
    } else {
        for (i, hit) in hits.iter().enumerate() {
            println!("{:>2}. {}", i + 1, render_summary(hit));
        }
    }
}
